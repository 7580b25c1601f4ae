use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use offload::prelude::*;

/// Thresholds a grayscale image on an accelerator and checks the result
/// against the same computation on the host.
#[derive(Parser, Debug)]
#[command(name = "offload")]
#[command(version)]
struct Args {
    /// Precompiled accelerator binary (an .xclbin, or an emulator binary)
    artifact: PathBuf,

    /// YAML run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input image, overrides the configuration
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Threshold of the host reference computation
    #[arg(long)]
    threshold: Option<i32>,

    /// Log filter, e.g. `debug` or `offload=trace`
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn resolve_config(&self) -> offload::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }

        Ok(config)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    match try_main(&args) {
        Ok(true) => {
            println!("TEST PASSED");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("TEST FAILED");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn try_main(args: &Args) -> anyhow::Result<bool> {
    let config = args.resolve_config()?;
    common::log_setup::setup_logging(&config.logging.settings())?;

    let report = run_configured(&config, &args.artifact)
        .with_context(|| format!("Offload with {} failed", args.artifact.display()))?;
    tracing::info!(
        "Ran on device[{}] {}",
        report.device_index,
        report.device_name
    );

    Ok(report.passed())
}
