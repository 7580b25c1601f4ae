//! The full offload-and-verify flow.

use std::path::Path;
use std::time::Duration;

use crate::common::{Config, PlatformConfig, Result};
use crate::device::{
    BinaryArtifact, BufferPipeline, DeviceCatalog, EmulatorPlatform, Platform, Session,
    THRESHOLD_LAYOUT,
};
use crate::image::{ImageLimits, RasterImage};
use crate::ops::{compare, ReferenceEngine, ValidationResult};

/// Summary of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub device_index: usize,
    pub device_name: String,
    pub kernel_time: Option<Duration>,
    pub validation: ValidationResult,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.validation.passed()
    }
}

/// Builds the platform named by the config and runs on it.
pub fn run_configured(config: &Config, artifact_path: &Path) -> Result<Report> {
    match &config.platform {
        PlatformConfig::Emulator { devices } => {
            let platform = EmulatorPlatform::new(devices.clone());
            run(&platform, config, artifact_path)
        }
        #[cfg(feature = "opencl")]
        PlatformConfig::OpenCl { device_kind } => {
            let platform = crate::device::OpenClPlatform::new(*device_kind);
            run(&platform, config, artifact_path)
        }
        #[cfg(not(feature = "opencl"))]
        PlatformConfig::OpenCl { .. } => Err(crate::common::Error::Config(
            "OpenCL platform requested but this build has no `opencl` feature".to_string(),
        )),
    }
}

/// Loads the image, thresholds it on the first programmable device, saves
/// both outputs and compares them.
pub fn run<P: Platform>(platform: &P, config: &Config, artifact_path: &Path) -> Result<Report> {
    let limits = ImageLimits {
        max_samples: config.max_samples,
    };
    let image = RasterImage::load(&config.input, &limits)?;
    tracing::info!(
        "Loaded {}x{} image from {}",
        image.width(),
        image.height(),
        config.input.display()
    );

    let artifact = BinaryArtifact::load(artifact_path)?;
    let catalog = DeviceCatalog::enumerate(platform);
    let session = Session::establish(
        platform,
        &catalog,
        &artifact,
        &config.entry_point,
        &THRESHOLD_LAYOUT,
    )?;

    let completed = BufferPipeline::execute(&session, image.samples().to_vec())?;
    save_mask(&image, completed.output(), &config.accelerator_output)?;

    let reference =
        ReferenceEngine::new(config.threshold).compute(image.samples(), image.max_value());
    save_mask(&image, &reference, &config.reference_output)?;

    let validation = compare(&reference, completed.output())?;
    if let Some(mismatch) = validation.mismatch() {
        tracing::error!(
            "Result mismatch: i = {} CPU result = {} Device result = {}",
            mismatch.index,
            mismatch.left,
            mismatch.right
        );
    }

    Ok(Report {
        device_index: session.device_index(),
        device_name: session.device_name().to_string(),
        kernel_time: completed.kernel_time(),
        validation,
    })
}

fn save_mask(image: &RasterImage, mask: &[i32], path: &Path) -> Result<()> {
    image.save_mask(mask, path)?;
    tracing::info!("Wrote {}", path.display());

    Ok(())
}
