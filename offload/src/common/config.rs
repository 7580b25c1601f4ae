use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::error::{Error, Result};
use crate::device::EmulatedDevice;

/// Default threshold of the host reference computation.
pub const DEFAULT_THRESHOLD: i32 = 90;

/// Upper bound on `width * height` accepted from an image header.
pub const DEFAULT_MAX_SAMPLES: usize = 1 << 26;

/// Run configuration. Every field has a default so a config file only needs
/// to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: PathBuf,
    pub accelerator_output: PathBuf,
    pub reference_output: PathBuf,
    pub entry_point: String,
    pub threshold: i32,
    pub max_samples: usize,
    pub platform: PlatformConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("coins.ascii.pgm"),
            accelerator_output: PathBuf::from("parallel_coins.ascii.pgm"),
            reference_output: PathBuf::from("serial_coins.ascii.pgm"),
            entry_point: "threshold".to_string(),
            threshold: DEFAULT_THRESHOLD,
            max_samples: DEFAULT_MAX_SAMPLES,
            platform: PlatformConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Reads a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_yaml(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yml::Error> {
        serde_yml::from_str(text)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Which compute platform drives the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlatformConfig {
    #[serde(rename = "opencl")]
    OpenCl {
        #[serde(default)]
        device_kind: DeviceKind,
    },
    Emulator { devices: Vec<EmulatedDevice> },
}

impl Default for PlatformConfig {
    #[cfg(feature = "opencl")]
    fn default() -> Self {
        PlatformConfig::OpenCl {
            device_kind: DeviceKind::default(),
        }
    }

    #[cfg(not(feature = "opencl"))]
    fn default() -> Self {
        PlatformConfig::Emulator {
            devices: vec![EmulatedDevice::new("emulated-0", "sw_emu")],
        }
    }
}

/// Device type filter applied during OpenCL enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    #[default]
    Accelerator,
    Gpu,
    Cpu,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl LoggingConfig {
    pub fn settings(&self) -> ::common::log_setup::LogSettings {
        ::common::log_setup::LogSettings {
            base_level: self.level.clone(),
            directory: self.directory.clone(),
            file_prefix: "offload".to_string(),
        }
    }
}
