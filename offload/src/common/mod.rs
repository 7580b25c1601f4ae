pub(crate) mod config;
pub(crate) mod error;

pub use config::{Config, DeviceKind, LoggingConfig, PlatformConfig};
pub use error::{AcceleratorError, Error, ProgrammingError, Result};
