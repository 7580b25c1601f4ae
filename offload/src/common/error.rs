use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by a compute platform for an already selected device:
/// allocation, argument binding, enqueue, dispatch or synchronization.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operation} failed: {message}")]
pub struct AcceleratorError {
    pub operation: &'static str,
    pub message: String,
}

impl AcceleratorError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }

    /// Adapter for `map_err` on platform calls.
    pub fn during<E: std::fmt::Display>(operation: &'static str) -> impl FnOnce(E) -> Self {
        move |e| Self::new(operation, e.to_string())
    }
}

/// A device rejected the binary artifact. Recoverable: the session moves on
/// to the next candidate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct ProgrammingError {
    pub reason: String,
}

impl ProgrammingError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid image {}: {message}", path.display())]
    InvalidImage { path: PathBuf, message: String },
    #[error("Failed to program any of {tried} device(s)")]
    NoUsableDevice { tried: usize },
    #[error("Accelerator error: {0}")]
    Accelerator(#[from] AcceleratorError),
    #[error("Result length mismatch: {left} vs {right} samples")]
    LengthMismatch { left: usize, right: usize },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
