use std::fmt;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// Precompiled accelerator program, opaque to the host.
#[derive(Clone, PartialEq, Eq)]
pub struct BinaryArtifact {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl BinaryArtifact {
    /// Reads the whole file. No validation happens here; the device decides
    /// whether it accepts the binary when it is programmed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        tracing::debug!("Loaded {} byte binary from {}", bytes.len(), path.display());

        Ok(Self {
            path: path.to_path_buf(),
            bytes,
        })
    }

    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for BinaryArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryArtifact")
            .field("path", &self.path)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl fmt::Display for BinaryArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
