mod pgm;
#[cfg(test)]
mod tests;

use std::path::Path;

use crate::common::{Error, Result};

/// Grayscale raster with the metadata carried by its text file.
///
/// Invariants: `samples.len() == width * height`, both dimensions are non-zero
/// and every sample lies in `[0, max_value]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    format_tag: String,
    comment: String,
    width: usize,
    height: usize,
    max_value: i32,
    samples: Vec<i32>,
}

/// Limits applied to image headers before any sample storage is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLimits {
    pub max_samples: usize,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_samples: crate::common::config::DEFAULT_MAX_SAMPLES,
        }
    }
}

impl RasterImage {
    pub fn new(
        format_tag: impl Into<String>,
        comment: impl Into<String>,
        width: usize,
        height: usize,
        max_value: i32,
        samples: Vec<i32>,
    ) -> std::result::Result<Self, String> {
        if width == 0 || height == 0 {
            return Err(format!("image dimensions must be non-zero, got {width}x{height}"));
        }
        if max_value < 1 {
            return Err(format!("max value must be positive, got {max_value}"));
        }
        let expected = width
            .checked_mul(height)
            .ok_or_else(|| format!("image dimensions {width}x{height} overflow"))?;
        if samples.len() != expected {
            return Err(format!(
                "expected {} samples for {}x{}, found {}",
                expected,
                width,
                height,
                samples.len()
            ));
        }
        if let Some((index, sample)) = samples
            .iter()
            .enumerate()
            .find(|(_, s)| **s < 0 || **s > max_value)
        {
            return Err(format!(
                "sample {sample} at index {index} is outside [0, {max_value}]"
            ));
        }

        Ok(Self {
            format_tag: format_tag.into(),
            comment: comment.into(),
            width,
            height,
            max_value,
            samples,
        })
    }

    /// Loads an ASCII PGM-style raster.
    pub fn load<P: AsRef<Path>>(path: P, limits: &ImageLimits) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        pgm::parse(&text, limits).map_err(|message| Error::InvalidImage {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, pgm::format(self)).map_err(|e| Error::io(path, e))?;
        tracing::debug!("Saved {}x{} raster to {}", self.width, self.height, path.display());
        Ok(())
    }

    /// Writes `mask` with this image's metadata and a max value of `1`.
    ///
    /// Only the sample count is checked. Device output is stored as it came
    /// back, so values outside `[0, 1]` survive for inspection.
    pub fn save_mask<P: AsRef<Path>>(&self, mask: &[i32], path: P) -> Result<()> {
        let path = path.as_ref();
        if mask.len() != self.len() {
            return Err(Error::LengthMismatch {
                left: self.len(),
                right: mask.len(),
            });
        }
        if let Some(sample) = mask.iter().find(|&&s| s != 0 && s != 1) {
            tracing::warn!("{} holds non-binary sample {}", path.display(), sample);
        }

        std::fs::write(path, pgm::format_with(self, 1, mask)).map_err(|e| Error::io(path, e))?;
        tracing::debug!("Saved {}x{} mask to {}", self.width, self.height, path.display());
        Ok(())
    }

    /// Builds a binary 0/1 mask image with this image's metadata.
    pub fn with_mask(&self, mask: &[i32]) -> std::result::Result<RasterImage, String> {
        RasterImage::new(
            self.format_tag.clone(),
            self.comment.clone(),
            self.width,
            self.height,
            1,
            mask.to_vec(),
        )
    }

    pub fn format_tag(&self) -> &str {
        &self.format_tag
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn max_value(&self) -> i32 {
        self.max_value
    }

    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
