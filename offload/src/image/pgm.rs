//! Text raster layout: format tag line, comment line, `width height`,
//! max value, then `width * height` whitespace separated samples.

use std::fmt::Write;

use super::{ImageLimits, RasterImage};

pub(super) fn parse(text: &str, limits: &ImageLimits) -> Result<RasterImage, String> {
    let mut lines = text.lines();
    let format_tag = lines
        .next()
        .map(|l| l.trim_end().to_string())
        .ok_or("missing format tag line")?;
    let comment = lines
        .next()
        .map(|l| l.trim_end().to_string())
        .ok_or("missing comment line")?;

    let mut tokens = lines.flat_map(str::split_whitespace);

    let width: usize = header_value(tokens.next(), "width")?;
    let height: usize = header_value(tokens.next(), "height")?;
    let max_value: i32 = header_value(tokens.next(), "max value")?;

    let sample_count = width
        .checked_mul(height)
        .filter(|&n| n > 0 && n <= limits.max_samples)
        .ok_or_else(|| {
            format!(
                "header declares {}x{} samples, allowed range is 1..={}",
                width, height, limits.max_samples
            )
        })?;

    let mut samples = Vec::with_capacity(sample_count);
    for token in tokens {
        if samples.len() == sample_count {
            return Err(format!("more than {sample_count} samples present"));
        }
        let sample = token
            .parse::<i32>()
            .map_err(|_| format!("invalid sample '{}' at index {}", token, samples.len()))?;
        samples.push(sample);
    }

    RasterImage::new(format_tag, comment, width, height, max_value, samples)
}

fn header_value<T: std::str::FromStr>(token: Option<&str>, name: &str) -> Result<T, String> {
    let token = token.ok_or_else(|| format!("missing {name} in header"))?;
    token
        .parse()
        .map_err(|_| format!("invalid {name} '{token}' in header"))
}

pub(super) fn format(image: &RasterImage) -> String {
    format_with(image, image.max_value, &image.samples)
}

/// Lays out `samples` under `image`'s tag, comment and dimensions. Samples
/// are written as given, whatever `max_value` says.
pub(super) fn format_with(image: &RasterImage, max_value: i32, samples: &[i32]) -> String {
    let mut out = String::with_capacity(samples.len() * 4 + 64);
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}", image.format_tag);
    let _ = writeln!(out, "{}", image.comment);
    let _ = writeln!(out, "{} {}", image.width, image.height);
    let _ = writeln!(out, "{}", max_value);

    for row in samples.chunks(image.width) {
        let mut first = true;
        for sample in row {
            if !first {
                out.push(' ');
            }
            first = false;
            let _ = write!(out, "{}", sample);
        }
        out.push('\n');
    }

    out
}
