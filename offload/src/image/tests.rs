use ::common::test_utils::test_resource;

use super::pgm;
use super::{ImageLimits, RasterImage};
use crate::common::Error;

fn parse(text: &str) -> Result<RasterImage, String> {
    pgm::parse(text, &ImageLimits::default())
}

#[test]
fn parses_header_and_samples() {
    let image = parse("P2\n# tiny\n2 2\n255\n50 100\n150 200\n").unwrap();

    assert_eq!(image.format_tag(), "P2");
    assert_eq!(image.comment(), "# tiny");
    assert_eq!(image.width(), 2);
    assert_eq!(image.height(), 2);
    assert_eq!(image.max_value(), 255);
    assert_eq!(image.samples(), &[50, 100, 150, 200]);
}

#[test]
fn samples_may_span_arbitrary_whitespace() {
    let image = parse("P2\nc\n3 1 7\n1\n2   3").unwrap();
    assert_eq!(image.max_value(), 7);
    assert_eq!(image.samples(), &[1, 2, 3]);
}

#[test]
fn rejects_missing_samples() {
    let err = parse("P2\nc\n2 2\n255\n1 2 3\n").unwrap_err();
    assert!(err.contains("expected 4 samples"), "{err}");
}

#[test]
fn rejects_surplus_samples() {
    let err = parse("P2\nc\n2 1\n255\n1 2 3\n").unwrap_err();
    assert!(err.contains("more than 2 samples"), "{err}");
}

#[test]
fn rejects_zero_dimensions() {
    assert!(parse("P2\nc\n0 4\n255\n").is_err());
}

#[test]
fn rejects_oversized_header_before_allocating() {
    let limits = ImageLimits { max_samples: 16 };
    let err = pgm::parse("P2\nc\n5 4\n255\n", &limits).unwrap_err();
    assert!(err.contains("allowed range"), "{err}");

    let err = parse("P2\nc\n18446744073709551615 2\n255\n").unwrap_err();
    assert!(err.contains("allowed range"), "{err}");
}

#[test]
fn rejects_sample_above_max_value() {
    let err = parse("P2\nc\n2 1\n100\n5 101\n").unwrap_err();
    assert!(err.contains("index 1"), "{err}");
}

#[test]
fn rejects_garbage_tokens() {
    assert!(parse("P2\nc\ntwo 2\n255\n").is_err());
    assert!(parse("P2\nc\n1 1\n255\nx\n").is_err());
    assert!(parse("P2\n").is_err());
}

#[test]
fn mask_keeps_metadata_and_writes_unit_max() {
    let image = parse("P2\n# coins\n3 1\n255\n10 200 95\n").unwrap();
    let mask = image.with_mask(&[0, 1, 1]).unwrap();

    assert_eq!(mask.max_value(), 1);
    assert_eq!(mask.comment(), "# coins");
    assert_eq!(pgm::format(&mask), "P2\n# coins\n3 1\n1\n0 1 1\n");
}

#[test]
fn mask_must_match_sample_count() {
    let image = parse("P2\nc\n2 1\n255\n1 2\n").unwrap();
    assert!(image.with_mask(&[1]).is_err());
}

#[test]
fn save_mask_keeps_out_of_range_samples() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("device.pgm");
    let image = parse("P2\n# coins\n2 2\n255\n50 100\n150 200\n").unwrap();

    image.save_mask(&[50, 100, 150, 200], &path).unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "P2\n# coins\n2 2\n1\n50 100\n150 200\n"
    );
}

#[test]
fn save_mask_rejects_wrong_sample_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.pgm");
    let image = parse("P2\nc\n2 1\n255\n1 2\n").unwrap();

    let err = image.save_mask(&[1], &path).unwrap_err();

    assert!(matches!(err, Error::LengthMismatch { left: 2, right: 1 }), "{err}");
    assert!(!path.exists());
}

#[test]
fn save_then_load_preserves_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mask.pgm");
    let image = parse("P2\n# saved\n4 2\n1\n0 1 1 0\n1 1 0 0\n").unwrap();

    image.save(&path).unwrap();
    let loaded = RasterImage::load(&path, &ImageLimits::default()).unwrap();

    assert_eq!(loaded, image);
}

#[test]
fn load_test_resource() {
    let image =
        RasterImage::load(test_resource("coins_small.ascii.pgm"), &ImageLimits::default())
            .unwrap();

    assert_eq!(image.width(), 8);
    assert_eq!(image.height(), 4);
    assert_eq!(image.len(), 32);
}

#[test]
fn load_missing_file_is_io_error() {
    let err = RasterImage::load("/no/such/image.pgm", &ImageLimits::default()).unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "{err}");
}

#[test]
fn load_malformed_file_is_invalid_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.pgm");
    std::fs::write(&path, "P2\nc\n2 2\n255\n1\n").unwrap();

    let err = RasterImage::load(&path, &ImageLimits::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidImage { .. }), "{err}");
}
