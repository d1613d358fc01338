//! Shared test utilities for the imgbatch test suite.
//!
//! Two kinds of fixtures:
//!
//! - **Real encoded images** ([`gradient_jpeg`], [`transparent_png`]) built
//!   in memory with the `image` crate, for exercising the real backends.
//! - **Mock sources** ([`mock_source`]) whose bytes are a `"WxH"` descriptor
//!   understood by [`MockBackend`](crate::imaging::backend::tests::MockBackend).
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = mock_source("shoe.jpg", "1200x800");
//! let real = gradient_jpeg(64, 32);
//! ```

use crate::catalog::OutputFormat;
use crate::imaging::Dimensions;
use crate::scheduler::TranscodeResult;
use crate::source::SourceImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
use std::time::{Duration, UNIX_EPOCH};

// =========================================================================
// Encoded images
// =========================================================================

/// A `width × height` JPEG with a horizontal/vertical color gradient.
pub fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 90)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// A fully transparent `width × height` RGBA PNG.
pub fn transparent_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 0]));
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .unwrap();
    buf
}

// =========================================================================
// Mock sources and results
// =========================================================================

/// A source whose bytes are `descriptor`, with a fixed modification time.
///
/// Ids stay unique as long as names are.
pub fn mock_source(name: &str, descriptor: &str) -> SourceImage {
    SourceImage::new(
        name,
        descriptor.as_bytes().to_vec(),
        UNIX_EPOCH + Duration::from_millis(1_700_000_000_000),
    )
}

/// A finished result with the given sizes and a payload of `encoded` bytes.
pub fn result_with_sizes(original: u64, encoded: u64) -> TranscodeResult {
    TranscodeResult {
        original_name: "a.jpg".to_string(),
        source_id: "a.jpg-1".to_string(),
        output_name: "a".to_string(),
        preset_id: "product-zoom".to_string(),
        format: OutputFormat::Webp,
        original_size: original,
        encoded_size: encoded,
        dimensions: Dimensions {
            width: 10,
            height: 10,
        },
        payload: vec![0; encoded as usize],
    }
}

/// A finished result for archive tests: `(source_id, output_name, preset, format)`.
pub fn named_result(
    source_id: &str,
    output_name: &str,
    preset_id: &str,
    format: OutputFormat,
) -> TranscodeResult {
    TranscodeResult {
        original_name: format!("{output_name}.jpg"),
        source_id: source_id.to_string(),
        output_name: output_name.to_string(),
        preset_id: preset_id.to_string(),
        format,
        original_size: 100,
        encoded_size: source_id.len() as u64,
        dimensions: Dimensions {
            width: 1,
            height: 1,
        },
        payload: source_id.as_bytes().to_vec(),
    }
}
