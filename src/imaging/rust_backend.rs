//! Pure Rust image backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with format sniffing |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | White canvas | `image::imageops::overlay` onto an opaque `RgbaImage`, then flatten to RGB |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the preset quality |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → WebP | `webp::Encoder` (lossy, libwebp) at the preset quality, alpha kept |

use super::backend::{BackendError, ImageBackend};
use super::params::{Canvas, Quality, RasterFormat, ResizeParams};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw `resized` over opaque white and drop the alpha channel.
fn flatten_onto_white(resized: &DynamicImage) -> DynamicImage {
    let mut canvas = RgbaImage::from_pixel(
        resized.width(),
        resized.height(),
        Rgba([255, 255, 255, 255]),
    );
    image::imageops::overlay(&mut canvas, &resized.to_rgba8(), 0, 0);
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
}

/// Lossy WebP at `quality`. RGBA input keeps its alpha channel.
fn encode_webp(raster: &DynamicImage, quality: Quality) -> Vec<u8> {
    let q = quality.value() as f32;
    if raster.color().has_alpha() {
        let rgba = raster.to_rgba8();
        webp::Encoder::from_rgba(&rgba, rgba.width(), rgba.height())
            .encode(q)
            .to_vec()
    } else {
        let rgb = raster.to_rgb8();
        webp::Encoder::from_rgb(&rgb, rgb.width(), rgb.height())
            .encode(q)
            .to_vec()
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(format!("Failed to sniff format: {e}")))?
            .decode()
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn resize(&self, image: &DynamicImage, params: &ResizeParams) -> DynamicImage {
        let resized = image.resize_exact(params.width, params.height, FilterType::Lanczos3);
        match params.canvas {
            Canvas::Transparent => DynamicImage::ImageRgba8(resized.to_rgba8()),
            Canvas::White if !resized.color().has_alpha() => {
                DynamicImage::ImageRgb8(resized.to_rgb8())
            }
            Canvas::White => flatten_onto_white(&resized),
        }
    }

    fn encode(
        &self,
        raster: &DynamicImage,
        format: RasterFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let encode_err =
            |e: image::ImageError| BackendError::Encode(format!("{format:?} encode failed: {e}"));
        let buf = match format {
            RasterFormat::Jpeg => {
                // JPEG has no alpha channel
                let mut buf = Vec::new();
                DynamicImage::ImageRgb8(raster.to_rgb8())
                    .write_with_encoder(JpegEncoder::new_with_quality(
                        &mut buf,
                        quality.value() as u8,
                    ))
                    .map_err(encode_err)?;
                buf
            }
            RasterFormat::Png => {
                let mut buf = Vec::new();
                raster
                    .write_with_encoder(PngEncoder::new(&mut buf))
                    .map_err(encode_err)?;
                buf
            }
            RasterFormat::WebP => encode_webp(raster, quality),
        };

        if buf.is_empty() {
            return Err(BackendError::Encode(format!(
                "{format:?} encoder produced no bytes"
            )));
        }
        Ok(buf)
    }
}
