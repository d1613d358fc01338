//! High-level image operations.
//!
//! These functions combine calculations with backend execution: decode the
//! source, fit it to the preset, composite, then dispatch on the output
//! format.

use super::backend::{BackendError, Dimensions, DocumentBackend, ImageBackend};
use super::calculations::fit;
use super::params::{Canvas, DocumentPage, Quality, RasterFormat, ResizeParams};
use crate::catalog::{OutputFormat, Preset};
use image::DynamicImage;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// One encoded derivative.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    /// Pixel size of the output raster (and page, for documents).
    pub dimensions: Dimensions,
    /// Pixel size of the decoded source.
    pub source_dimensions: Dimensions,
}

/// Work out the resize for a source going into `preset` as `format`.
pub fn resize_params(
    source: Dimensions,
    source_has_alpha: bool,
    preset: &Preset,
    format: OutputFormat,
) -> ResizeParams {
    let (width, height) = fit(
        (source.width, source.height),
        (preset.width, preset.height),
    );
    ResizeParams {
        width,
        height,
        canvas: Canvas::for_output(source_has_alpha, format.supports_alpha()),
    }
}

/// Serialize a fitted raster as `format`.
///
/// Raster formats go straight to the image backend. `Pdf` first encodes a
/// JPEG intermediate at [`Quality::DOCUMENT`], then asks the document
/// backend for a page of exactly the raster's size.
pub fn encode_output(
    images: &impl ImageBackend,
    documents: &impl DocumentBackend,
    raster: &DynamicImage,
    format: OutputFormat,
    quality: Quality,
) -> Result<Vec<u8>> {
    let bytes = match format {
        OutputFormat::Jpg => images.encode(raster, RasterFormat::Jpeg, quality)?,
        OutputFormat::Webp => images.encode(raster, RasterFormat::WebP, quality)?,
        OutputFormat::Png => images.encode(raster, RasterFormat::Png, quality)?,
        OutputFormat::Pdf => {
            let jpeg = images.encode(raster, RasterFormat::Jpeg, Quality::DOCUMENT)?;
            documents.single_page(&DocumentPage {
                jpeg,
                width: raster.width(),
                height: raster.height(),
            })?
        }
    };
    if bytes.is_empty() {
        return Err(BackendError::Encode(format!("{format} output is empty")));
    }
    Ok(bytes)
}

/// Decode → fit → composite → encode, for one (source, preset, format).
pub fn render_derivative(
    images: &impl ImageBackend,
    documents: &impl DocumentBackend,
    source_bytes: &[u8],
    preset: &Preset,
    format: OutputFormat,
) -> Result<Rendered> {
    let decoded = images.decode(source_bytes)?;
    let source_dimensions = Dimensions {
        width: decoded.width(),
        height: decoded.height(),
    };

    let params = resize_params(
        source_dimensions,
        decoded.color().has_alpha(),
        preset,
        format,
    );
    let raster = images.resize(&decoded, &params);
    drop(decoded);

    let bytes = encode_output(
        images,
        documents,
        &raster,
        format,
        Quality::from_fraction(preset.quality),
    )?;

    Ok(Rendered {
        bytes,
        dimensions: Dimensions {
            width: params.width,
            height: params.height,
        },
        source_dimensions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_preset;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn preset(id: &str) -> &'static Preset {
        find_preset(id).unwrap()
    }

    #[test]
    fn resize_params_fit_catalog_preset() {
        let params = resize_params(
            Dimensions {
                width: 4000,
                height: 2000,
            },
            false,
            preset("product-catalog"),
            OutputFormat::Webp,
        );
        assert_eq!((params.width, params.height), (800, 400));
        assert_eq!(params.canvas, Canvas::White);
    }

    #[test]
    fn resize_params_keep_alpha_for_png() {
        let params = resize_params(
            Dimensions {
                width: 100,
                height: 100,
            },
            true,
            preset("product-thumbnail"),
            OutputFormat::Png,
        );
        assert_eq!(params.canvas, Canvas::Transparent);
    }

    #[test]
    fn resize_params_flatten_alpha_for_jpg_and_pdf() {
        for format in [OutputFormat::Jpg, OutputFormat::Pdf] {
            let params = resize_params(
                Dimensions {
                    width: 100,
                    height: 100,
                },
                true,
                preset("product-thumbnail"),
                format,
            );
            assert_eq!(params.canvas, Canvas::White, "{format}");
        }
    }

    #[test]
    fn render_raster_uses_preset_quality() {
        let backend = MockBackend::new();
        let out = render_derivative(
            &backend,
            &backend,
            b"4000x2000",
            preset("hero-banner"),
            OutputFormat::Jpg,
        )
        .unwrap();

        assert_eq!(
            out.dimensions,
            Dimensions {
                width: 1920,
                height: 960
            }
        );
        assert_eq!(
            out.source_dimensions,
            Dimensions {
                width: 4000,
                height: 2000
            }
        );
        let ops = backend.get_operations();
        assert!(matches!(
            ops.last(),
            Some(RecordedOp::Encode {
                format: RasterFormat::Jpeg,
                quality: 85
            })
        ));
    }

    #[test]
    fn render_webp_uses_preset_quality() {
        let backend = MockBackend::new();
        render_derivative(
            &backend,
            &backend,
            b"1200x1200",
            preset("product-zoom"),
            OutputFormat::Webp,
        )
        .unwrap();

        assert_eq!(
            backend.get_operations().last(),
            Some(&RecordedOp::Encode {
                format: RasterFormat::WebP,
                quality: 82
            })
        );
    }

    #[test]
    fn render_pdf_wraps_fixed_quality_jpeg() {
        let backend = MockBackend::new();
        let out = render_derivative(
            &backend,
            &backend,
            b"400x200",
            preset("product-catalog"),
            OutputFormat::Pdf,
        )
        .unwrap();

        assert!(out.bytes.starts_with(b"%PDF"));
        let ops = backend.get_operations();
        assert_eq!(
            &ops[2..],
            &[
                RecordedOp::Encode {
                    format: RasterFormat::Jpeg,
                    quality: 90
                },
                RecordedOp::Document {
                    width: 800,
                    height: 400
                },
            ]
        );
    }

    #[test]
    fn render_decode_failure_stops_early() {
        let backend = MockBackend::new();
        let result = render_derivative(
            &backend,
            &backend,
            b"garbage",
            preset("product-zoom"),
            OutputFormat::Webp,
        );
        assert!(matches!(result, Err(BackendError::Decode(_))));
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[test]
    fn render_empty_encode_is_error() {
        let backend = MockBackend::failing_encode(RasterFormat::WebP);
        let result = render_derivative(
            &backend,
            &backend,
            b"100x100",
            preset("product-thumbnail"),
            OutputFormat::Webp,
        );
        assert!(matches!(result, Err(BackendError::Encode(_))));
    }
}
