//! Image processing backend traits and shared types.
//!
//! The pipeline never touches a codec directly. It goes through two traits:
//!
//! - [`ImageBackend`]: decode bytes, resize onto a canvas, encode a raster
//! - [`DocumentBackend`]: wrap an encoded JPEG as the only page of a document
//!
//! The production implementations are
//! [`RustBackend`](super::rust_backend::RustBackend) (the `image` crate) and
//! [`PdfBackend`](super::document::PdfBackend) (`lopdf`). Tests swap in the
//! [`MockBackend`](tests::MockBackend) below.

use super::params::{DocumentPage, Quality, RasterFormat, ResizeParams};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of a decoded or produced raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Decode, resize, and encode rasters.
///
/// `Sync` because one backend instance is shared by every worker.
pub trait ImageBackend: Sync {
    /// Decode raw file bytes into a raster.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Resample `image` to exactly the requested size onto the requested canvas.
    fn resize(&self, image: &DynamicImage, params: &ResizeParams) -> DynamicImage;

    /// Serialize a raster. An empty result is reported as [`BackendError::Encode`].
    fn encode(
        &self,
        raster: &DynamicImage,
        format: RasterFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}

/// Build single-page documents around an already-encoded JPEG.
pub trait DocumentBackend: Sync {
    fn single_page(&self, page: &DocumentPage) -> Result<Vec<u8>, BackendError>;
}

impl<T: ImageBackend + ?Sized> ImageBackend for &T {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        (**self).decode(bytes)
    }

    fn resize(&self, image: &DynamicImage, params: &ResizeParams) -> DynamicImage {
        (**self).resize(image, params)
    }

    fn encode(
        &self,
        raster: &DynamicImage,
        format: RasterFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        (**self).encode(raster, format, quality)
    }
}

impl<T: DocumentBackend + ?Sized> DocumentBackend for &T {
    fn single_page(&self, page: &DocumentPage) -> Result<Vec<u8>, BackendError> {
        (**self).single_page(page)
    }
}
