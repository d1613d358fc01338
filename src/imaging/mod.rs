//! Image processing.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (JPEG, PNG, TIFF, WebP) |
//! | **Fit** | [`fit`], pure aspect-fit math |
//! | **Resize + canvas** | Lanczos3 + white flattening |
//! | **Encode** | `image` JPEG / PNG encoders, `webp` (libwebp) for lossy WebP |
//! | **Document** | `lopdf`, one full-bleed page |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] / [`DocumentBackend`] traits + [`RustBackend`] / [`PdfBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod document;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, DocumentBackend, ImageBackend};
pub use calculations::fit;
pub use document::PdfBackend;
pub use operations::{Rendered, encode_output, render_derivative, resize_params};
pub use params::{Canvas, DocumentPage, Quality, RasterFormat, ResizeParams};
pub use rust_backend::{RustBackend, supported_input_extensions};
