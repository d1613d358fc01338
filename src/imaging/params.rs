//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations) (which decides what
//! each task needs) and the [`backend`](super::backend) traits (which do the
//! pixel and byte work). This separation allows swapping backends (e.g. for
//! testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100). Built from a preset's `[0, 1]` factor.
//! - [`Canvas`]: What the resized image is composited onto.
//! - [`RasterFormat`]: Codec used by the image encoder.
//! - [`ResizeParams`]: Target dimensions + canvas for one resize.
//! - [`DocumentPage`]: Encoded JPEG + page size for the document encoder.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    /// Fixed quality of the JPEG embedded in document output.
    pub const DOCUMENT: Quality = Quality(90);

    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    /// Convert a `[0, 1]` quality factor (as presets store it).
    ///
    /// Out-of-range and NaN factors are clamped.
    pub fn from_fraction(factor: f32) -> Self {
        let percent = (factor * 100.0).round();
        if percent.is_nan() {
            return Self::default();
        }
        Self::new(percent.clamp(0.0, 100.0) as u32)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Background the resized image is drawn onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canvas {
    /// Opaque white; the result has no alpha channel.
    White,
    /// Fully transparent; source alpha is kept.
    Transparent,
}

impl Canvas {
    /// White unless both the source and the output can carry alpha.
    pub fn for_output(source_has_alpha: bool, output_supports_alpha: bool) -> Self {
        if source_has_alpha && output_supports_alpha {
            Canvas::Transparent
        } else {
            Canvas::White
        }
    }
}

/// Codec used by [`ImageBackend::encode`](super::ImageBackend::encode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Jpeg,
    Png,
    /// Lossy WebP at the given quality, alpha kept.
    WebP,
}

/// Parameters for a fitted resize.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub width: u32,
    pub height: u32,
    pub canvas: Canvas,
}

/// One document page holding a single full-bleed image.
///
/// `width`/`height` are both the image's pixel size and the page size:
/// one page unit per pixel, no margin. A landscape page is simply one whose
/// width exceeds its height.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}
