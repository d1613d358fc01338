//! Static preset and output-format catalog.
//!
//! Everything here is read-only configuration shared by every other module.
//! Presets are named target boxes; the catalog order is also the order in
//! which selected presets are expanded into tasks.
//!
//! | id | box | quality | target |
//! |----|-----|---------|--------|
//! | `product-zoom` | 1200×1200 | 0.82 | 150 KB |
//! | `product-catalog` | 800×800 | 0.82 | 100 KB |
//! | `product-thumbnail` | 300×300 | 0.80 | 50 KB |
//! | `hero-banner` | 1920×1080 | 0.85 | 300 KB |

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named resize target.
///
/// `target_size_kb` is informational only: nothing re-encodes to hit it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub width: u32,
    pub height: u32,
    /// Encoding quality as a fraction in `[0, 1]`.
    pub quality: f32,
    pub target_size_kb: u32,
}

/// The built-in preset catalog, in catalog order.
pub const PRESETS: &[Preset] = &[
    Preset {
        id: "product-zoom",
        name: "Product Zoom",
        description: "1200×1200 px for detail views",
        width: 1200,
        height: 1200,
        quality: 0.82,
        target_size_kb: 150,
    },
    Preset {
        id: "product-catalog",
        name: "Product Catalog/Shop",
        description: "800×800 px for main listings",
        width: 800,
        height: 800,
        quality: 0.82,
        target_size_kb: 100,
    },
    Preset {
        id: "product-thumbnail",
        name: "Thumbnails (Cart/Widgets)",
        description: "300×300 px for smaller previews",
        width: 300,
        height: 300,
        quality: 0.80,
        target_size_kb: 50,
    },
    Preset {
        id: "hero-banner",
        name: "Hero/Banners",
        description: "1920×1080 px for wide banners",
        width: 1920,
        height: 1080,
        quality: 0.85,
        target_size_kb: 300,
    },
];

/// Look up a preset by id.
pub fn find_preset(id: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.id == id)
}

/// All preset ids in catalog order.
pub fn preset_ids() -> Vec<&'static str> {
    PRESETS.iter().map(|p| p.id).collect()
}

/// Output format of a derivative.
///
/// Raster formats go through the image encoder; `Pdf` wraps the raster as
/// the only page of a new document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy JPEG at the preset quality. Always opaque.
    Jpg,
    /// Lossy WebP at the preset quality, alpha preserved.
    Webp,
    /// PNG, alpha preserved.
    Png,
    /// Single-page PDF sized to the raster.
    Pdf,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Webp,
        OutputFormat::Jpg,
        OutputFormat::Png,
        OutputFormat::Pdf,
    ];

    /// Lowercase file extension, also used as the format tag.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Webp => "webp",
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
        }
    }

    /// Whether the encoded output can carry an alpha channel.
    ///
    /// `Pdf` embeds a JPEG intermediate, so it cannot.
    pub fn supports_alpha(self) -> bool {
        match self {
            OutputFormat::Jpg | OutputFormat::Pdf => false,
            OutputFormat::Webp | OutputFormat::Png => true,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            OutputFormat::Jpg => "JPG",
            OutputFormat::Webp => "WebP",
            OutputFormat::Png => "PNG",
            OutputFormat::Pdf => "PDF",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
