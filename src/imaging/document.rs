//! Single-page PDF output via `lopdf`.
//!
//! The page is exactly the size of the raster, one PDF unit per pixel, and
//! the JPEG is embedded as-is (`DCTDecode`), so no re-encode happens here.
//!
//! ```text
//! Catalog ─ Pages ─ Page ─┬─ MediaBox [0 0 w h]
//!                         ├─ Resources /XObject /Im0 → JPEG stream
//!                         └─ Contents: q w 0 0 h 0 0 cm /Im0 Do Q
//! ```
//!
//! Orientation is carried by the MediaBox alone: a landscape raster gives a
//! page wider than tall, so no `/Rotate` entry is written.

use super::backend::{BackendError, DocumentBackend};
use super::params::DocumentPage;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Document backend producing PDF 1.5 files.
#[derive(Debug, Default)]
pub struct PdfBackend;

impl PdfBackend {
    pub fn new() -> Self {
        Self
    }
}

fn encode_err(e: impl std::fmt::Display) -> BackendError {
    BackendError::Encode(format!("PDF: {e}"))
}

impl DocumentBackend for PdfBackend {
    fn single_page(&self, page: &DocumentPage) -> Result<Vec<u8>, BackendError> {
        if page.jpeg.is_empty() {
            return Err(BackendError::Encode("PDF: empty page image".into()));
        }
        let (w, h) = (i64::from(page.width), i64::from(page.height));

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => w,
                "Height" => h,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            page.jpeg.clone(),
        ));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        w.into(),
                        0.into(),
                        0.into(),
                        h.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().map_err(encode_err)?,
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), w.into(), h.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).map_err(encode_err)?;
        if buf.is_empty() {
            return Err(BackendError::Encode("PDF: writer produced no bytes".into()));
        }
        Ok(buf)
    }
}
