//! Source images and the batch session that owns them.
//!
//! A [`SourceImage`] is the raw bytes of one uploaded file plus what we know
//! about it. Its identifier is `"{name}-{mtime_millis}"`, so adding the same
//! file twice is detected and ignored by [`SourceSet::add`].
//!
//! Pixel dimensions are unknown until a task decodes the image. The first
//! task to decode records them; every later task sees the same value.
//!
//! The output base name is private and only ever holds a sanitized value
//! (see [`naming::sanitize_output_name`](crate::naming::sanitize_output_name)),
//! so it is always a single path component.

use crate::imaging::{Dimensions, supported_input_extensions};
use crate::naming::{default_output_name, safe_output_name, sanitize_output_name};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Walking {0} failed: {1}")]
    Walk(PathBuf, walkdir::Error),
    #[error("No source file named {0}")]
    UnknownSource(String),
    #[error("Output name {0:?} is empty after sanitizing")]
    InvalidOutputName(String),
}

/// One input image for a batch.
#[derive(Clone)]
pub struct SourceImage {
    id: String,
    name: String,
    bytes: Vec<u8>,
    dimensions: OnceLock<Dimensions>,
    output_name: String,
}

impl SourceImage {
    /// Build a source from in-memory bytes.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, modified: SystemTime) -> Self {
        let name = name.into();
        let millis = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        Self {
            id: format!("{name}-{millis}"),
            output_name: safe_output_name(&default_output_name(&name)),
            name,
            bytes,
            dimensions: OnceLock::new(),
        }
    }

    /// Read a source from disk, using the file's modification time for its id.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let io_err = |source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        };
        let bytes = std::fs::read(path).map_err(io_err)?;
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(io_err)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes, modified))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Base name used for every derivative of this source.
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Replace the output base name with a sanitized `name`.
    ///
    /// Returns `false` and keeps the old name when nothing usable is left.
    pub fn set_output_name(&mut self, name: &str) -> bool {
        match sanitize_output_name(name) {
            Some(clean) => {
                self.output_name = clean;
                true
            }
            None => false,
        }
    }

    /// Size of the original file in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Pixel dimensions, once some task has decoded the image.
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions.get().copied()
    }

    pub(crate) fn record_dimensions(&self, dims: Dimensions) {
        let _ = self.dimensions.set(dims);
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .field("dimensions", &self.dimensions.get())
            .field("output_name", &self.output_name)
            .finish()
    }
}

/// The ordered set of sources for one batch session.
#[derive(Debug, Default, Clone)]
pub struct SourceSet {
    images: Vec<SourceImage>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source. Returns `false` (and drops it) if its id is taken.
    pub fn add(&mut self, image: SourceImage) -> bool {
        if self.images.iter().any(|i| i.id == image.id) {
            tracing::debug!(id = %image.id, "duplicate source ignored");
            return false;
        }
        self.images.push(image);
        true
    }

    /// Change the output base name of a source.
    ///
    /// Returns `false` if the id is unknown or the new name is empty after
    /// sanitizing; the old name is kept in that case.
    pub fn rename(&mut self, id: &str, new_name: &str) -> bool {
        self.images
            .iter_mut()
            .find(|i| i.id == id)
            .is_some_and(|image| image.set_output_name(new_name))
    }

    /// Rename every source whose file name matches `file`.
    ///
    /// `file` may be a path; only its last component is compared. Returns
    /// how many sources were renamed.
    pub fn rename_file(&mut self, file: &str, new_name: &str) -> Result<usize, SourceError> {
        if sanitize_output_name(new_name).is_none() {
            return Err(SourceError::InvalidOutputName(new_name.to_string()));
        }
        let wanted = Path::new(file)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.to_string());

        let mut renamed = 0;
        for image in self.images.iter_mut().filter(|i| i.name == wanted) {
            image.set_output_name(new_name);
            renamed += 1;
        }
        if renamed == 0 {
            return Err(SourceError::UnknownSource(file.to_string()));
        }
        tracing::debug!(file = %wanted, name = new_name, renamed, "output name overridden");
        Ok(renamed)
    }

    pub fn get(&self, id: &str) -> Option<&SourceImage> {
        self.images.iter().find(|i| i.id == id)
    }

    pub fn as_slice(&self) -> &[SourceImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Drop every source, ending the session.
    pub fn clear(&mut self) {
        self.images.clear();
    }
}

/// Parse a `FILE=NAME` output name override.
///
/// Splits on the first `=`, so names may themselves contain `=`.
pub fn parse_name_override(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((file, name)) if !file.trim().is_empty() && !name.trim().is_empty() => {
            Ok((file.trim().to_string(), name.to_string()))
        }
        _ => Err(format!("expected FILE=NAME, got {arg:?}")),
    }
}

/// Expand CLI inputs into image file paths.
///
/// Files are taken as given. Directories are walked recursively and only
/// files with a supported image extension are kept, sorted by path so the
/// batch order is reproducible.
pub fn collect_input_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, SourceError> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            paths.push(input.clone());
            continue;
        }
        let mut found = Vec::new();
        for entry in WalkDir::new(input) {
            let entry = entry.map_err(|e| SourceError::Walk(input.clone(), e))?;
            if entry.file_type().is_file() && has_supported_extension(entry.path()) {
                found.push(entry.into_path());
            }
        }
        found.sort();
        paths.extend(found);
    }
    Ok(paths)
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}
