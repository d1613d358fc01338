//! Packaging results into the download layout.
//!
//! ```text
//! optimized-images/
//! ├── product-zoom/
//! │   ├── shoe.webp
//! │   └── shoe-2.webp      ← a different source also named "shoe"
//! ├── hero-banner/
//! │   └── shoe.pdf
//! └── report.json
//! ```
//!
//! One folder per preset id, one `{output_name}.{ext}` file per result.
//!
//! ## Collisions
//!
//! Two sources may share an output name. Results are ordered by
//! `(preset id, format, output name, source id)`; within a folder the first
//! keeps the plain name and each later collider takes the lowest free
//! `{output_name}-{n}.{ext}` with `n >= 2`. A suffixed name is never one that
//! is already taken in the folder, including plain names that happen to end
//! in `-2`. The ordering only depends on the results themselves, so the same
//! batch always yields the same layout regardless of completion order.
//!
//! Folder and base names are passed through
//! [`safe_output_name`](crate::naming::safe_output_name) while planning, so
//! every entry stays a `{folder}/{file}` pair directly under the root even
//! for a hand-built [`TranscodeResult`].
//!
//! Planning ([`plan_archive`]) is pure; writing goes through an
//! [`ArchiveSink`], with [`DirectorySink`] as the filesystem implementation.

use crate::catalog::OutputFormat;
use crate::naming::{safe_output_name, suffixed_file_name};
use crate::scheduler::TranscodeResult;
use crate::summary::BatchSummary;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const REPORT_FILE: &str = "report.json";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where one result goes in the archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry<'a> {
    pub result: &'a TranscodeResult,
    folder: String,
    base_name: String,
    suffix: Option<u32>,
}

impl ArchiveEntry<'_> {
    /// Preset folder, a single path component.
    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn file_name(&self) -> String {
        suffixed_file_name(
            &self.base_name,
            self.suffix,
            self.result.format.extension(),
        )
    }

    /// `{folder}/{file_name}`, always with `/`.
    pub fn path(&self) -> String {
        format!("{}/{}", self.folder, self.file_name())
    }
}

/// Destination for archive files.
pub trait ArchiveSink {
    fn write_file(&mut self, folder: &str, file_name: &str, bytes: &[u8])
    -> Result<(), ArchiveError>;
}

/// Writes the archive layout under a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArchiveSink for DirectorySink {
    fn write_file(
        &mut self,
        folder: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<(), ArchiveError> {
        let dir = self.root.join(folder);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(file_name), bytes)?;
        Ok(())
    }
}

/// Assign every result a unique path, in archive order.
pub fn plan_archive(results: &[TranscodeResult]) -> Vec<ArchiveEntry<'_>> {
    let mut ordered: Vec<&TranscodeResult> = results.iter().collect();
    ordered.sort_by(|a, b| {
        (&a.preset_id, a.format, &a.output_name, &a.source_id).cmp(&(
            &b.preset_id,
            b.format,
            &b.output_name,
            &b.source_id,
        ))
    });

    let mut taken: HashMap<String, HashSet<String>> = HashMap::new();
    let mut entries = Vec::with_capacity(ordered.len());
    for result in ordered {
        let folder = safe_output_name(&result.preset_id);
        let base_name = safe_output_name(&result.output_name);
        let names = taken.entry(folder.clone()).or_default();
        let ext = result.format.extension();

        let mut suffix = None;
        let mut n = 2;
        while names.contains(&suffixed_file_name(&base_name, suffix, ext)) {
            suffix = Some(n);
            n += 1;
        }
        names.insert(suffixed_file_name(&base_name, suffix, ext));
        entries.push(ArchiveEntry {
            result,
            folder,
            base_name,
            suffix,
        });
    }
    entries
}

/// Plan the layout and write every payload to `sink`.
///
/// Stops at the first write error.
pub fn write_archive<'a>(
    results: &'a [TranscodeResult],
    sink: &mut impl ArchiveSink,
) -> Result<Vec<ArchiveEntry<'a>>, ArchiveError> {
    let entries = plan_archive(results);
    for entry in &entries {
        sink.write_file(entry.folder(), &entry.file_name(), &entry.result.payload)?;
        tracing::debug!(path = %entry.path(), bytes = entry.result.encoded_size, "archived");
    }
    Ok(entries)
}

/// Machine-readable description of an archive.
#[derive(Debug, Serialize)]
pub struct ArchiveReport {
    pub summary: BatchSummary,
    pub files: Vec<ReportRow>,
}

#[derive(Debug, Serialize)]
pub struct ReportRow {
    pub path: String,
    pub source: String,
    pub preset: String,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub original_size: u64,
    pub encoded_size: u64,
    pub savings: i64,
}

impl ArchiveReport {
    pub fn new(entries: &[ArchiveEntry<'_>], summary: BatchSummary) -> Self {
        let files = entries
            .iter()
            .map(|e| ReportRow {
                path: e.path(),
                source: e.result.original_name.clone(),
                preset: e.result.preset_id.clone(),
                format: e.result.format,
                width: e.result.dimensions.width,
                height: e.result.dimensions.height,
                original_size: e.result.original_size,
                encoded_size: e.result.encoded_size,
                savings: e.result.savings(),
            })
            .collect();
        Self { summary, files }
    }

    /// Write as pretty JSON to `dir/report.json`.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ArchiveError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(REPORT_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }
}
