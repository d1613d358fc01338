//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Progress (one line per finished task, completion order)
//!
//! ```text
//! [1/8] shoe.jpg → product-zoom webp (84.21 KB)
//! [2/8] broken.jpg → product-zoom webp FAILED: Decode failed: ...
//! ```
//!
//! ## Results (archive order)
//!
//! ```text
//! product-zoom/shoe.webp  1200×800  1.4 MB → 84.21 KB  (94.1% smaller)
//! ```
//!
//! ## Summary
//!
//! ```text
//! 7 of 8 tasks succeeded
//! Original: 9.8 MB  Optimized: 612.5 KB  Saved: 9.2 MB (93.9%)
//! ```
//!
//! # Architecture
//!
//! Each block has a `format_*` function (returns `String` or `Vec<String>`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::archive::ArchiveEntry;
use crate::catalog::Preset;
use crate::scheduler::BatchEvent;
use crate::summary::BatchSummary;

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Human-readable byte count in powers of 1024, at most two decimals.
///
/// ```
/// # use imgbatch::output::format_bytes;
/// assert_eq!(format_bytes(0), "0 Bytes");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

/// Like [`format_bytes`], with a leading `-` for negative amounts.
pub fn format_signed_bytes(bytes: i64) -> String {
    if bytes < 0 {
        format!("-{}", format_bytes(bytes.unsigned_abs()))
    } else {
        format_bytes(bytes as u64)
    }
}

fn format_change(percent: f64) -> String {
    if percent >= 0.0 {
        format!("{percent:.1}% smaller")
    } else {
        format!("{:.1}% larger", -percent)
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Format a single progress event as one display line.
pub fn format_batch_event(event: &BatchEvent) -> String {
    match event {
        BatchEvent::TaskCompleted {
            completed,
            total,
            source,
            preset_id,
            format,
            encoded_size,
        } => format!(
            "[{completed}/{total}] {source} \u{2192} {preset_id} {format} ({})",
            format_bytes(*encoded_size)
        ),
        BatchEvent::TaskFailed {
            completed,
            total,
            source,
            preset_id,
            format,
            error,
        } => format!("[{completed}/{total}] {source} \u{2192} {preset_id} {format} FAILED: {error}"),
    }
}

// ============================================================================
// Presets
// ============================================================================

/// Format the preset catalog for the `presets` command.
pub fn format_presets(presets: &[Preset]) -> Vec<String> {
    let width = presets.iter().map(|p| p.id.len()).max().unwrap_or(0);
    presets
        .iter()
        .map(|p| {
            format!(
                "{:<width$}  {}\u{00d7}{}  q{:.2}  \u{2264}{} KB  {}",
                p.id, p.width, p.height, p.quality, p.target_size_kb, p.name
            )
        })
        .collect()
}

pub fn print_presets(presets: &[Preset]) {
    for line in format_presets(presets) {
        println!("{}", line);
    }
}

// ============================================================================
// Results and summary
// ============================================================================

/// One line per archived file, in archive order.
pub fn format_results(entries: &[ArchiveEntry<'_>]) -> Vec<String> {
    let paths: Vec<String> = entries.iter().map(|e| e.path()).collect();
    let width = paths.iter().map(|p| p.chars().count()).max().unwrap_or(0);
    entries
        .iter()
        .zip(&paths)
        .map(|(entry, path)| {
            let r = entry.result;
            format!(
                "{path:<width$}  {}\u{00d7}{}  {} \u{2192} {}  ({})",
                r.dimensions.width,
                r.dimensions.height,
                format_bytes(r.original_size),
                format_bytes(r.encoded_size),
                format_change(r.reduction_percent()),
            )
        })
        .collect()
}

/// Success count plus the size totals.
pub fn format_summary(summary: &BatchSummary, submitted: usize) -> Vec<String> {
    vec![
        format!("{} of {} tasks succeeded", summary.count, submitted),
        format!(
            "Original: {}  Optimized: {}  Saved: {} ({:.1}%)",
            format_bytes(summary.total_original),
            format_bytes(summary.total_encoded),
            format_signed_bytes(summary.savings),
            summary.percentage_savings,
        ),
    ]
}

/// Print results and summary to stdout.
pub fn print_batch_output(entries: &[ArchiveEntry<'_>], summary: &BatchSummary, submitted: usize) {
    for line in format_results(entries) {
        println!("{}", line);
    }
    if !entries.is_empty() {
        println!();
    }
    for line in format_summary(summary, submitted) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
