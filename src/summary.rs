//! Aggregate statistics over a set of results.
//!
//! Nothing is cached: call [`summarize`] again whenever the result set
//! changes. Savings are signed, because a re-encode can come out larger than
//! the original (PNG from a small JPEG, for instance) and that is reported
//! as-is.

use crate::scheduler::TranscodeResult;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BatchSummary {
    pub total_original: u64,
    pub total_encoded: u64,
    /// `total_original - total_encoded`; negative when outputs grew.
    pub savings: i64,
    /// Savings as a percentage of `total_original`, 0 when that is 0.
    pub percentage_savings: f64,
    pub count: usize,
}

/// Percentage reduction from `original` to `encoded`, guarded against zero.
pub fn reduction_percent(original: u64, encoded: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - encoded as f64) / original as f64 * 100.0
}

fn signed_difference(original: u64, encoded: u64) -> i64 {
    original as i64 - encoded as i64
}

/// Totals across every result.
///
/// Each result counts its source's original size, so a source rendered into
/// several derivatives is counted once per derivative.
pub fn summarize(results: &[TranscodeResult]) -> BatchSummary {
    let total_original: u64 = results.iter().map(|r| r.original_size).sum();
    let total_encoded: u64 = results.iter().map(|r| r.encoded_size).sum();
    BatchSummary {
        total_original,
        total_encoded,
        savings: signed_difference(total_original, total_encoded),
        percentage_savings: reduction_percent(total_original, total_encoded),
        count: results.len(),
    }
}

impl TranscodeResult {
    /// Bytes saved by this derivative; negative when it grew.
    pub fn savings(&self) -> i64 {
        signed_difference(self.original_size, self.encoded_size)
    }

    pub fn reduction_percent(&self) -> f64 {
        reduction_percent(self.original_size, self.encoded_size)
    }
}
