//! # imgbatch
//!
//! Batch image optimizer for product photography. Every source image is
//! rendered with every selected size preset into every selected output
//! format, on a bounded worker pool, and the results are packaged as one
//! folder per preset.
//!
//! # Architecture: Expand, Schedule, Aggregate
//!
//! ```text
//! 1. Expand     sources × presets × formats  →  Vec<Task>         (pure, ordered)
//! 2. Schedule   Vec<Task>  →  N workers  →  Vec<TranscodeResult>   (decode, fit, encode)
//! 3. Aggregate  results  →  summary + archive layout + report.json
//! ```
//!
//! Expansion and aggregation are pure functions over plain data, so they are
//! tested without touching a codec. Scheduling talks to codecs only through
//! the [`imaging::ImageBackend`] and [`imaging::DocumentBackend`] traits,
//! so the worker pool is tested against a mock.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | Built-in presets and the closed [`catalog::OutputFormat`] enum |
//! | [`source`] | Source images, batch session set, input discovery |
//! | [`naming`] | Default output names, sanitizing, suffixed file names |
//! | [`task`] | Cross-product expansion and pre-flight validation |
//! | [`imaging`] | Aspect fit, canvas compositing, codecs, PDF wrapping |
//! | [`scheduler`] | Bounded rayon worker pool with per-task failure isolation |
//! | [`summary`] | Size totals and savings |
//! | [`archive`] | Collision-free layout, directory sink, JSON report |
//! | [`config`] | `imgbatch.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Failures Stay Local
//!
//! A corrupt upload or a failing encoder costs exactly the tasks that touch
//! it. Each task is caught at its boundary (errors and panics alike), logged
//! through `tracing`, and left out of the result set. The batch itself only
//! fails for configuration problems caught before anything runs, or if the
//! worker pool cannot be built.
//!
//! ## A Dedicated Pool, Not the Global One
//!
//! The concurrency limit is a property of the batch, so each
//! [`scheduler::Pipeline`] owns a rayon `ThreadPool` of exactly that many
//! threads. Tasks are spawned into a scope on that pool: a worker that
//! finishes picks up the next task immediately, and the call returns once
//! the scope is drained.
//!
//! ## Codecs
//!
//! Decoding and JPEG/PNG encoding use the `image` crate. Lossy WebP goes
//! through the `webp` crate, which statically builds libwebp, because the
//! `image` WebP encoder is lossless only. PDF pages are assembled with
//! `lopdf`. No runtime system libraries are needed.

pub mod archive;
pub mod catalog;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod scheduler;
pub mod source;
pub mod summary;
pub mod task;

#[cfg(test)]
pub(crate) mod test_helpers;
