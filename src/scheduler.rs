//! Bounded-concurrency batch execution.
//!
//! Every [`Task`] runs on a dedicated rayon pool of `N` worker threads, so at
//! most `N` tasks are decoding, resizing, or encoding at any moment. As soon
//! as a worker finishes a task (success or failure) it picks up the next
//! pending one; there are no fixed-size waves.
//!
//! ## Failure isolation
//!
//! Each task is wrapped at its boundary: a [`BackendError`] or a panic inside
//! one task is logged with the source name, preset, and format, and the task
//! simply produces no result. Sibling tasks and the batch call itself are
//! unaffected.
//!
//! ## Ownership
//!
//! Tasks own their decode and encode buffers. Finished results are moved to
//! the caller over an `mpsc` channel, so workers never share a result list.
//! Results come back in completion order; treat them as unordered.
//!
//! ```text
//! plan_batch ─► [task, task, task, ...] ─► pool (N workers) ─► channel ─► Vec<TranscodeResult>
//!                                             │
//!                                             └─► BatchEvent (optional progress)
//! ```

use crate::catalog::{OutputFormat, PRESETS};
use crate::imaging::{
    BackendError, Dimensions, DocumentBackend, ImageBackend, PdfBackend, RustBackend,
    render_derivative,
};
use crate::source::SourceImage;
use crate::task::{ConfigurationError, Task, plan_batch};
use serde::Serialize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Concurrency limit used when nothing else is configured.
pub const DEFAULT_WORKERS: usize = 4;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("Worker pool setup failed: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Why a single task produced no result. Never escapes the scheduler.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Task panicked: {0}")]
    Panicked(String),
}

/// One successfully encoded derivative.
#[derive(Debug, Clone, Serialize)]
pub struct TranscodeResult {
    pub original_name: String,
    pub source_id: String,
    pub output_name: String,
    pub preset_id: String,
    pub format: OutputFormat,
    /// Size of the source file in bytes.
    pub original_size: u64,
    /// Size of `payload` in bytes.
    pub encoded_size: u64,
    pub dimensions: Dimensions,
    #[serde(skip)]
    pub payload: Vec<u8>,
}

impl TranscodeResult {
    /// `{output_name}.{ext}`, before any collision suffix.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.output_name, self.format.extension())
    }
}

/// Progress notifications, sent as each task reaches a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    TaskCompleted {
        completed: usize,
        total: usize,
        source: String,
        preset_id: String,
        format: OutputFormat,
        encoded_size: u64,
    },
    TaskFailed {
        completed: usize,
        total: usize,
        source: String,
        preset_id: String,
        format: OutputFormat,
        error: String,
    },
}

/// What a batch call returns: the successes and how many tasks were run.
#[derive(Debug)]
pub struct BatchOutcome {
    pub results: Vec<TranscodeResult>,
    pub submitted: usize,
}

impl BatchOutcome {
    pub fn failed(&self) -> usize {
        self.submitted - self.results.len()
    }
}

/// A fixed-size worker pool.
pub struct Scheduler {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl Scheduler {
    /// Build a pool of `workers` threads (at least one).
    pub fn new(workers: usize) -> Result<Self, BatchError> {
        let workers = workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("imgbatch-worker-{i}"))
            .build()?;
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

/// Backends plus the worker pool that drives them.
pub struct Pipeline<I, D> {
    pub images: I,
    pub documents: D,
    scheduler: Scheduler,
}

impl Pipeline<RustBackend, PdfBackend> {
    /// Production pipeline: `image` crate codecs and `lopdf` documents.
    pub fn new(workers: usize) -> Result<Self, BatchError> {
        Self::with_backends(RustBackend::new(), PdfBackend::new(), workers)
    }
}

impl<I: ImageBackend, D: DocumentBackend> Pipeline<I, D> {
    /// Pipeline with injected backends (allows testing with mock).
    pub fn with_backends(images: I, documents: D, workers: usize) -> Result<Self, BatchError> {
        Ok(Self {
            images,
            documents,
            scheduler: Scheduler::new(workers)?,
        })
    }

    pub fn workers(&self) -> usize {
        self.scheduler.workers()
    }

    /// Validate, expand against the built-in catalog, and run a batch.
    ///
    /// Configuration problems are returned before any task starts.
    pub fn run_batch<S: AsRef<str>>(
        &self,
        sources: &[SourceImage],
        selected_presets: &[S],
        formats: &[OutputFormat],
        events: Option<&Sender<BatchEvent>>,
    ) -> Result<BatchOutcome, BatchError> {
        let tasks = plan_batch(sources, PRESETS, selected_presets, formats)?;
        let submitted = tasks.len();
        let results = self.run_tasks(tasks, events);
        Ok(BatchOutcome { results, submitted })
    }

    /// Run every task and return the successes in completion order.
    ///
    /// Returns only after all tasks have finished or failed.
    pub fn run_tasks(
        &self,
        tasks: Vec<Task<'_>>,
        events: Option<&Sender<BatchEvent>>,
    ) -> Vec<TranscodeResult> {
        let total = tasks.len();
        if total == 0 {
            return Vec::new();
        }
        info!(tasks = total, workers = self.workers(), "batch started");

        let completed = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel();

        self.scheduler.pool.scope(|scope| {
            for task in tasks {
                let tx = tx.clone();
                let completed = &completed;
                scope.spawn(move |_| {
                    let outcome = self.execute_isolated(&task);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    match outcome {
                        Ok(result) => {
                            debug!(
                                source = task.source.name(),
                                preset = task.preset.id,
                                format = %task.format,
                                bytes = result.encoded_size,
                                "task finished"
                            );
                            send_event(
                                events,
                                BatchEvent::TaskCompleted {
                                    completed: done,
                                    total,
                                    source: task.source.name().to_string(),
                                    preset_id: task.preset.id.to_string(),
                                    format: task.format,
                                    encoded_size: result.encoded_size,
                                },
                            );
                            // Receiver lives until the scope ends
                            let _ = tx.send(result);
                        }
                        Err(err) => {
                            warn!(
                                source = task.source.name(),
                                preset = task.preset.id,
                                format = %task.format,
                                error = %err,
                                "task failed, skipping"
                            );
                            send_event(
                                events,
                                BatchEvent::TaskFailed {
                                    completed: done,
                                    total,
                                    source: task.source.name().to_string(),
                                    preset_id: task.preset.id.to_string(),
                                    format: task.format,
                                    error: err.to_string(),
                                },
                            );
                        }
                    }
                });
            }
        });
        drop(tx);

        let results: Vec<TranscodeResult> = rx.into_iter().collect();
        info!(
            succeeded = results.len(),
            failed = total - results.len(),
            "batch finished"
        );
        results
    }

    fn execute_isolated(&self, task: &Task<'_>) -> Result<TranscodeResult, TaskError> {
        match catch_unwind(AssertUnwindSafe(|| self.execute(task))) {
            Ok(outcome) => outcome,
            Err(payload) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
        }
    }

    fn execute(&self, task: &Task<'_>) -> Result<TranscodeResult, TaskError> {
        let rendered = render_derivative(
            &self.images,
            &self.documents,
            task.source.bytes(),
            task.preset,
            task.format,
        )?;
        task.source.record_dimensions(rendered.source_dimensions);

        Ok(TranscodeResult {
            original_name: task.source.name().to_string(),
            source_id: task.source.id().to_string(),
            output_name: task.output_name.clone(),
            preset_id: task.preset.id.to_string(),
            format: task.format,
            original_size: task.source.size(),
            encoded_size: rendered.bytes.len() as u64,
            dimensions: rendered.dimensions,
            payload: rendered.bytes,
        })
    }
}

fn send_event(events: Option<&Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is listening
        let _ = tx.send(event);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::imaging::{Quality, RasterFormat, ResizeParams};
    use crate::task::expand_tasks;
    use crate::test_helpers::mock_source;
    use image::DynamicImage;
    use std::time::Duration;

    fn mock_pipeline(backend: &MockBackend, workers: usize) -> Pipeline<&MockBackend, &MockBackend> {
        Pipeline::with_backends(backend, backend, workers).unwrap()
    }

    // =========================================================================
    // Pre-flight
    // =========================================================================

    #[test]
    fn empty_preset_selection_runs_nothing() {
        let backend = MockBackend::new();
        let pipeline = mock_pipeline(&backend, 4);
        let sources = vec![mock_source("a.jpg", "100x100")];
        let none: [&str; 0] = [];

        let result = pipeline.run_batch(&sources, &none, &[OutputFormat::Webp], None);

        assert!(matches!(
            result,
            Err(BatchError::Configuration(ConfigurationError::NoPresets))
        ));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn empty_sources_and_formats_are_configuration_errors() {
        let backend = MockBackend::new();
        let pipeline = mock_pipeline(&backend, 2);
        let sources = vec![mock_source("a.jpg", "100x100")];

        assert!(matches!(
            pipeline.run_batch(&[], &["product-zoom"], &[OutputFormat::Webp], None),
            Err(BatchError::Configuration(ConfigurationError::NoSources))
        ));
        assert!(matches!(
            pipeline.run_batch(&sources, &["product-zoom"], &[], None),
            Err(BatchError::Configuration(ConfigurationError::NoFormats))
        ));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn zero_workers_means_one() {
        let backend = MockBackend::new();
        assert_eq!(mock_pipeline(&backend, 0).workers(), 1);
    }

    #[test]
    fn default_worker_count_is_four() {
        assert_eq!(DEFAULT_WORKERS, 4);
    }

    // =========================================================================
    // Execution
    // =========================================================================

    #[test]
    fn runs_every_task() {
        let backend = MockBackend::new();
        let pipeline = mock_pipeline(&backend, 4);
        let sources = vec![mock_source("a.jpg", "400x200"), mock_source("b.png", "200x400")];

        let outcome = pipeline
            .run_batch(
                &sources,
                &["product-catalog", "product-thumbnail"],
                &[OutputFormat::Webp, OutputFormat::Jpg, OutputFormat::Pdf],
                None,
            )
            .unwrap();

        assert_eq!(outcome.submitted, 12);
        assert_eq!(outcome.results.len(), 12);
        assert_eq!(outcome.failed(), 0);
    }

    #[test]
    fn results_carry_task_metadata() {
        let backend = MockBackend::new();
        let pipeline = mock_pipeline(&backend, 1);
        let mut source = mock_source("shoe.jpg", "4000x2000");
        source.set_output_name("red-shoe");
        let sources = vec![source];

        let outcome = pipeline
            .run_batch(&sources, &["product-catalog"], &[OutputFormat::Jpg], None)
            .unwrap();

        let r = &outcome.results[0];
        assert_eq!(r.original_name, "shoe.jpg");
        assert_eq!(r.source_id, sources[0].id());
        assert_eq!(r.output_name, "red-shoe");
        assert_eq!(r.preset_id, "product-catalog");
        assert_eq!(r.format, OutputFormat::Jpg);
        assert_eq!(r.original_size, 9);
        assert_eq!(r.encoded_size, r.payload.len() as u64);
        assert_eq!(
            r.dimensions,
            Dimensions {
                width: 800,
                height: 400
            }
        );
        assert_eq!(r.file_name(), "red-shoe.jpg");
    }

    #[test]
    fn records_source_dimensions_after_decode() {
        let backend = MockBackend::new();
        let pipeline = mock_pipeline(&backend, 2);
        let sources = vec![mock_source("a.jpg", "300x150")];
        assert_eq!(sources[0].dimensions(), None);

        pipeline
            .run_batch(&sources, &["product-thumbnail"], &[OutputFormat::Png], None)
            .unwrap();

        assert_eq!(
            sources[0].dimensions(),
            Some(Dimensions {
                width: 300,
                height: 150
            })
        );
    }

    #[test]
    fn corrupt_source_is_isolated() {
        let backend = MockBackend::new();
        let pipeline = mock_pipeline(&backend, 3);
        let sources = vec![
            mock_source("a.jpg", "100x50"),
            mock_source("broken.jpg", "\u{89}PNG not really"),
            mock_source("b.jpg", "50x100"),
            mock_source("c.jpg", "64x64"),
        ];

        let outcome = pipeline
            .run_batch(
                &sources,
                &["product-thumbnail"],
                &[OutputFormat::Webp, OutputFormat::Png],
                None,
            )
            .unwrap();

        assert_eq!(outcome.submitted, 8);
        assert_eq!(outcome.results.len(), 6);
        assert!(outcome.results.iter().all(|r| r.original_name != "broken.jpg"));
    }

    #[test]
    fn encode_failure_only_drops_that_format() {
        let backend = MockBackend::failing_encode(RasterFormat::WebP);
        let pipeline = mock_pipeline(&backend, 2);
        let sources = vec![mock_source("a.jpg", "100x50")];

        let outcome = pipeline
            .run_batch(
                &sources,
                &["product-zoom"],
                &[OutputFormat::Webp, OutputFormat::Jpg],
                None,
            )
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].format, OutputFormat::Jpg);
    }

    /// Backend that panics on one specific input.
    struct PanickyBackend(MockBackend);

    impl ImageBackend for PanickyBackend {
        fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
            if bytes == b"boom" {
                panic!("decoder exploded");
            }
            self.0.decode(bytes)
        }

        fn resize(&self, image: &DynamicImage, params: &ResizeParams) -> DynamicImage {
            self.0.resize(image, params)
        }

        fn encode(
            &self,
            raster: &DynamicImage,
            format: RasterFormat,
            quality: Quality,
        ) -> Result<Vec<u8>, BackendError> {
            self.0.encode(raster, format, quality)
        }
    }

    #[test]
    fn panicking_task_is_isolated() {
        let images = PanickyBackend(MockBackend::new());
        let documents = MockBackend::new();
        let pipeline = Pipeline::with_backends(&images, &documents, 2).unwrap();
        let sources = vec![mock_source("ok.jpg", "10x10"), mock_source("bad.jpg", "boom")];
        let (tx, rx) = mpsc::channel();

        let outcome = pipeline
            .run_batch(&sources, &["product-zoom"], &[OutputFormat::Png], Some(&tx))
            .unwrap();
        drop(tx);

        assert_eq!(outcome.results.len(), 1);
        let failures: Vec<String> = rx
            .iter()
            .filter_map(|e| match e {
                BatchEvent::TaskFailed { error, .. } => Some(error),
                _ => None,
            })
            .collect();
        assert_eq!(failures, vec!["Task panicked: decoder exploded".to_string()]);
    }

    // =========================================================================
    // Concurrency
    // =========================================================================

    #[test]
    fn never_exceeds_worker_limit() {
        let backend = MockBackend::with_delay(Duration::from_millis(15));
        let pipeline = mock_pipeline(&backend, 3);
        let sources: Vec<SourceImage> = (0..8)
            .map(|i| mock_source(&format!("img-{i}.jpg"), "40x30"))
            .collect();

        let outcome = pipeline
            .run_batch(
                &sources,
                &["product-zoom", "product-thumbnail"],
                &[OutputFormat::Webp, OutputFormat::Png],
                None,
            )
            .unwrap();

        assert_eq!(outcome.results.len(), 32);
        let peak = backend.peak_in_flight();
        assert!(peak <= 3, "peak {peak} exceeded limit");
        assert!(peak >= 2, "workers never overlapped");
    }

    #[test]
    fn single_worker_runs_serially() {
        let backend = MockBackend::with_delay(Duration::from_millis(2));
        let pipeline = mock_pipeline(&backend, 1);
        let sources: Vec<SourceImage> = (0..4)
            .map(|i| mock_source(&format!("img-{i}.jpg"), "40x30"))
            .collect();

        pipeline
            .run_batch(&sources, &["product-zoom"], &[OutputFormat::Jpg], None)
            .unwrap();

        assert_eq!(backend.peak_in_flight(), 1);
    }

    #[test]
    fn run_tasks_with_no_tasks_returns_empty() {
        let backend = MockBackend::new();
        let pipeline = mock_pipeline(&backend, 2);
        assert!(pipeline.run_tasks(Vec::new(), None).is_empty());
    }

    // =========================================================================
    // Progress events
    // =========================================================================

    #[test]
    fn emits_one_event_per_task() {
        let backend = MockBackend::new();
        let pipeline = mock_pipeline(&backend, 2);
        let sources = vec![mock_source("a.jpg", "100x100"), mock_source("bad.jpg", "nope")];
        let (tx, rx) = mpsc::channel();

        pipeline
            .run_batch(&sources, &["hero-banner"], &[OutputFormat::Jpg], Some(&tx))
            .unwrap();
        drop(tx);

        let events: Vec<BatchEvent> = rx.iter().collect();
        assert_eq!(events.len(), 2);
        let mut counts: Vec<usize> = events
            .iter()
            .map(|e| match e {
                BatchEvent::TaskCompleted { completed, total, .. }
                | BatchEvent::TaskFailed { completed, total, .. } => {
                    assert_eq!(*total, 2);
                    *completed
                }
            })
            .collect();
        counts.sort();
        assert_eq!(counts, vec![1, 2]);
        assert!(events.iter().any(|e| matches!(
            e,
            BatchEvent::TaskFailed { source, preset_id, format: OutputFormat::Jpg, .. }
                if source == "bad.jpg" && preset_id == "hero-banner"
        )));
    }

    // =========================================================================
    // Determinism
    // =========================================================================

    #[test]
    fn rerun_yields_identical_dimensions() {
        let backend = MockBackend::new();
        let pipeline = mock_pipeline(&backend, 4);
        let sources = vec![mock_source("a.jpg", "1234x567"), mock_source("b.jpg", "640x960")];
        let presets = ["product-zoom", "hero-banner"];
        let formats = [OutputFormat::Webp, OutputFormat::Pdf];

        let key = |results: Vec<TranscodeResult>| {
            let mut rows: Vec<(String, String, OutputFormat, u32, u32, u64)> = results
                .into_iter()
                .map(|r| {
                    (
                        r.source_id,
                        r.preset_id,
                        r.format,
                        r.dimensions.width,
                        r.dimensions.height,
                        r.encoded_size,
                    )
                })
                .collect();
            rows.sort();
            rows
        };

        let first = pipeline.run_batch(&sources, &presets, &formats, None).unwrap();
        let second = pipeline.run_batch(&sources, &presets, &formats, None).unwrap();
        assert_eq!(key(first.results), key(second.results));
    }

    #[test]
    fn run_tasks_accepts_hand_built_lists() {
        let backend = MockBackend::new();
        let pipeline = mock_pipeline(&backend, 2);
        let sources = vec![mock_source("a.jpg", "10x10")];
        let tasks = expand_tasks(&sources, PRESETS, &["product-zoom"], &[OutputFormat::Png]);

        let results = pipeline.run_tasks(tasks, None);
        assert_eq!(results.len(), 1);
    }
}
