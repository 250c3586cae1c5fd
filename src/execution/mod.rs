//! Parallel batch execution with configurable parallelism.
//!
//! This module sits "above" [`crate::ingestion`] and [`crate::processing`] and provides:
//!
//! - Parallel per-file ingestion, each worker folding into a private partial aggregate
//! - Resource limits / throttling (bounded number of files in flight)
//! - Real-time metrics + observer hooks for monitoring
//! - [`summarize`], the same pipeline on the calling thread
//!
//! Both paths produce identical [`BatchSummary`] values for the same input files.

mod batch;
mod observer;
mod semaphore;

use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;

use crate::error::{IngestionError, IngestionResult};
use crate::ingestion::{ingest_staged_call_file, CallFile, FileOutcome, IngestionOptions};
use crate::processing::{Aggregate, StageAggregator};
use crate::types::StageSet;

pub use batch::{summarize, summarize_with_stages, BatchSummary};
pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, StdErrExecutionObserver,
};

use batch::BatchBuilder;
use semaphore::Semaphore;

/// Configuration for the [`SummaryEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Upper bound on files being read at the same time.
    ///
    /// This is an additional throttle on top of `num_threads`.
    pub max_in_flight_files: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = available_threads();
        Self {
            num_threads: Some(n),
            max_in_flight_files: n.max(1),
        }
    }
}

impl ExecutionOptions {
    pub fn validate(&self) -> IngestionResult<()> {
        if self.max_in_flight_files == 0 {
            return Err(IngestionError::Config {
                message: "max_in_flight_files must be > 0".to_string(),
            });
        }
        if self.num_threads == Some(0) {
            return Err(IngestionError::Config {
                message: "num_threads must be > 0 when set".to_string(),
            });
        }
        Ok(())
    }
}

/// Runs ingestion and aggregation for a batch of call files on a dedicated rayon pool.
pub struct SummaryEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl SummaryEngine {
    /// Create a new engine with the given options.
    ///
    /// Fails with [`IngestionError::Config`] for zero thread/file limits, or
    /// [`IngestionError::ThreadPool`] if the pool cannot be built.
    pub fn new(opts: ExecutionOptions) -> IngestionResult<Self> {
        opts.validate()?;
        let n_threads = opts.num_threads.unwrap_or_else(available_threads).max(1);
        let pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Ingest and summarize `files` in parallel. Every file keeps its own stage label.
    pub fn run(&self, files: &[CallFile], options: &IngestionOptions) -> BatchSummary {
        self.run_with_stages(files, &StageSet::new(), options)
    }

    /// Like [`Self::run`], but each file's stage label is resolved through `stages`.
    ///
    /// Every declared stage gets an aggregate even if no file contributed to it. A file whose
    /// label is not declared is recorded as `UNREADABLE_FILE`.
    pub fn run_with_stages(&self, files: &[CallFile], stages: &StageSet, options: &IngestionOptions) -> BatchSummary {
        let builder = BatchBuilder::new(stages.stages());
        self.pool.install(|| self.run_impl(files, stages, builder, options))
    }

    fn run_impl(
        &self,
        files: &[CallFile],
        stages: &StageSet,
        mut builder: BatchBuilder,
        options: &IngestionOptions,
    ) -> BatchSummary {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted { files: files.len() });

        let sem = Semaphore::new(self.opts.max_in_flight_files);

        // `collect` keeps input order, so the error log matches the sequential path.
        let per_file: Vec<(FileOutcome, StageAggregator)> = files
            .par_iter()
            .map(|file| {
                let permit = sem.acquire();
                let waited = permit.waited();
                if waited > Duration::ZERO {
                    self.metrics.on_throttle_wait(waited);
                    self.emit(ExecutionEvent::ThrottleWaited { duration: waited });
                }

                self.metrics.on_file_start();
                self.emit(ExecutionEvent::FileStarted {
                    path: file.path.clone(),
                    stage: file.stage.clone(),
                });

                let mut outcome = ingest_staged_call_file(file, stages, options);

                let mut partial = StageAggregator::new();
                partial.fold_all(&outcome.records);
                let records = std::mem::take(&mut outcome.records).len();

                self.emit(ExecutionEvent::FileFinished {
                    path: file.path.clone(),
                    records,
                    errors: outcome.errors.len(),
                });
                self.metrics.on_file_end(records, outcome.errors.len());
                drop(permit);
                (outcome, partial)
            })
            .collect();

        for (outcome, partial) in per_file {
            builder.add_partial(outcome, partial);
        }
        let summary = builder.finish();
        self.emit(ExecutionEvent::MergeFinished {
            stages: summary.stages().len(),
            records: summary.combined().total(),
        });

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });

        summary
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

fn available_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
