use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ErrorEntry;
use crate::types::Stage;

use super::unified::CallFileFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// A row was skipped or a file had nothing in it.
    Warning,
    /// A file could not be decoded.
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// Context about one call-file ingestion.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    pub path: PathBuf,
    /// Format used, if one was configured or inferred.
    pub format: Option<CallFileFormat>,
    pub stage: Stage,
    pub sample_id: String,
}

/// Stats reported once a file has been ingested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionStats {
    /// Records accepted for aggregation.
    pub records: usize,
    /// Segment-mean values collected.
    pub segment_values: usize,
    /// Rows rejected with an error entry.
    pub rejected_rows: usize,
    /// Rows that were not variant calls (copy-neutral, blank segment mean).
    pub skipped_rows: usize,
}

/// Observer interface for ingestion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when a file was read (possibly with some rows rejected).
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called for every error entry produced while ingesting a file.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _entry: &ErrorEntry) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, entry: &ErrorEntry) {
        self.on_failure(ctx, severity, entry)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, entry: &ErrorEntry) {
        for o in &self.observers {
            o.on_failure(ctx, severity, entry);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, entry: &ErrorEntry) {
        for o in &self.observers {
            o.on_alert(ctx, severity, entry);
        }
    }
}

/// Logs ingestion events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl IngestionObserver for StdErrObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        eprintln!(
            "[ingest][ok] stage={} sample={} format={:?} path={} records={} segments={} rejected={} skipped={}",
            ctx.stage,
            ctx.sample_id,
            ctx.format,
            ctx.path.display(),
            stats.records,
            stats.segment_values,
            stats.rejected_rows,
            stats.skipped_rows
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, entry: &ErrorEntry) {
        eprintln!(
            "[ingest][{:?}] stage={} sample={} {}",
            severity, ctx.stage, ctx.sample_id, entry
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, entry: &ErrorEntry) {
        eprintln!(
            "[ALERT][ingest][{:?}] stage={} sample={} {}",
            severity, ctx.stage, ctx.sample_id, entry
        );
    }
}

/// Appends rejected files and rows to a tab-separated log file.
///
/// Each line is `unix_ts  source  reason  detail`, one per error entry. Successful files are
/// not logged.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, entry: &ErrorEntry) {
        let source = match entry.row() {
            Some(row) => format!("{}:{}", entry.source(), row),
            None => entry.source().to_string(),
        };
        self.append_line(&format!(
            "{}\t{}\t{}\t{}",
            unix_ts(),
            source,
            entry.reason(),
            entry.detail()
        ));
    }

    // Alerts are already written by `on_failure`.
    fn on_alert(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _entry: &ErrorEntry) {}
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
