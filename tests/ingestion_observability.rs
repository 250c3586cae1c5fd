use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use cohort_variant_summary::error::ErrorEntry;
use cohort_variant_summary::ingestion::{
    ingest_call_file, CallFile, CompositeObserver, FileObserver, IngestionContext, IngestionObserver,
    IngestionOptions, IngestionSeverity, IngestionStats,
};
use cohort_variant_summary::types::Stage;
use cohort_variant_summary::ReasonCode;

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<IngestionStats>>,
    failures: Mutex<Vec<(IngestionSeverity, ReasonCode)>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_success(&self, _ctx: &IngestionContext, stats: IngestionStats) {
        self.successes.lock().unwrap().push(stats);
    }

    fn on_failure(&self, _ctx: &IngestionContext, severity: IngestionSeverity, entry: &ErrorEntry) {
        self.failures.lock().unwrap().push((severity, entry.reason()));
    }

    fn on_alert(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _entry: &ErrorEntry) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("cohort-variant-summary-obs-{nanos}-{name}"))
}

fn options(observer: Arc<dyn IngestionObserver>, alert_at_or_above: IngestionSeverity) -> IngestionOptions {
    IngestionOptions {
        observer: Some(observer),
        alert_at_or_above,
        ..Default::default()
    }
}

fn early_file(path: &str) -> CallFile {
    CallFile::new(path, Stage::new("Early").unwrap(), "S1")
}

#[test]
fn observer_receives_failure_and_alert_on_critical_io_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = options(obs.clone(), IngestionSeverity::Critical);

    // Missing file -> Io error -> Critical
    let outcome = ingest_call_file(&early_file("tests/fixtures/does_not_exist.maf"), &opts);
    assert_eq!(outcome.errors.len(), 1);

    let failures = obs.failures.lock().unwrap().clone();
    let alerts = obs.alerts.lock().unwrap().clone();
    assert_eq!(failures, vec![(IngestionSeverity::Critical, ReasonCode::UnreadableFile)]);
    assert_eq!(alerts, vec![IngestionSeverity::Critical]);
    assert!(obs.successes.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_failure_without_alert_for_non_critical_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = options(obs.clone(), IngestionSeverity::Critical);

    let _ = ingest_call_file(&early_file("tests/fixtures/late_s03_empty.maf"), &opts);

    let failures = obs.failures.lock().unwrap().clone();
    assert_eq!(failures, vec![(IngestionSeverity::Warning, ReasonCode::EmptyFile)]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn row_failures_are_warnings_and_stats_are_reported() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = options(obs.clone(), IngestionSeverity::Warning);

    let _ = ingest_call_file(&early_file("tests/fixtures/late_s04.gene_level_copy_number.tsv"), &opts);

    let failures = obs.failures.lock().unwrap().clone();
    assert_eq!(failures, vec![(IngestionSeverity::Warning, ReasonCode::MissingKeyField)]);
    assert_eq!(obs.alerts.lock().unwrap().clone(), vec![IngestionSeverity::Warning]);

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(
        successes,
        vec![IngestionStats {
            records: 4,
            segment_values: 0,
            rejected_rows: 1,
            skipped_rows: 2,
        }]
    );
}

#[test]
fn undecodable_header_is_an_error_severity() {
    let path = tmp_file("bad_header.maf");
    fs::write(&path, "Gene\tVariant_Classification\nTP53\tSilent\n").unwrap();

    let obs = Arc::new(RecordingObserver::default());
    let opts = options(obs.clone(), IngestionSeverity::Critical);
    let _ = ingest_call_file(&CallFile::new(&path, Stage::new("Early").unwrap(), "S1"), &opts);

    assert_eq!(
        obs.failures.lock().unwrap().clone(),
        vec![(IngestionSeverity::Error, ReasonCode::UnreadableFile)]
    );
    assert!(obs.alerts.lock().unwrap().is_empty());

    let _ = fs::remove_file(&path);
}

#[test]
fn file_observer_writes_failed_files_log() {
    let log = tmp_file("failed_files.log");
    let recording = Arc::new(RecordingObserver::default());
    let file_obs: Arc<dyn IngestionObserver> = Arc::new(FileObserver::new(&log));
    let recording_obs: Arc<dyn IngestionObserver> = recording.clone();
    let composite = CompositeObserver::new(vec![file_obs, recording_obs]);
    let opts = options(Arc::new(composite), IngestionSeverity::Critical);

    let _ = ingest_call_file(&early_file("tests/fixtures/early_s02_malformed.maf"), &opts);
    let _ = ingest_call_file(&early_file("tests/fixtures/late_s03_empty.maf"), &opts);

    let contents = fs::read_to_string(&log).unwrap();
    let lines: Vec<Vec<&str>> = contents.lines().map(|l| l.split('\t').collect()).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0][1], "tests/fixtures/early_s02_malformed.maf:4");
    assert_eq!(lines[0][2], "MALFORMED_ROW");
    assert_eq!(lines[1][1], "tests/fixtures/late_s03_empty.maf");
    assert_eq!(lines[1][2], "EMPTY_FILE");

    // Fan-out reached the second observer too.
    assert_eq!(recording.failures.lock().unwrap().len(), 2);
    assert_eq!(recording.successes.lock().unwrap().len(), 1);

    let _ = fs::remove_file(&log);
}
