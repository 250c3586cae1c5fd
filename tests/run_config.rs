use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use cohort_variant_summary::config::SummaryConfig;
use cohort_variant_summary::execution::{ExecutionEvent, ExecutionObserver, SummaryEngine};
use cohort_variant_summary::processing::{top_n, Aggregate};
use cohort_variant_summary::tables::SummaryTables;
use cohort_variant_summary::types::Stage;
use cohort_variant_summary::IngestionError;

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("cohort-variant-summary-cfg-{nanos}-{name}"))
}

const RUN_JSON: &str = r#"{
    "stages": [
        { "label": "I", "aliases": ["IA", "IB"] },
        { "label": "II", "aliases": ["IIA", "IIB"] },
        { "label": "III" }
    ],
    "top_n": [2],
    "num_threads": 2,
    "max_in_flight_files": 1
}"#;

#[derive(Default)]
struct EventCounter {
    started: AtomicUsize,
    finished: AtomicUsize,
    merged: AtomicUsize,
}

impl ExecutionObserver for EventCounter {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::FileStarted { .. } => {
                let _ = self.started.fetch_add(1, Ordering::SeqCst);
            }
            ExecutionEvent::FileFinished { .. } => {
                let _ = self.finished.fetch_add(1, Ordering::SeqCst);
            }
            ExecutionEvent::MergeFinished { .. } => {
                let _ = self.merged.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }
    }
}

#[test]
fn config_file_drives_a_full_run() {
    let path = tmp_file("run.json");
    fs::write(&path, RUN_JSON).unwrap();
    let cfg = SummaryConfig::from_path(&path).unwrap();

    let files = vec![
        cfg.call_file("tests/fixtures/early_s01.Simple_Nucleotide_Variation.maf", "IA", "S01")
            .unwrap(),
        cfg.call_file("tests/fixtures/early_s02_malformed.maf", "ib", "S02").unwrap(),
        cfg.call_file("tests/fixtures/late_s04.gene_level_copy_number.tsv", "IIB", "S04")
            .unwrap(),
    ];
    assert_eq!(files[1].stage.as_str(), "I");

    let counter = Arc::new(EventCounter::default());
    let obs: Arc<dyn ExecutionObserver> = counter.clone();
    let engine = SummaryEngine::new(cfg.execution_options()).unwrap().with_observer(obs);
    let summary = engine.run_with_stages(&files, &cfg.stages, &cfg.ingestion_options());

    assert_eq!(counter.started.load(Ordering::SeqCst), 3);
    assert_eq!(counter.finished.load(Ordering::SeqCst), 3);
    assert_eq!(counter.merged.load(Ordering::SeqCst), 1);
    assert_eq!(engine.metrics().snapshot().max_active_files, 1);

    // Stage III is declared but had no input.
    assert_eq!(summary.stages().len(), 3);
    assert!(summary.stage(&Stage::new("III").unwrap()).unwrap().is_empty());

    let stage_one = summary.stage(&Stage::new("I").unwrap()).unwrap();
    assert_eq!(top_n(stage_one, 2).pairs(), vec![("TP53", 5), ("KRAS", 4)]);

    let tables = SummaryTables::build(&summary, &cfg.top_n);
    assert!(tables.rankings.iter().all(|r| r.n == 2 && r.rank <= 2));
    assert_eq!(tables.stage_summary.len(), 3);

    let _ = fs::remove_file(&path);
}

#[test]
fn unknown_stage_label_is_a_config_error() {
    let cfg = SummaryConfig::from_json_str(RUN_JSON).unwrap();
    let err = cfg.call_file("tests/fixtures/late_s03_empty.maf", "IV", "S03").unwrap_err();
    assert!(matches!(err, IngestionError::UnknownStage { ref label } if label == "IV"));
}

#[test]
fn missing_config_file_is_an_io_error() {
    let err = SummaryConfig::from_path("tests/fixtures/no_such_run.json").unwrap_err();
    assert!(matches!(err, IngestionError::Io(_)));
}
