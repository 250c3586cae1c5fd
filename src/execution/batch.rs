//! Run-level accumulation and the sequential pipeline.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ingestion::{ingest_staged_call_file, CallFile, ErrorCollector, FileOutcome, IngestionOptions};
use crate::processing::{merge, Aggregate, CombinedAggregate, SegmentMeanStats, StageAggregate, StageAggregator};
use crate::types::{Stage, StageSet};

/// Everything one run produced, handed to the report layer read-only.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    stages: BTreeMap<Stage, StageAggregate>,
    combined: CombinedAggregate,
    segment_stats: BTreeMap<Stage, SegmentMeanStats>,
    overall_segment_stats: Option<SegmentMeanStats>,
    errors: ErrorCollector,
    files_processed: usize,
    skipped_rows: usize,
}

impl BatchSummary {
    /// Per-stage aggregates, keyed by stage.
    pub fn stages(&self) -> &BTreeMap<Stage, StageAggregate> {
        &self.stages
    }

    pub fn stage(&self, stage: &Stage) -> Option<&StageAggregate> {
        self.stages.get(stage)
    }

    pub fn combined(&self) -> &CombinedAggregate {
        &self.combined
    }

    /// Segment-mean statistics for stages that had any segment values.
    pub fn segment_stats(&self) -> &BTreeMap<Stage, SegmentMeanStats> {
        &self.segment_stats
    }

    /// Segment-mean statistics across all stages.
    pub fn overall_segment_stats(&self) -> Option<&SegmentMeanStats> {
        self.overall_segment_stats.as_ref()
    }

    /// Rejected files and rows, in input-file order.
    pub fn errors(&self) -> &ErrorCollector {
        &self.errors
    }

    pub fn files_processed(&self) -> usize {
        self.files_processed
    }

    /// Rows that were read but were not variant calls.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// `true` if no record was folded into any stage.
    pub fn is_empty(&self) -> bool {
        self.combined.total() == 0
    }
}

/// Accumulation point for file outcomes.
///
/// Outcomes must be added in input-file order so the error log is reproducible; the
/// aggregates themselves do not depend on order.
#[derive(Debug, Default)]
pub(crate) struct BatchBuilder {
    aggregator: StageAggregator,
    segment_means: BTreeMap<Stage, Vec<f64>>,
    errors: ErrorCollector,
    files_processed: usize,
    skipped_rows: usize,
}

impl BatchBuilder {
    pub(crate) fn new<I: IntoIterator<Item = Stage>>(declared: I) -> Self {
        Self {
            aggregator: StageAggregator::with_stages(declared),
            ..Self::default()
        }
    }

    /// Add one file whose records were already folded into `partial`.
    pub(crate) fn add_partial(&mut self, outcome: FileOutcome, partial: StageAggregator) {
        self.aggregator.merge(partial);
        self.add_rest(outcome);
    }

    /// Add one file, folding its records here.
    pub(crate) fn add_outcome(&mut self, outcome: FileOutcome) {
        self.aggregator.fold_all(&outcome.records);
        self.add_rest(outcome);
    }

    fn add_rest(&mut self, outcome: FileOutcome) {
        self.files_processed += 1;
        self.skipped_rows += outcome.skipped_rows;
        if !outcome.segment_means.is_empty() {
            self.segment_means
                .entry(outcome.stage)
                .or_default()
                .extend(outcome.segment_means);
        }
        self.errors.extend(outcome.errors);
    }

    pub(crate) fn finish(self) -> BatchSummary {
        let stages = self.aggregator.finalize();
        let combined = merge(stages.values());

        let segment_stats: BTreeMap<Stage, SegmentMeanStats> = self
            .segment_means
            .iter()
            .filter_map(|(stage, values)| {
                SegmentMeanStats::from_values(values).map(|s| (stage.clone(), s))
            })
            .collect();
        let all_values: Vec<f64> = self.segment_means.values().flatten().copied().collect();
        let overall_segment_stats = SegmentMeanStats::from_values(&all_values);

        BatchSummary {
            stages,
            combined,
            segment_stats,
            overall_segment_stats,
            errors: self.errors,
            files_processed: self.files_processed,
            skipped_rows: self.skipped_rows,
        }
    }
}

/// Ingest `files` one after another on the calling thread and summarize them.
///
/// Every file keeps its own stage label. Never fails: unreadable files and bad rows end up in
/// [`BatchSummary::errors`].
pub fn summarize(files: &[CallFile], options: &IngestionOptions) -> BatchSummary {
    summarize_with_stages(files, &StageSet::new(), options)
}

/// Like [`summarize`], but each file's stage label is resolved through `stages`.
///
/// Every declared stage gets an aggregate even if no file contributed to it, subtype labels
/// are folded into their declared stage, and a file whose label is not declared is recorded as
/// `UNREADABLE_FILE`.
pub fn summarize_with_stages(files: &[CallFile], stages: &StageSet, options: &IngestionOptions) -> BatchSummary {
    let mut builder = BatchBuilder::new(stages.stages());
    for file in files {
        builder.add_outcome(ingest_staged_call_file(file, stages, options));
    }
    builder.finish()
}
