//! Flat output tables for the report layer.
//!
//! [`SummaryTables::build`] flattens a [`BatchSummary`] into row-oriented tables that a workbook
//! or chart renderer can write out without further computation. Every table is plain
//! `Vec<Row>` with `serde::Serialize` rows; with the `frames` feature each table can also be
//! handed over as a polars `DataFrame`.

#[cfg(feature = "frames")]
mod frames;

use serde::Serialize;

use crate::error::{ErrorEntry, IngestionResult};
use crate::execution::BatchSummary;
use crate::processing::{distribution, top_n, Aggregate, SegmentMeanStats};

/// Scope label used for rows that describe the combined aggregate. No stage may use it.
pub const COMBINED_SCOPE: &str = "combined";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSummaryRow {
    pub stage: String,
    pub samples: usize,
    pub records: u64,
    pub genes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneCountRow {
    /// Stage label or [`COMBINED_SCOPE`].
    pub scope: String,
    pub gene_symbol: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneStageRow {
    pub gene_symbol: String,
    pub stage: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingRow {
    pub scope: String,
    pub n: usize,
    /// 1-based position in the ranking.
    pub rank: usize,
    pub gene_symbol: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassShareRow {
    pub scope: String,
    pub mutation_class: String,
    pub count: u64,
    pub proportion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentStatsRow {
    pub scope: String,
    #[serde(flatten)]
    pub stats: SegmentMeanStats,
}

/// Every output table of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTables {
    pub stage_summary: Vec<StageSummaryRow>,
    /// Per-stage gene counts followed by the combined counts.
    pub gene_counts: Vec<GeneCountRow>,
    pub gene_stage_breakdown: Vec<GeneStageRow>,
    pub rankings: Vec<RankingRow>,
    pub class_distribution: Vec<ClassShareRow>,
    pub segment_stats: Vec<SegmentStatsRow>,
    pub errors: Vec<ErrorEntry>,
}

impl SummaryTables {
    /// Flatten `summary`, producing one ranking per aggregate for every value in `top_ns`.
    ///
    /// Stages come in stage order and the combined scope always comes last.
    pub fn build(summary: &BatchSummary, top_ns: &[usize]) -> Self {
        let mut tables = SummaryTables::default();
        let combined = summary.combined();

        for (stage, agg) in summary.stages() {
            tables.stage_summary.push(StageSummaryRow {
                stage: stage.to_string(),
                samples: agg.samples().len(),
                records: agg.total(),
                genes: agg.gene_counts().len(),
            });
            tables.push_scope(stage.as_str(), agg, top_ns);
        }
        tables.push_scope(COMBINED_SCOPE, combined, top_ns);

        for (gene, stages) in combined.gene_stage_counts() {
            for (stage, &count) in stages {
                tables.gene_stage_breakdown.push(GeneStageRow {
                    gene_symbol: gene.clone(),
                    stage: stage.to_string(),
                    count,
                });
            }
        }

        for (stage, stats) in summary.segment_stats() {
            tables.segment_stats.push(SegmentStatsRow {
                scope: stage.to_string(),
                stats: stats.clone(),
            });
        }
        if let Some(stats) = summary.overall_segment_stats() {
            tables.segment_stats.push(SegmentStatsRow {
                scope: COMBINED_SCOPE.to_string(),
                stats: stats.clone(),
            });
        }

        tables.errors = summary.errors().entries().to_vec();
        tables
    }

    /// Pretty-printed JSON of all tables.
    pub fn to_json(&self) -> IngestionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn push_scope<A: Aggregate + ?Sized>(&mut self, scope: &str, agg: &A, top_ns: &[usize]) {
        for (gene, &count) in agg.gene_counts() {
            self.gene_counts.push(GeneCountRow {
                scope: scope.to_string(),
                gene_symbol: gene.clone(),
                count,
            });
        }
        for &n in top_ns {
            for (i, g) in top_n(agg, n).iter().enumerate() {
                self.rankings.push(RankingRow {
                    scope: scope.to_string(),
                    n,
                    rank: i + 1,
                    gene_symbol: g.gene_symbol.clone(),
                    count: g.count,
                });
            }
        }
        for share in distribution(agg).shares() {
            self.class_distribution.push(ClassShareRow {
                scope: scope.to_string(),
                mutation_class: share.mutation_class.to_string(),
                count: share.count,
                proportion: share.proportion,
            });
        }
    }
}
