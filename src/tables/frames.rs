//! polars `DataFrame` views of [`SummaryTables`].

use polars::prelude::*;

use super::SummaryTables;

impl SummaryTables {
    /// `stage, samples, records, genes`
    pub fn stage_summary_frame(&self) -> PolarsResult<DataFrame> {
        let rows = &self.stage_summary;
        df!(
            "stage" => rows.iter().map(|r| r.stage.clone()).collect::<Vec<_>>(),
            "samples" => rows.iter().map(|r| r.samples as u64).collect::<Vec<_>>(),
            "records" => rows.iter().map(|r| r.records).collect::<Vec<_>>(),
            "genes" => rows.iter().map(|r| r.genes as u64).collect::<Vec<_>>(),
        )
    }

    /// `scope, gene_symbol, count`
    pub fn gene_counts_frame(&self) -> PolarsResult<DataFrame> {
        let rows = &self.gene_counts;
        df!(
            "scope" => rows.iter().map(|r| r.scope.clone()).collect::<Vec<_>>(),
            "gene_symbol" => rows.iter().map(|r| r.gene_symbol.clone()).collect::<Vec<_>>(),
            "count" => rows.iter().map(|r| r.count).collect::<Vec<_>>(),
        )
    }

    /// `gene_symbol, stage, count`
    pub fn gene_stage_frame(&self) -> PolarsResult<DataFrame> {
        let rows = &self.gene_stage_breakdown;
        df!(
            "gene_symbol" => rows.iter().map(|r| r.gene_symbol.clone()).collect::<Vec<_>>(),
            "stage" => rows.iter().map(|r| r.stage.clone()).collect::<Vec<_>>(),
            "count" => rows.iter().map(|r| r.count).collect::<Vec<_>>(),
        )
    }

    /// `scope, n, rank, gene_symbol, count`
    pub fn rankings_frame(&self) -> PolarsResult<DataFrame> {
        let rows = &self.rankings;
        df!(
            "scope" => rows.iter().map(|r| r.scope.clone()).collect::<Vec<_>>(),
            "n" => rows.iter().map(|r| r.n as u64).collect::<Vec<_>>(),
            "rank" => rows.iter().map(|r| r.rank as u64).collect::<Vec<_>>(),
            "gene_symbol" => rows.iter().map(|r| r.gene_symbol.clone()).collect::<Vec<_>>(),
            "count" => rows.iter().map(|r| r.count).collect::<Vec<_>>(),
        )
    }

    /// `scope, mutation_class, count, proportion`
    pub fn class_distribution_frame(&self) -> PolarsResult<DataFrame> {
        let rows = &self.class_distribution;
        df!(
            "scope" => rows.iter().map(|r| r.scope.clone()).collect::<Vec<_>>(),
            "mutation_class" => rows.iter().map(|r| r.mutation_class.clone()).collect::<Vec<_>>(),
            "count" => rows.iter().map(|r| r.count).collect::<Vec<_>>(),
            "proportion" => rows.iter().map(|r| r.proportion).collect::<Vec<_>>(),
        )
    }

    /// `scope, count, mean, std, min, 25%, 50%, 75%, max`
    pub fn segment_stats_frame(&self) -> PolarsResult<DataFrame> {
        let rows = &self.segment_stats;
        df!(
            "scope" => rows.iter().map(|r| r.scope.clone()).collect::<Vec<_>>(),
            "count" => rows.iter().map(|r| r.stats.count as u64).collect::<Vec<_>>(),
            "mean" => rows.iter().map(|r| r.stats.mean).collect::<Vec<_>>(),
            "std" => rows.iter().map(|r| r.stats.std).collect::<Vec<_>>(),
            "min" => rows.iter().map(|r| r.stats.min).collect::<Vec<_>>(),
            "25%" => rows.iter().map(|r| r.stats.p25).collect::<Vec<_>>(),
            "50%" => rows.iter().map(|r| r.stats.p50).collect::<Vec<_>>(),
            "75%" => rows.iter().map(|r| r.stats.p75).collect::<Vec<_>>(),
            "max" => rows.iter().map(|r| r.stats.max).collect::<Vec<_>>(),
        )
    }

    /// `source, row, reason, detail`
    pub fn errors_frame(&self) -> PolarsResult<DataFrame> {
        let rows = &self.errors;
        df!(
            "source" => rows.iter().map(|e| e.source().to_string()).collect::<Vec<_>>(),
            "row" => rows.iter().map(|e| e.row().map(|r| r as u64)).collect::<Vec<_>>(),
            "reason" => rows.iter().map(|e| e.reason().as_str().to_string()).collect::<Vec<_>>(),
            "detail" => rows.iter().map(|e| e.detail().to_string()).collect::<Vec<_>>(),
        )
    }

    /// Every table as a named frame, in a stable order.
    pub fn frames(&self) -> PolarsResult<Vec<(&'static str, DataFrame)>> {
        Ok(vec![
            ("stage_summary", self.stage_summary_frame()?),
            ("gene_counts", self.gene_counts_frame()?),
            ("gene_stage_breakdown", self.gene_stage_frame()?),
            ("rankings", self.rankings_frame()?),
            ("class_distribution", self.class_distribution_frame()?),
            ("segment_stats", self.segment_stats_frame()?),
            ("errors", self.errors_frame()?),
        ])
    }
}
