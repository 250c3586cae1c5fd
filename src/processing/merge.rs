//! Cross-stage merge.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::types::{MutationClass, Stage, VariantKind};

use super::aggregate::{Aggregate, StageAggregate};

/// Counts spanning every stage, with each gene's per-stage provenance kept.
///
/// For every gene and class the combined count is the sum of the stage counts it was merged
/// from, and `stage_breakdown(gene)` sums to `gene_count(gene)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CombinedAggregate {
    gene_counts: BTreeMap<String, u64>,
    class_counts: BTreeMap<MutationClass, u64>,
    kind_counts: BTreeMap<VariantKind, u64>,
    samples: BTreeSet<String>,
    total: u64,
    gene_stage_counts: BTreeMap<String, BTreeMap<Stage, u64>>,
    stage_totals: BTreeMap<Stage, u64>,
}

impl CombinedAggregate {
    /// Per-stage counts for one gene.
    pub fn stage_breakdown(&self, gene_symbol: &str) -> Option<&BTreeMap<Stage, u64>> {
        self.gene_stage_counts.get(gene_symbol)
    }

    /// Gene → stage → count for every gene.
    pub fn gene_stage_counts(&self) -> &BTreeMap<String, BTreeMap<Stage, u64>> {
        &self.gene_stage_counts
    }

    /// Records contributed by each merged stage, including stages that contributed none.
    pub fn stage_totals(&self) -> &BTreeMap<Stage, u64> {
        &self.stage_totals
    }

    pub fn kind_counts(&self) -> &BTreeMap<VariantKind, u64> {
        &self.kind_counts
    }

    fn add_stage(&mut self, stage: &StageAggregate) {
        for (gene, &n) in stage.gene_counts() {
            *self.gene_counts.entry(gene.clone()).or_insert(0) += n;
            *self
                .gene_stage_counts
                .entry(gene.clone())
                .or_default()
                .entry(stage.stage().clone())
                .or_insert(0) += n;
        }
        for (class, &n) in stage.class_counts() {
            *self.class_counts.entry(class.clone()).or_insert(0) += n;
        }
        for (&kind, &n) in stage.kind_counts() {
            *self.kind_counts.entry(kind).or_insert(0) += n;
        }
        self.samples.extend(stage.samples().iter().cloned());
        self.total += stage.total();
        *self.stage_totals.entry(stage.stage().clone()).or_insert(0) += stage.total();
    }
}

impl Aggregate for CombinedAggregate {
    fn gene_counts(&self) -> &BTreeMap<String, u64> {
        &self.gene_counts
    }

    fn class_counts(&self) -> &BTreeMap<MutationClass, u64> {
        &self.class_counts
    }

    fn samples(&self) -> &BTreeSet<String> {
        &self.samples
    }

    fn total(&self) -> u64 {
        self.total
    }
}

/// Combine finalized stage aggregates into one.
///
/// Inputs are only read, so ranking and classification can be re-run over the same stage
/// aggregates afterwards.
pub fn merge<'a, I>(stages: I) -> CombinedAggregate
where
    I: IntoIterator<Item = &'a StageAggregate>,
{
    let mut combined = CombinedAggregate::default();
    for stage in stages {
        combined.add_stage(stage);
    }
    combined
}
