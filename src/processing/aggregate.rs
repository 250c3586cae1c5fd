//! Per-stage accumulation of canonical records.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::types::{MutationClass, Stage, VariantKind, VariantRecord};

/// Read access shared by per-stage and combined aggregates.
///
/// Ranking and classification are written against this trait so they run over either scope.
pub trait Aggregate {
    /// Mutation count per gene symbol.
    fn gene_counts(&self) -> &BTreeMap<String, u64>;

    /// Mutation count per mutation class.
    fn class_counts(&self) -> &BTreeMap<MutationClass, u64>;

    /// Samples that contributed at least one record.
    fn samples(&self) -> &BTreeSet<String>;

    /// Number of records folded in.
    fn total(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.total() == 0
    }

    fn gene_count(&self, gene_symbol: &str) -> u64 {
        self.gene_counts().get(gene_symbol).copied().unwrap_or(0)
    }

    fn class_count(&self, class: &MutationClass) -> u64 {
        self.class_counts().get(class).copied().unwrap_or(0)
    }
}

/// Counts for one stage.
///
/// The per-gene counts, the per-class counts and `total` always agree: each folded record adds
/// exactly one to each of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageAggregate {
    stage: Stage,
    gene_counts: BTreeMap<String, u64>,
    class_counts: BTreeMap<MutationClass, u64>,
    kind_counts: BTreeMap<VariantKind, u64>,
    samples: BTreeSet<String>,
    total: u64,
}

impl StageAggregate {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            gene_counts: BTreeMap::new(),
            class_counts: BTreeMap::new(),
            kind_counts: BTreeMap::new(),
            samples: BTreeSet::new(),
            total: 0,
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Record count per variant kind (CNV/SNV).
    pub fn kind_counts(&self) -> &BTreeMap<VariantKind, u64> {
        &self.kind_counts
    }

    pub(crate) fn fold(&mut self, record: &VariantRecord) {
        *self
            .gene_counts
            .entry(record.gene_symbol().to_string())
            .or_insert(0) += 1;
        *self
            .class_counts
            .entry(record.mutation_class().clone())
            .or_insert(0) += 1;
        *self.kind_counts.entry(record.variant_kind()).or_insert(0) += 1;
        if !self.samples.contains(record.sample_id()) {
            self.samples.insert(record.sample_id().to_string());
        }
        self.total += 1;
    }

    // Sum of counts commutes, so absorbing partials in any order gives the same result.
    pub(crate) fn absorb(&mut self, other: StageAggregate) {
        for (gene, n) in other.gene_counts {
            *self.gene_counts.entry(gene).or_insert(0) += n;
        }
        for (class, n) in other.class_counts {
            *self.class_counts.entry(class).or_insert(0) += n;
        }
        for (kind, n) in other.kind_counts {
            *self.kind_counts.entry(kind).or_insert(0) += n;
        }
        self.samples.extend(other.samples);
        self.total += other.total;
    }
}

impl Aggregate for StageAggregate {
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

/// Routes records to the aggregate of their stage.
///
/// One aggregator can be used per worker; partial aggregators are combined with
/// [`StageAggregator::merge`] and produce the same result as folding every record into a
/// single aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageAggregator {
    aggregates: BTreeMap<Stage, StageAggregate>,
}

impl StageAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-create empty aggregates so declared stages appear even when nothing is folded in.
    pub fn with_stages<I: IntoIterator<Item = Stage>>(stages: I) -> Self {
        let aggregates = stages
            .into_iter()
            .map(|s| (s.clone(), StageAggregate::new(s)))
            .collect();
        Self { aggregates }
    }

    pub fn fold(&mut self, record: &VariantRecord) {
        self.aggregates
            .entry(record.stage().clone())
            .or_insert_with(|| StageAggregate::new(record.stage().clone()))
            .fold(record);
    }

    pub fn fold_all<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a VariantRecord>,
    {
        for record in records {
            self.fold(record);
        }
    }

    /// Absorb a partial aggregator built from a disjoint share of the input.
    pub fn merge(&mut self, partial: StageAggregator) {
        for (stage, aggregate) in partial.aggregates {
            match self.aggregates.get_mut(&stage) {
                Some(existing) => existing.absorb(aggregate),
                None => {
                    self.aggregates.insert(stage, aggregate);
                }
            }
        }
    }

    pub fn get(&self, stage: &Stage) -> Option<&StageAggregate> {
        self.aggregates.get(stage)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageAggregate> {
        self.aggregates.values()
    }

    /// Freeze the aggregates, keyed by stage.
    pub fn finalize(self) -> BTreeMap<Stage, StageAggregate> {
        self.aggregates
    }
}

#[cfg(test)]
mod tests {
    use super::{Aggregate, StageAggregator};
    use crate::types::{MutationClass, Stage, VariantKind, VariantRecord};

    fn record(sample: &str, stage: &str, gene: &str, class: &str) -> VariantRecord {
        VariantRecord::new(
            sample,
            Stage::new(stage).unwrap(),
            gene,
            VariantKind::Snv,
            MutationClass::new(class),
        )
        .unwrap()
    }

    fn records() -> Vec<VariantRecord> {
        vec![
            record("S1", "Early", "TP53", "missense"),
            record("S1", "Early", "TP53", "missense"),
            record("S2", "Early", "KRAS", "nonsense"),
            record("S3", "Late", "TP53", "silent"),
            record("S3", "Late", "EGFR", "missense"),
        ]
    }

    #[test]
    fn fold_counts_genes_classes_and_samples() {
        let mut agg = StageAggregator::new();
        agg.fold_all(&records());
        let early = agg.get(&Stage::new("Early").unwrap()).unwrap();

        assert_eq!(early.gene_count("TP53"), 2);
        assert_eq!(early.gene_count("KRAS"), 1);
        assert_eq!(early.class_count(&MutationClass::new("missense")), 2);
        assert_eq!(early.total(), 3);
        assert_eq!(early.samples().len(), 2);
        assert_eq!(early.kind_counts()[&VariantKind::Snv], 3);
        assert_eq!(early.gene_counts().values().sum::<u64>(), early.total());
        assert_eq!(early.class_counts().values().sum::<u64>(), early.total());
    }

    #[test]
    fn duplicate_records_are_counted() {
        let mut agg = StageAggregator::new();
        let r = record("S1", "Early", "TP53", "missense");
        agg.fold(&r);
        agg.fold(&r);
        assert_eq!(agg.get(r.stage()).unwrap().gene_count("TP53"), 2);
    }

    #[test]
    fn fold_order_does_not_matter() {
        let all = records();
        let fold = |order: &[usize]| {
            let mut agg = StageAggregator::new();
            agg.fold_all(order.iter().map(|&i| &all[i]));
            agg.finalize()
        };
        let identity: Vec<usize> = (0..all.len()).collect();
        let expected = fold(&identity);

        let mut orders: Vec<Vec<usize>> = Vec::new();
        orders.push(identity.iter().rev().copied().collect());
        for k in 1..all.len() {
            let mut rotated = identity.clone();
            rotated.rotate_left(k);
            orders.push(rotated);
        }
        // Evens then odds, and a fixed shuffle that splits the duplicate pair.
        let (evens, odds): (Vec<usize>, Vec<usize>) = identity.iter().copied().partition(|&i| i % 2 == 0);
        orders.push(evens.into_iter().chain(odds).collect());
        orders.push(vec![3, 0, 4, 2, 1]);

        for order in &orders {
            assert_eq!(fold(order), expected, "order {order:?}");
        }
    }

    #[test]
    fn merged_partials_equal_single_fold() {
        let all = records();
        let mut single = StageAggregator::new();
        single.fold_all(&all);

        let mut left = StageAggregator::new();
        left.fold_all(&all[..2]);
        let mut right = StageAggregator::new();
        right.fold_all(&all[2..]);
        right.merge(left);

        assert_eq!(single.finalize(), right.finalize());
    }

    #[test]
    fn declared_stages_start_empty() {
        let agg = StageAggregator::with_stages([Stage::new("I").unwrap(), Stage::new("II").unwrap()]);
        let stages = agg.finalize();
        assert_eq!(stages.len(), 2);
        assert!(stages.values().all(|a| a.is_empty()));
    }
}
