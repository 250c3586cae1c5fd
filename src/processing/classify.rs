//! Mutation-class distribution.

use serde::Serialize;

use crate::types::MutationClass;

use super::aggregate::Aggregate;

/// One class and its share of the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassShare {
    pub mutation_class: MutationClass,
    pub count: u64,
    pub proportion: f64,
}

/// Class shares ordered by descending count, ties by ascending class name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassDistribution {
    total: u64,
    shares: Vec<ClassShare>,
}

impl ClassDistribution {
    /// Record count the proportions are relative to.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn shares(&self) -> &[ClassShare] {
        &self.shares
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn proportion(&self, class: &MutationClass) -> Option<f64> {
        self.shares
            .iter()
            .find(|s| &s.mutation_class == class)
            .map(|s| s.proportion)
    }
}

/// Proportion of each mutation class in `aggregate`.
///
/// An aggregate without records gives an empty distribution.
pub fn distribution<A: Aggregate + ?Sized>(aggregate: &A) -> ClassDistribution {
    let total: u64 = aggregate.class_counts().values().sum();
    if total == 0 {
        return ClassDistribution::default();
    }
    let denominator = total as f64;
    let mut shares: Vec<ClassShare> = aggregate
        .class_counts()
        .iter()
        .map(|(class, &count)| ClassShare {
            mutation_class: class.clone(),
            count,
            proportion: count as f64 / denominator,
        })
        .collect();
    shares.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.mutation_class.cmp(&b.mutation_class))
    });
    ClassDistribution { total, shares }
}

#[cfg(test)]
mod tests {
    use super::distribution;
    use crate::processing::aggregate::{StageAggregate, StageAggregator};
    use crate::types::{MutationClass, Stage, VariantKind, VariantRecord};

    #[test]
    fn proportions_sum_to_one() {
        let mut agg = StageAggregator::new();
        let classes = ["missense", "missense", "missense", "nonsense", "silent", "OTHER", "missense"];
        for (i, class) in classes.iter().enumerate() {
            let r = VariantRecord::new(
                format!("S{i}"),
                Stage::new("Early").unwrap(),
                "TP53",
                VariantKind::Snv,
                MutationClass::new(*class),
            )
            .unwrap();
            agg.fold(&r);
        }
        let early = agg.get(&Stage::new("Early").unwrap()).unwrap();
        let dist = distribution(early);

        assert_eq!(dist.total(), 7);
        assert_eq!(dist.len(), 4);
        assert_eq!(dist.shares()[0].mutation_class, MutationClass::new("missense"));
        assert!((dist.proportion(&MutationClass::new("missense")).unwrap() - 4.0 / 7.0).abs() < 1e-12);
        let sum: f64 = dist.shares().iter().map(|s| s.proportion).sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_aggregate_has_empty_distribution() {
        let empty = StageAggregate::new(Stage::new("Early").unwrap());
        let dist = distribution(&empty);
        assert!(dist.is_empty());
        assert_eq!(dist.total(), 0);
    }
}
