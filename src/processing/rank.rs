//! Top-N gene ranking.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::Stage;

use super::aggregate::Aggregate;
use super::merge::CombinedAggregate;

/// One ranked gene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneCount {
    pub gene_symbol: String,
    pub count: u64,
}

/// Genes ordered by descending count, ties by ascending gene symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RankingResult {
    genes: Vec<GeneCount>,
}

impl RankingResult {
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn as_slice(&self) -> &[GeneCount] {
        &self.genes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeneCount> {
        self.genes.iter()
    }

    /// `(gene_symbol, count)` pairs.
    pub fn pairs(&self) -> Vec<(&str, u64)> {
        self.genes
            .iter()
            .map(|g| (g.gene_symbol.as_str(), g.count))
            .collect()
    }
}

impl<'a> IntoIterator for &'a RankingResult {
    type Item = &'a GeneCount;
    type IntoIter = std::slice::Iter<'a, GeneCount>;

    fn into_iter(self) -> Self::IntoIter {
        self.genes.iter()
    }
}

/// A ranked gene with the stages that contributed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedGene {
    pub gene_symbol: String,
    pub count: u64,
    pub stages: BTreeMap<Stage, u64>,
}

/// The `n` most mutated genes of `aggregate`.
///
/// `n == 0` gives an empty result; fewer than `n` distinct genes gives all of them.
pub fn top_n<A: Aggregate + ?Sized>(aggregate: &A, n: usize) -> RankingResult {
    if n == 0 {
        return RankingResult::default();
    }
    let mut entries: Vec<(&String, u64)> = aggregate
        .gene_counts()
        .iter()
        .map(|(gene, &count)| (gene, count))
        .collect();

    if n < entries.len() {
        entries.select_nth_unstable_by(n - 1, rank_order);
        entries.truncate(n);
    }
    entries.sort_unstable_by(rank_order);

    RankingResult {
        genes: entries
            .into_iter()
            .map(|(gene, count)| GeneCount {
                gene_symbol: gene.clone(),
                count,
            })
            .collect(),
    }
}

/// [`top_n`] over a combined aggregate, with each gene's stage breakdown attached.
pub fn top_n_with_stages(combined: &CombinedAggregate, n: usize) -> Vec<RankedGene> {
    top_n(combined, n)
        .genes
        .into_iter()
        .map(|g| RankedGene {
            stages: combined
                .stage_breakdown(&g.gene_symbol)
                .cloned()
                .unwrap_or_default(),
            gene_symbol: g.gene_symbol,
            count: g.count,
        })
        .collect()
}

// Gene symbols are unique map keys, so this is a total order.
fn rank_order(a: &(&String, u64), b: &(&String, u64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}
