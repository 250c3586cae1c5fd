//! Aggregation, merge, ranking and classification over canonical records.
//!
//! The processing layer operates on [`crate::types::VariantRecord`] values produced by
//! ingestion. Everything here is in-memory and deterministic:
//!
//! - [`StageAggregator`]: folds records into one [`StageAggregate`] per stage
//! - [`merge()`]: combines stage aggregates into a [`CombinedAggregate`]
//! - [`top_n()`]: most mutated genes of any [`Aggregate`]
//! - [`distribution()`]: mutation-class proportions of any [`Aggregate`]
//! - [`SegmentMeanStats`]: summary statistics for copy-number segment means
//!
//! ## Example: fold → merge → rank
//!
//! ```rust
//! use cohort_variant_summary::processing::{distribution, merge, top_n, Aggregate, StageAggregator};
//! use cohort_variant_summary::types::{MutationClass, Stage, VariantKind, VariantRecord};
//!
//! let early = Stage::new("Early").unwrap();
//! let late = Stage::new("Late").unwrap();
//! let rec = |stage: &Stage, gene: &str| {
//!     VariantRecord::new("S1", stage.clone(), gene, VariantKind::Snv, MutationClass::new("missense"))
//!         .unwrap()
//! };
//!
//! let mut aggregator = StageAggregator::new();
//! aggregator.fold_all(&[rec(&early, "TP53"), rec(&early, "TP53"), rec(&late, "TP53"), rec(&late, "KRAS")]);
//! let stages = aggregator.finalize();
//!
//! let combined = merge(stages.values());
//! assert_eq!(combined.gene_count("TP53"), 3);
//! assert_eq!(top_n(&combined, 1).pairs(), vec![("TP53", 3)]);
//! assert_eq!(distribution(&combined).len(), 1);
//! ```

pub mod aggregate;
pub mod classify;
pub mod merge;
pub mod rank;
pub mod segments;

pub use aggregate::{Aggregate, StageAggregate, StageAggregator};
pub use classify::{distribution, ClassDistribution, ClassShare};
pub use merge::{merge, CombinedAggregate};
pub use rank::{top_n, top_n_with_stages, GeneCount, RankedGene, RankingResult};
pub use segments::SegmentMeanStats;
