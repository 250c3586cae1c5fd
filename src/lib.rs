//! `cohort-variant-summary` ingests per-sample variant-call files (Copy Number Variation and
//! Simple Nucleotide Variation) from the stages of a cohort study and consolidates them into
//! summary tables: per-stage gene-mutation counts, a combined cross-stage view, top-N gene
//! rankings and mutation-class distributions.
//!
//! The primary entrypoints are [`execution::SummaryEngine::run`] (parallel) and
//! [`execution::summarize`] (sequential). Both return a [`execution::BatchSummary`] and never
//! fail: every unreadable file and every bad row becomes an [`error::ErrorEntry`] in the run's
//! error log while the remaining input is still aggregated.
//!
//! ## What you can ingest
//!
//! **Call files (format inferred from the file name):**
//!
//! - **MAF** (`*.maf`, `Simple_Nucleotide_Variation`): SNV calls, `#` comment lines skipped
//! - **Gene-level copy number** (`gene_level_copy_number`): CNV calls derived from the copy number
//! - **Copy-number segments** (`Copy_Number_Variation`, `*.seg`): segment means, summarized per stage
//!
//! Any other delimited layout can be read by passing a custom [`ingestion::ParserConfig`]
//! (`delimiter`, `has_header` and a column map).
//!
//! **Failure taxonomy ([`error::ReasonCode`]):**
//!
//! - `UNREADABLE_FILE`: missing file, undecodable header, unknown format
//! - `EMPTY_FILE`: no data rows
//! - `MALFORMED_ROW`: a row that cannot be decoded
//! - `MISSING_KEY_FIELD`: a row without sample or gene after trimming
//!
//! ## Quick example: summarize a batch
//!
//! ```no_run
//! use cohort_variant_summary::config::SummaryConfig;
//! use cohort_variant_summary::execution::SummaryEngine;
//! use cohort_variant_summary::tables::SummaryTables;
//!
//! # fn main() -> Result<(), cohort_variant_summary::IngestionError> {
//! let cfg = SummaryConfig::from_path("run.json")?;
//! let files = vec![
//!     cfg.call_file("Early/S01.Simple_Nucleotide_Variation.maf", "IA", "S01")?,
//!     cfg.call_file("Late/S02.gene_level_copy_number.tsv", "IV", "S02")?,
//! ];
//!
//! let engine = SummaryEngine::new(cfg.execution_options())?;
//! let summary = engine.run_with_stages(&files, &cfg.stages, &cfg.ingestion_options());
//!
//! for entry in summary.errors().entries() {
//!     eprintln!("{entry}");
//! }
//! let tables = SummaryTables::build(&summary, &cfg.top_n);
//! println!("{}", tables.to_json()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: parsing, normalization, error collection and observers
//! - [`processing`]: stage aggregation, cross-stage merge, ranking, classification
//! - [`execution`]: the batch pipeline (parallel engine and sequential `summarize`)
//! - [`config`]: JSON run configuration
//! - [`tables`]: flat output tables (and polars frames with the `frames` feature)
//! - [`types`]: canonical record model
//! - [`error`]: error types and the failure taxonomy

pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod processing;
pub mod tables;
pub mod types;

pub use error::{ErrorEntry, IngestionError, IngestionResult, ReasonCode};
