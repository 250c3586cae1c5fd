//! Per-file ingestion: parsing, normalization and failure accounting.
//!
//! Most callers should use [`ingest_call_file`] (from [`unified`]) which:
//!
//! - picks a parser preset from the file's [`CallFileFormat`] (inferred from the file name when
//!   not given)
//! - turns every row into a canonical [`crate::types::VariantRecord`] or an
//!   [`crate::error::ErrorEntry`]
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! The building blocks are also public:
//! - [`csv`]: delimited-text decoding driven by a [`ParserConfig`]
//! - [`normalize`]: raw row → record
//! - [`collector`]: the run's error log

pub mod collector;
pub mod config;
pub mod csv;
pub mod normalize;
pub mod observability;
pub mod unified;
pub mod vocabulary;

pub use collector::ErrorCollector;
pub use config::{ColumnMap, ColumnRef, Field, FileContent, ParserConfig};
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    StdErrObserver,
};
pub use unified::{ingest_call_file, ingest_staged_call_file, CallFile, CallFileFormat, FileOutcome, IngestionOptions};
pub use vocabulary::Vocabulary;
