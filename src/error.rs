use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type for ingestion and configuration operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by parsing, normalization and configuration functions.
///
/// Errors raised while processing a single input file never escape the file boundary: the
/// batch layer converts them into [`ErrorEntry`] values via [`IngestionError::reason_code`].
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited-text decoding error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration could not be (de)serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The worker pool could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The input does not match the configured column map (missing header columns, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be parsed into the type its column requires.
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// A row ended before a required column.
    #[error("row {row} has {found} fields but column '{column}' is at position {expected}")]
    ShortRow {
        row: usize,
        column: String,
        found: usize,
        expected: usize,
    },

    /// A decoded row lacks a key field after trimming.
    #[error("missing key field '{field}'")]
    MissingKeyField { field: &'static str },

    /// The input has no data rows.
    #[error("input has no data rows")]
    EmptyInput,

    /// No call-file format was configured and none could be inferred from the path.
    #[error("cannot infer call file format for path ({path})")]
    UnknownFormat { path: String },

    /// A stage label is not part of the configured stage set.
    #[error("unknown stage label '{label}'")]
    UnknownStage { label: String },

    /// Invalid configuration value.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl IngestionError {
    /// Classify this error into the fixed failure taxonomy.
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            IngestionError::Csv(err) => match err.kind() {
                csv::ErrorKind::Io(_) => ReasonCode::UnreadableFile,
                _ => ReasonCode::MalformedRow,
            },
            IngestionError::ParseError { .. } | IngestionError::ShortRow { .. } => {
                ReasonCode::MalformedRow
            }
            IngestionError::MissingKeyField { .. } => ReasonCode::MissingKeyField,
            IngestionError::EmptyInput => ReasonCode::EmptyFile,
            IngestionError::Io(_)
            | IngestionError::Json(_)
            | IngestionError::ThreadPool(_)
            | IngestionError::SchemaMismatch { .. }
            | IngestionError::UnknownFormat { .. }
            | IngestionError::UnknownStage { .. }
            | IngestionError::Config { .. } => ReasonCode::UnreadableFile,
        }
    }

    /// Returns `true` if the error was caused by the filesystem rather than the file content.
    pub fn is_io(&self) -> bool {
        match self {
            IngestionError::Io(_) => true,
            IngestionError::Csv(err) => matches!(err.kind(), csv::ErrorKind::Io(_)),
            _ => false,
        }
    }

    /// 1-based line number the error refers to, when known.
    pub fn row(&self) -> Option<usize> {
        match self {
            IngestionError::ParseError { row, .. } | IngestionError::ShortRow { row, .. } => {
                Some(*row)
            }
            IngestionError::Csv(err) => err.position().map(|p| p.line() as usize),
            _ => None,
        }
    }
}

/// Fixed taxonomy of recoverable input failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// File missing or undecodable.
    UnreadableFile,
    /// File has zero data rows.
    EmptyFile,
    /// Row fails structural decode.
    MalformedRow,
    /// Row decodes but lacks `sample_id` or `gene_symbol`.
    MissingKeyField,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::UnreadableFile => "UNREADABLE_FILE",
            ReasonCode::EmptyFile => "EMPTY_FILE",
            ReasonCode::MalformedRow => "MALFORMED_ROW",
            ReasonCode::MissingKeyField => "MISSING_KEY_FIELD",
        }
    }

    /// File-level reasons mean the whole file contributed nothing.
    pub fn is_file_level(&self) -> bool {
        matches!(self, ReasonCode::UnreadableFile | ReasonCode::EmptyFile)
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rejected file or row.
///
/// Entries are append-only: they are created while a file is parsed and normalized and are
/// never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    source: String,
    reason: ReasonCode,
    detail: String,
    row: Option<usize>,
}

impl ErrorEntry {
    /// Create an entry for `source` (usually the input path).
    pub fn new(source: impl Into<String>, reason: ReasonCode, detail: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            reason,
            detail: detail.into(),
            row: None,
        }
    }

    /// Build an entry from an error, classifying it with [`IngestionError::reason_code`].
    pub fn from_error(source: impl Into<String>, error: &IngestionError) -> Self {
        Self {
            source: source.into(),
            reason: error.reason_code(),
            detail: error.to_string(),
            row: error.row(),
        }
    }

    /// Attach the 1-based line number of the rejected row.
    pub fn at_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn reason(&self) -> ReasonCode {
        self.reason
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn row(&self) -> Option<usize> {
        self.row
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "{}:{}\t{}\t{}", self.source, row, self.reason, self.detail),
            None => write!(f, "{}\t{}\t{}", self.source, self.reason, self.detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorEntry, IngestionError, ReasonCode};

    #[test]
    fn reason_codes_cover_taxonomy() {
        let io = IngestionError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.reason_code(), ReasonCode::UnreadableFile);
        assert!(io.is_io());

        assert_eq!(IngestionError::EmptyInput.reason_code(), ReasonCode::EmptyFile);
        assert_eq!(
            IngestionError::MissingKeyField { field: "gene_symbol" }.reason_code(),
            ReasonCode::MissingKeyField
        );
        let short = IngestionError::ShortRow {
            row: 4,
            column: "Hugo_Symbol".to_string(),
            found: 1,
            expected: 3,
        };
        assert_eq!(short.reason_code(), ReasonCode::MalformedRow);
        assert_eq!(short.row(), Some(4));
        assert!(!short.is_io());
    }

    #[test]
    fn entry_from_error_keeps_row_and_message() {
        let err = IngestionError::ParseError {
            row: 7,
            column: "copy_number".to_string(),
            raw: "abc".to_string(),
            message: "invalid float literal".to_string(),
        };
        let entry = ErrorEntry::from_error("s1.tsv", &err);
        assert_eq!(entry.reason(), ReasonCode::MalformedRow);
        assert_eq!(entry.row(), Some(7));
        assert!(entry.detail().contains("column 'copy_number'"));
        assert_eq!(entry.to_string().split('\t').nth(1), Some("MALFORMED_ROW"));
    }

    #[test]
    fn reason_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ReasonCode::MissingKeyField).unwrap();
        assert_eq!(json, "\"MISSING_KEY_FIELD\"");
        assert!(ReasonCode::EmptyFile.is_file_level());
        assert!(!ReasonCode::MalformedRow.is_file_level());
    }
}
