//! Unified per-file ingestion entrypoint.
//!
//! Most callers should use [`ingest_call_file`], which parses and normalizes one
//! [`CallFile`] into a [`FileOutcome`]:
//!
//! - If neither the file nor [`IngestionOptions::format`] names a format, it is inferred from
//!   the file name (GDC naming conventions).
//! - Nothing is ever returned as an error. File-level and row-level failures become
//!   [`ErrorEntry`] values in the outcome and the file contributes whatever rows survived.
//! - If an [`super::observability::IngestionObserver`] is provided, success/failure/alerts are
//!   reported to it.
//!
//! [`ingest_staged_call_file`] additionally resolves the file's stage label through a
//! [`StageSet`] first, so subtype labels land in their declared stage.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorEntry, IngestionError, IngestionResult, ReasonCode};
use crate::types::{Stage, StageSet, VariantRecord};

use super::config::{FileContent, ParserConfig};
use super::csv;
use super::normalize::{RecordContext, normalize};
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::vocabulary::Vocabulary;

/// Supported call-file layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallFileFormat {
    /// Mutation Annotation Format (SNV calls).
    Maf,
    /// Gene-level copy number table (CNV calls derived from copy number).
    GeneCopyNumber,
    /// Copy-number segment table (segment means only).
    CopyNumberSegments,
}

impl CallFileFormat {
    /// Infer the format from a file name.
    ///
    /// - `Simple_Nucleotide_Variation` or a `.maf` extension → [`Self::Maf`]
    /// - `gene_level_copy_number` → [`Self::GeneCopyNumber`]
    /// - `Copy_Number_Variation`, `segment` or a `.seg` extension → [`Self::CopyNumberSegments`]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.contains("simple_nucleotide_variation") || lower.ends_with(".maf") {
            Some(Self::Maf)
        } else if lower.contains("gene_level_copy_number") {
            Some(Self::GeneCopyNumber)
        } else if lower.contains("copy_number_variation")
            || lower.contains("segment")
            || lower.ends_with(".seg")
            || lower.contains(".seg.")
        {
            Some(Self::CopyNumberSegments)
        } else {
            None
        }
    }

    /// Default parser configuration for this format.
    pub fn parser_config(self) -> ParserConfig {
        match self {
            Self::Maf => ParserConfig::maf(),
            Self::GeneCopyNumber => ParserConfig::gene_level_copy_number(),
            Self::CopyNumberSegments => ParserConfig::copy_number_segments(),
        }
    }
}

/// One input file together with the stage and sample it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFile {
    pub path: PathBuf,
    pub stage: Stage,
    pub sample_id: String,
    /// Overrides [`IngestionOptions::format`] and name-based inference.
    pub format: Option<CallFileFormat>,
}

impl CallFile {
    pub fn new(path: impl AsRef<Path>, stage: Stage, sample_id: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            stage,
            sample_id: sample_id.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: CallFileFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Identifier used in error entries.
    pub fn source(&self) -> String {
        self.path.display().to_string()
    }
}

/// Options controlling per-file ingestion.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Format for files that do not carry one. If `None`, inferred from the file name.
    pub format: Option<CallFileFormat>,
    /// Replaces the format's preset parser configuration for every file.
    pub parser: Option<ParserConfig>,
    /// Controlled mutation-class vocabulary.
    pub vocabulary: Arc<Vocabulary>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("parser", &self.parser)
            .field("vocabulary_classes", &self.vocabulary.len())
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            parser: None,
            vocabulary: Arc::new(Vocabulary::default()),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Result of ingesting one file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub source: String,
    pub stage: Stage,
    /// Normalized records, in file order.
    pub records: Vec<VariantRecord>,
    pub segment_means: Vec<f64>,
    /// Rows that were not variant calls (copy-neutral, uncalled, blank segment mean).
    pub skipped_rows: usize,
    /// Error entries in the order they were produced.
    pub errors: Vec<ErrorEntry>,
}

impl FileOutcome {
    fn empty(file: &CallFile) -> Self {
        Self {
            source: file.source(),
            stage: file.stage.clone(),
            records: Vec::new(),
            segment_means: Vec::new(),
            skipped_rows: 0,
            errors: Vec::new(),
        }
    }

    /// `true` if the file failed as a whole and contributed nothing.
    pub fn is_file_failure(&self) -> bool {
        self.errors.iter().any(|e| e.reason().is_file_level())
    }
}

/// Parse and normalize one call file.
///
/// When an observer is configured, this function reports:
///
/// - `on_failure` for every error entry, with a computed severity
/// - `on_alert` for entries whose severity is >= `options.alert_at_or_above`
/// - `on_success` when the file itself was readable, with record/row stats
///
/// # Examples
///
/// ```no_run
/// use cohort_variant_summary::ingestion::{ingest_call_file, CallFile, IngestionOptions};
/// use cohort_variant_summary::types::Stage;
///
/// # fn main() -> Result<(), cohort_variant_summary::IngestionError> {
/// let file = CallFile::new(
///     "Early/S01/S01.Simple_Nucleotide_Variation.maf",
///     Stage::new("Early")?,
///     "S01",
/// );
/// let outcome = ingest_call_file(&file, &IngestionOptions::default());
/// println!("records={} errors={}", outcome.records.len(), outcome.errors.len());
/// # Ok(())
/// # }
/// ```
pub fn ingest_call_file(file: &CallFile, options: &IngestionOptions) -> FileOutcome {
    let format = file.format.or(options.format).or_else(|| {
        file.path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(CallFileFormat::from_file_name)
    });
    let ctx = IngestionContext {
        path: file.path.clone(),
        format,
        stage: file.stage.clone(),
        sample_id: file.sample_id.clone(),
    };

    let mut outcome = FileOutcome::empty(file);
    let config = match resolve_config(file, format, options) {
        Ok(config) => config,
        Err(e) => {
            report_file_failure(&mut outcome, &ctx, options, &e);
            return outcome;
        }
    };

    let parsed = match csv::parse_call_file_from_path(&file.path, &config) {
        Ok(parsed) => parsed,
        Err(e) => {
            report_file_failure(&mut outcome, &ctx, options, &e);
            return outcome;
        }
    };

    let mut rejected_rows = 0usize;
    for rejection in &parsed.rejected {
        rejected_rows += 1;
        let entry = ErrorEntry::from_error(&outcome.source, &rejection.error).at_row(rejection.row);
        push_entry(&mut outcome, &ctx, options, severity_for_error(&rejection.error), entry);
    }

    if let FileContent::Calls(variant_kind) = config.content {
        let record_ctx = RecordContext {
            stage: &file.stage,
            sample_id: &file.sample_id,
            variant_kind,
            neutral_copy_number: config.neutral_copy_number,
        };
        for raw in &parsed.calls {
            match normalize(raw, &record_ctx, &options.vocabulary) {
                Ok(Some(record)) => outcome.records.push(record),
                Ok(None) => outcome.skipped_rows += 1,
                Err(e) => {
                    rejected_rows += 1;
                    let entry = ErrorEntry::from_error(&outcome.source, &e).at_row(raw.row);
                    push_entry(&mut outcome, &ctx, options, severity_for_error(&e), entry);
                }
            }
        }
    }
    outcome.segment_means = parsed.segment_means;
    outcome.skipped_rows += parsed.skipped_rows;

    if let Some(obs) = options.observer.as_ref() {
        obs.on_success(
            &ctx,
            IngestionStats {
                records: outcome.records.len(),
                segment_values: outcome.segment_means.len(),
                rejected_rows,
                skipped_rows: outcome.skipped_rows,
            },
        );
    }
    outcome
}

/// Like [`ingest_call_file`], but the file's stage label is first resolved through `stages`
/// (case-insensitive, aliases included).
///
/// A label the set does not declare makes the whole file one `UNREADABLE_FILE` entry. An empty
/// set accepts every label as-is.
pub fn ingest_staged_call_file(file: &CallFile, stages: &StageSet, options: &IngestionOptions) -> FileOutcome {
    match stages.resolve(file.stage.as_str()) {
        Ok(stage) if stage == file.stage => ingest_call_file(file, options),
        Ok(stage) => ingest_call_file(
            &CallFile {
                stage,
                ..file.clone()
            },
            options,
        ),
        Err(e) => {
            let ctx = IngestionContext {
                path: file.path.clone(),
                format: file.format,
                stage: file.stage.clone(),
                sample_id: file.sample_id.clone(),
            };
            let mut outcome = FileOutcome::empty(file);
            report_file_failure(&mut outcome, &ctx, options, &e);
            outcome
        }
    }
}

fn resolve_config(
    file: &CallFile,
    format: Option<CallFileFormat>,
    options: &IngestionOptions,
) -> IngestionResult<ParserConfig> {
    if let Some(parser) = options.parser.as_ref() {
        return Ok(parser.clone());
    }
    format
        .map(CallFileFormat::parser_config)
        .ok_or_else(|| IngestionError::UnknownFormat {
            path: file.source(),
        })
}

fn report_file_failure(
    outcome: &mut FileOutcome,
    ctx: &IngestionContext,
    options: &IngestionOptions,
    error: &IngestionError,
) {
    let entry = ErrorEntry::from_error(&outcome.source, error);
    push_entry(outcome, ctx, options, severity_for_error(error), entry);
}

fn push_entry(
    outcome: &mut FileOutcome,
    ctx: &IngestionContext,
    options: &IngestionOptions,
    severity: IngestionSeverity,
    entry: ErrorEntry,
) {
    if let Some(obs) = options.observer.as_ref() {
        obs.on_failure(ctx, severity, &entry);
        if severity >= options.alert_at_or_above {
            obs.on_alert(ctx, severity, &entry);
        }
    }
    outcome.errors.push(entry);
}

fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    if e.is_io() {
        return IngestionSeverity::Critical;
    }
    match e.reason_code() {
        ReasonCode::UnreadableFile => IngestionSeverity::Error,
        ReasonCode::EmptyFile | ReasonCode::MalformedRow | ReasonCode::MissingKeyField => {
            IngestionSeverity::Warning
        }
    }
}
