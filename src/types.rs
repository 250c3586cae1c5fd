//! Canonical record model.
//!
//! Every input file, whatever its column layout, is reduced to [`VariantRecord`]s: one called
//! variant for one sample at one [`Stage`]. Required identity fields are validated at
//! construction, so a `VariantRecord` with an empty sample, stage or gene cannot exist.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, IngestionResult};
use crate::tables::COMBINED_SCOPE;

/// Variant type of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VariantKind {
    /// Copy Number Variation.
    #[serde(rename = "CNV")]
    Cnv,
    /// Simple Nucleotide Variation.
    #[serde(rename = "SNV")]
    Snv,
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantKind::Cnv => f.write_str("CNV"),
            VariantKind::Snv => f.write_str("SNV"),
        }
    }
}

/// A cohort-defined disease-progression stage (never empty).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Stage(String);

impl Stage {
    /// Create a stage from a label. The label is trimmed; empty labels are rejected.
    ///
    /// [`COMBINED_SCOPE`] (any casing) is reserved for the cross-stage rows of the output
    /// tables and cannot name a stage.
    pub fn new(label: impl AsRef<str>) -> IngestionResult<Self> {
        let trimmed = label.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IngestionError::UnknownStage {
                label: label.as_ref().to_string(),
            });
        }
        if trimmed.eq_ignore_ascii_case(COMBINED_SCOPE) {
            return Err(IngestionError::Config {
                message: format!("stage label '{trimmed}' is reserved for the combined scope"),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Stage {
    type Error = IngestionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Stage::new(value)
    }
}

impl From<Stage> for String {
    fn from(value: Stage) -> Self {
        value.0
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One declared stage plus the sub-stage labels folded into it (e.g. `II` ← `IIA`, `IIB`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub label: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// The study's stage vocabulary.
///
/// An empty set accepts any non-empty label as its own stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageSet {
    stages: Vec<StageDefinition>,
}

impl StageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stage and the labels that should be generalised into it.
    pub fn with_stage<I, S>(mut self, label: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stages.push(StageDefinition {
            label: label.into(),
            aliases: aliases.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Canonical stages in declaration order.
    pub fn stages(&self) -> Vec<Stage> {
        self.stages
            .iter()
            .filter_map(|d| Stage::new(&d.label).ok())
            .collect()
    }

    /// Resolve a label (case-insensitive, aliases included) to its canonical stage.
    pub fn resolve(&self, label: &str) -> IngestionResult<Stage> {
        let wanted = label.trim();
        if self.stages.is_empty() {
            return Stage::new(wanted);
        }
        self.stages
            .iter()
            .find(|d| {
                d.label.trim().eq_ignore_ascii_case(wanted)
                    || d.aliases.iter().any(|a| a.trim().eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| IngestionError::UnknownStage {
                label: label.to_string(),
            })
            .and_then(|d| Stage::new(&d.label))
    }

    /// Check that labels are non-empty and that no label or alias is claimed twice.
    pub fn validate(&self) -> IngestionResult<()> {
        let mut seen: Vec<String> = Vec::new();
        for def in &self.stages {
            Stage::new(&def.label)?;
            for name in std::iter::once(&def.label).chain(def.aliases.iter()) {
                let key = name.trim().to_ascii_lowercase();
                if seen.contains(&key) {
                    return Err(IngestionError::Config {
                        message: format!("stage label '{}' is declared more than once", name.trim()),
                    });
                }
                seen.push(key);
            }
        }
        Ok(())
    }
}

/// Canonical mutation class drawn from a [`crate::ingestion::Vocabulary`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MutationClass(String);

impl MutationClass {
    /// Label of the bucket that collects classes missing from the vocabulary.
    pub const OTHER_LABEL: &'static str = "OTHER";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn other() -> Self {
        Self(Self::OTHER_LABEL.to_string())
    }

    pub fn is_other(&self) -> bool {
        self.0 == Self::OTHER_LABEL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MutationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Genomic position of a call. Carried for reference only; never aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locus {
    pub chromosome: String,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (Some(s), Some(e)) => write!(f, "{}:{}-{}", self.chromosome, s, e),
            (Some(s), None) => write!(f, "{}:{}", self.chromosome, s),
            _ => f.write_str(&self.chromosome),
        }
    }
}

/// One called variant after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantRecord {
    sample_id: String,
    stage: Stage,
    gene_symbol: String,
    variant_kind: VariantKind,
    mutation_class: MutationClass,
    locus: Option<Locus>,
}

impl VariantRecord {
    /// Create a record. `sample_id` and `gene_symbol` must be non-empty after trimming.
    pub fn new(
        sample_id: impl Into<String>,
        stage: Stage,
        gene_symbol: impl Into<String>,
        variant_kind: VariantKind,
        mutation_class: MutationClass,
    ) -> IngestionResult<Self> {
        let sample_id = sample_id.into().trim().to_string();
        if sample_id.is_empty() {
            return Err(IngestionError::MissingKeyField { field: "sample_id" });
        }
        let gene_symbol = gene_symbol.into().trim().to_string();
        if gene_symbol.is_empty() {
            return Err(IngestionError::MissingKeyField {
                field: "gene_symbol",
            });
        }
        Ok(Self {
            sample_id,
            stage,
            gene_symbol,
            variant_kind,
            mutation_class,
            locus: None,
        })
    }

    pub fn with_locus(mut self, locus: Option<Locus>) -> Self {
        self.locus = locus;
        self
    }

    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn gene_symbol(&self) -> &str {
        &self.gene_symbol
    }

    pub fn variant_kind(&self) -> VariantKind {
        self.variant_kind
    }

    pub fn mutation_class(&self) -> &MutationClass {
        &self.mutation_class
    }

    pub fn locus(&self) -> Option<&Locus> {
        self.locus.as_ref()
    }
}

/// Raw field tuple decoded from one data row, before normalization.
///
/// String fields hold the cell text exactly as read (untrimmed); `None` means the column is
/// not configured or not present in the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCall {
    /// 1-based line number in the source file.
    pub row: usize,
    pub sample_id: Option<String>,
    pub gene_symbol: Option<String>,
    pub mutation_class: Option<String>,
    pub copy_number: Option<f64>,
    pub chromosome: Option<String>,
    pub start: Option<u64>,
    pub end: Option<u64>,
}
