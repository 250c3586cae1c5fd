//! Parser configuration: delimiter, header handling and the column-name map.
//!
//! On-disk layout is a configuration concern. A [`ParserConfig`] tells the parser how to split
//! rows and where each canonical [`Field`] lives; presets exist for the GDC file layouts the
//! study ships (see [`ParserConfig::maf`], [`ParserConfig::gene_level_copy_number`] and
//! [`ParserConfig::copy_number_segments`]).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, IngestionResult};
use crate::types::VariantKind;

/// Canonical fields a column can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    SampleId,
    GeneSymbol,
    MutationClass,
    CopyNumber,
    SegmentMean,
    Chromosome,
    Start,
    End,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::SampleId => "sample_id",
            Field::GeneSymbol => "gene_symbol",
            Field::MutationClass => "mutation_class",
            Field::CopyNumber => "copy_number",
            Field::SegmentMean => "segment_mean",
            Field::Chromosome => "chromosome",
            Field::Start => "start",
            Field::End => "end",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a field lives in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    /// 0-based column position (works with and without a header row).
    Index(usize),
    /// Header names to try in order, matched case-insensitively after trimming.
    Names(Vec<String>),
}

impl ColumnRef {
    /// Resolve to a column position. Names need a header row.
    pub fn resolve(&self, headers: Option<&csv::StringRecord>) -> Option<usize> {
        match self {
            ColumnRef::Index(idx) => Some(*idx),
            ColumnRef::Names(names) => {
                let headers = headers?;
                names.iter().find_map(|name| {
                    headers
                        .iter()
                        .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
                })
            }
        }
    }

    /// Human-readable label used in error messages.
    pub fn label(&self) -> String {
        match self {
            ColumnRef::Index(idx) => format!("#{idx}"),
            ColumnRef::Names(names) => names.join("|"),
        }
    }
}

/// Mapping from canonical [`Field`]s to file columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMap {
    columns: BTreeMap<Field, ColumnRef>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `field` to a single header name.
    pub fn name(self, field: Field, name: impl Into<String>) -> Self {
        self.names(field, [name.into()])
    }

    /// Map `field` to the first header matching any of `names`.
    pub fn names<I, S>(mut self, field: Field, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.insert(
            field,
            ColumnRef::Names(names.into_iter().map(Into::into).collect()),
        );
        self
    }

    /// Map `field` to a 0-based column position.
    pub fn index(mut self, field: Field, idx: usize) -> Self {
        self.columns.insert(field, ColumnRef::Index(idx));
        self
    }

    pub fn get(&self, field: Field) -> Option<&ColumnRef> {
        self.columns.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.columns.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &ColumnRef)> {
        self.columns.iter().map(|(f, c)| (*f, c))
    }
}

/// What the rows of a file describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileContent {
    /// One variant call per row.
    Calls(VariantKind),
    /// One copy-number segment per row; only the segment mean is collected.
    SegmentMeans,
}

/// How to decode one call file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Whether the first non-comment row is a header.
    pub has_header: bool,
    /// Lines starting with this byte are skipped.
    #[serde(default)]
    pub comment: Option<u8>,
    pub content: FileContent,
    pub columns: ColumnMap,
    /// Copy number treated as "no change" when deriving CNV classes.
    #[serde(default = "default_neutral_copy_number")]
    pub neutral_copy_number: f64,
}

fn default_neutral_copy_number() -> f64 {
    2.0
}

impl ParserConfig {
    /// GDC Mutation Annotation Format (`Simple_Nucleotide_Variation`, `*.maf`).
    pub fn maf() -> Self {
        Self {
            delimiter: b'\t',
            has_header: true,
            comment: Some(b'#'),
            content: FileContent::Calls(VariantKind::Snv),
            columns: ColumnMap::new()
                .name(Field::GeneSymbol, "Hugo_Symbol")
                .name(Field::MutationClass, "Variant_Classification")
                .name(Field::SampleId, "Tumor_Sample_Barcode")
                .name(Field::Chromosome, "Chromosome")
                .name(Field::Start, "Start_Position")
                .name(Field::End, "End_Position"),
            neutral_copy_number: default_neutral_copy_number(),
        }
    }

    /// GDC gene-level copy number table; classes are derived from `copy_number`.
    pub fn gene_level_copy_number() -> Self {
        Self {
            delimiter: b'\t',
            has_header: true,
            comment: Some(b'#'),
            content: FileContent::Calls(VariantKind::Cnv),
            columns: ColumnMap::new()
                .names(Field::GeneSymbol, ["gene_name", "Gene_Symbol", "Hugo_Symbol"])
                .name(Field::CopyNumber, "copy_number")
                .name(Field::Chromosome, "chromosome")
                .name(Field::Start, "start")
                .name(Field::End, "end"),
            neutral_copy_number: default_neutral_copy_number(),
        }
    }

    /// Copy-number segment table (`Copy_Number_Variation`, `*.seg`).
    pub fn copy_number_segments() -> Self {
        Self {
            delimiter: b'\t',
            has_header: true,
            comment: Some(b'#'),
            content: FileContent::SegmentMeans,
            columns: ColumnMap::new()
                .names(Field::SegmentMean, ["Segment_Mean", "SegmentMean"])
                .names(Field::Chromosome, ["Chromosome", "chrom"])
                .names(Field::Start, ["Start", "loc.start"])
                .names(Field::End, ["End", "loc.end"]),
            neutral_copy_number: default_neutral_copy_number(),
        }
    }

    /// Reject configurations that could never decode a row.
    pub fn validate(&self) -> IngestionResult<()> {
        if matches!(self.delimiter, b'\n' | b'\r' | b'"') {
            return Err(IngestionError::Config {
                message: format!("unusable delimiter byte {:#04x}", self.delimiter),
            });
        }
        if !self.neutral_copy_number.is_finite() {
            return Err(IngestionError::Config {
                message: "neutral_copy_number must be finite".to_string(),
            });
        }
        match self.content {
            FileContent::Calls(_) => {
                if !self.columns.contains(Field::GeneSymbol) {
                    return Err(missing_mapping(Field::GeneSymbol));
                }
                if !self.columns.contains(Field::MutationClass)
                    && !self.columns.contains(Field::CopyNumber)
                {
                    return Err(IngestionError::Config {
                        message: "call files need a mutation_class or copy_number column".to_string(),
                    });
                }
            }
            FileContent::SegmentMeans => {
                if !self.columns.contains(Field::SegmentMean) {
                    return Err(missing_mapping(Field::SegmentMean));
                }
            }
        }
        if !self.has_header {
            if let Some((field, _)) = self
                .columns
                .iter()
                .find(|(_, c)| matches!(c, ColumnRef::Names(_)))
            {
                return Err(IngestionError::Config {
                    message: format!("column for '{field}' is mapped by name but has_header is false"),
                });
            }
        }
        Ok(())
    }
}

fn missing_mapping(field: Field) -> IngestionError {
    IngestionError::Config {
        message: format!("column map has no entry for '{field}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnMap, ColumnRef, Field, FileContent, ParserConfig};
    use crate::types::VariantKind;

    #[test]
    fn presets_validate() {
        ParserConfig::maf().validate().unwrap();
        ParserConfig::gene_level_copy_number().validate().unwrap();
        ParserConfig::copy_number_segments().validate().unwrap();
    }

    #[test]
    fn names_resolve_case_insensitively_in_order() {
        let headers = csv::StringRecord::from(vec!["chrom", "segmentmean", "Segment_Mean"]);
        let col = ColumnRef::Names(vec!["segment_mean".to_string(), "SegmentMean".to_string()]);
        // First candidate wins even though the second appears earlier in the header.
        assert_eq!(col.resolve(Some(&headers)), Some(2));
        assert_eq!(ColumnRef::Index(1).resolve(None), Some(1));
        assert_eq!(col.resolve(None), None);
    }

    #[test]
    fn headerless_config_requires_index_columns() {
        let mut cfg = ParserConfig::maf();
        cfg.has_header = false;
        assert!(cfg.validate().is_err());

        cfg.columns = ColumnMap::new()
            .index(Field::GeneSymbol, 0)
            .index(Field::MutationClass, 1);
        cfg.validate().unwrap();
    }

    #[test]
    fn call_config_needs_a_class_source() {
        let cfg = ParserConfig {
            columns: ColumnMap::new().name(Field::GeneSymbol, "gene"),
            content: FileContent::Calls(VariantKind::Snv),
            ..ParserConfig::maf()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_deserializes_from_json() {
        let cfg: ParserConfig = serde_json::from_str(
            r#"{
                "delimiter": 44,
                "has_header": true,
                "content": {"calls": "SNV"},
                "columns": {"gene_symbol": ["Gene"], "mutation_class": ["Class"], "sample_id": 0}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.delimiter, b',');
        assert_eq!(cfg.comment, None);
        assert_eq!(cfg.neutral_copy_number, 2.0);
        assert_eq!(cfg.columns.get(Field::SampleId), Some(&ColumnRef::Index(0)));
        cfg.validate().unwrap();
    }
}
