//! Delimited call-file parsing.
//!
//! Turns one file into [`RawCall`]s (or segment-mean values) according to a
//! [`ParserConfig`]. Row-level problems are collected next to the decoded rows; only
//! file-level problems (cannot open, unusable header, no data rows) are returned as `Err`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{IngestionError, IngestionResult};
use crate::types::RawCall;

use super::config::{ColumnRef, Field, FileContent, ParserConfig};

/// A row the parser could not decode.
#[derive(Debug)]
pub struct RowRejection {
    /// 1-based line number.
    pub row: usize,
    pub error: IngestionError,
}

/// Everything decoded from one file.
#[derive(Debug, Default)]
pub struct ParsedFile {
    /// Decoded call rows (for [`FileContent::Calls`]).
    pub calls: Vec<RawCall>,
    /// Segment means (for [`FileContent::SegmentMeans`]).
    pub segment_means: Vec<f64>,
    pub rejected: Vec<RowRejection>,
    /// Data rows that decoded fine but carry nothing to collect (blank segment means).
    pub skipped_rows: usize,
}

impl ParsedFile {
    /// Number of data rows seen, decoded or not.
    pub fn data_rows(&self) -> usize {
        self.calls.len() + self.segment_means.len() + self.rejected.len() + self.skipped_rows
    }
}

/// A `csv::ReaderBuilder` set up for `config`.
///
/// Rows are read flexibly; rows that are too short for a mapped column are rejected
/// individually instead of failing the whole file.
pub fn reader_builder(config: &ParserConfig) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(config.delimiter)
        .has_headers(config.has_header)
        .comment(config.comment)
        .flexible(true);
    builder
}

/// Parse a call file from disk.
pub fn parse_call_file_from_path(
    path: impl AsRef<Path>,
    config: &ParserConfig,
) -> IngestionResult<ParsedFile> {
    config.validate()?;
    let file = File::open(path)?;
    let mut rdr = reader_builder(config).from_reader(file);
    parse_call_file_from_reader(&mut rdr, config)
}

/// Parse call rows from an existing reader built with [`reader_builder`].
pub fn parse_call_file_from_reader<R: Read>(
    rdr: &mut csv::Reader<R>,
    config: &ParserConfig,
) -> IngestionResult<ParsedFile> {
    let headers = if config.has_header {
        let headers = match rdr.headers() {
            Ok(h) => h.clone(),
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                return Err(IngestionError::SchemaMismatch {
                    message: format!("unreadable header: {e}"),
                });
            }
        };
        if headers.is_empty() {
            return Err(IngestionError::EmptyInput);
        }
        Some(headers)
    } else {
        None
    };

    let projection = Projection::resolve(config, headers.as_ref())?;
    let first_data_line = if config.has_header { 2 } else { 1 };

    let mut out = ParsedFile::default();
    for (row_idx0, result) in rdr.records().enumerate() {
        let fallback_row = row_idx0 + first_data_line;
        let record = match result {
            Ok(record) => record,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                let row = e.position().map(|p| p.line() as usize).unwrap_or(fallback_row);
                out.rejected.push(RowRejection {
                    row,
                    error: e.into(),
                });
                continue;
            }
        };
        let row = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_row);

        match config.content {
            FileContent::Calls(_) => match projection.raw_call(row, &record) {
                Ok(call) => out.calls.push(call),
                Err(error) => out.rejected.push(RowRejection { row, error }),
            },
            FileContent::SegmentMeans => match projection.segment_mean(row, &record) {
                Ok(Some(value)) => out.segment_means.push(value),
                Ok(None) => out.skipped_rows += 1,
                Err(error) => out.rejected.push(RowRejection { row, error }),
            },
        }
    }

    if out.data_rows() == 0 {
        return Err(IngestionError::EmptyInput);
    }
    Ok(out)
}

/// Resolved column positions for one file.
#[derive(Debug, Clone, Default)]
struct Projection {
    sample_id: Option<Column>,
    gene_symbol: Option<Column>,
    mutation_class: Option<Column>,
    copy_number: Option<Column>,
    segment_mean: Option<Column>,
    chromosome: Option<Column>,
    start: Option<Column>,
    end: Option<Column>,
}

#[derive(Debug, Clone)]
struct Column {
    idx: usize,
    label: String,
    required: bool,
}

impl Projection {
    fn resolve(config: &ParserConfig, headers: Option<&csv::StringRecord>) -> IngestionResult<Self> {
        let required = required_fields(config, headers);
        let mut projection = Projection::default();

        for (field, col_ref) in config.columns.iter() {
            let is_required = required.contains(&field);
            let column = match col_ref.resolve(headers) {
                Some(idx) => Column {
                    idx,
                    label: column_label(col_ref, headers, idx),
                    required: is_required,
                },
                None if is_required => {
                    return Err(IngestionError::SchemaMismatch {
                        message: format!(
                            "missing required column '{}' for {field}. headers={:?}",
                            col_ref.label(),
                            headers.map(|h| h.iter().collect::<Vec<_>>()).unwrap_or_default()
                        ),
                    });
                }
                None => continue,
            };
            let slot = match field {
                Field::SampleId => &mut projection.sample_id,
                Field::GeneSymbol => &mut projection.gene_symbol,
                Field::MutationClass => &mut projection.mutation_class,
                Field::CopyNumber => &mut projection.copy_number,
                Field::SegmentMean => &mut projection.segment_mean,
                Field::Chromosome => &mut projection.chromosome,
                Field::Start => &mut projection.start,
                Field::End => &mut projection.end,
            };
            *slot = Some(column);
        }

        Ok(projection)
    }

    fn raw_call(&self, row: usize, record: &csv::StringRecord) -> IngestionResult<RawCall> {
        Ok(RawCall {
            row,
            sample_id: text(row, record, self.sample_id.as_ref())?,
            gene_symbol: text(row, record, self.gene_symbol.as_ref())?,
            mutation_class: text(row, record, self.mutation_class.as_ref())?,
            copy_number: number(row, record, self.copy_number.as_ref())?,
            chromosome: text(row, record, self.chromosome.as_ref())?,
            start: position(record, self.start.as_ref()),
            end: position(record, self.end.as_ref()),
        })
    }

    fn segment_mean(&self, row: usize, record: &csv::StringRecord) -> IngestionResult<Option<f64>> {
        number(row, record, self.segment_mean.as_ref())
    }
}

fn required_fields(config: &ParserConfig, headers: Option<&csv::StringRecord>) -> Vec<Field> {
    match config.content {
        FileContent::SegmentMeans => vec![Field::SegmentMean],
        FileContent::Calls(_) => {
            let resolves = |field: Field| {
                config
                    .columns
                    .get(field)
                    .and_then(|c| c.resolve(headers))
                    .is_some()
            };
            // One class source is enough: an explicit class column wins, otherwise the class
            // is derived from copy number.
            let class_source = if resolves(Field::MutationClass) {
                Field::MutationClass
            } else if resolves(Field::CopyNumber) {
                Field::CopyNumber
            } else if config.columns.contains(Field::MutationClass) {
                Field::MutationClass
            } else {
                Field::CopyNumber
            };
            vec![Field::GeneSymbol, class_source]
        }
    }
}

fn column_label(col_ref: &ColumnRef, headers: Option<&csv::StringRecord>, idx: usize) -> String {
    headers
        .and_then(|h| h.get(idx))
        .map(|h| h.trim().to_string())
        .unwrap_or_else(|| col_ref.label())
}

fn cell<'r>(
    row: usize,
    record: &'r csv::StringRecord,
    column: Option<&Column>,
) -> IngestionResult<Option<&'r str>> {
    let Some(column) = column else {
        return Ok(None);
    };
    match record.get(column.idx) {
        Some(value) => Ok(Some(value)),
        None if column.required => Err(IngestionError::ShortRow {
            row,
            column: column.label.clone(),
            found: record.len(),
            expected: column.idx + 1,
        }),
        None => Ok(None),
    }
}

fn text(row: usize, record: &csv::StringRecord, column: Option<&Column>) -> IngestionResult<Option<String>> {
    Ok(cell(row, record, column)?.map(str::to_owned))
}

fn number(row: usize, record: &csv::StringRecord, column: Option<&Column>) -> IngestionResult<Option<f64>> {
    let Some(raw) = cell(row, record, column)? else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if is_missing(trimmed) {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if !v.is_finite() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(e) => Err(IngestionError::ParseError {
            row,
            column: column.map(|c| c.label.clone()).unwrap_or_default(),
            raw: raw.to_owned(),
            message: e.to_string(),
        }),
    }
}

// Loci are informational; an unparseable coordinate drops the coordinate, not the row.
fn position(record: &csv::StringRecord, column: Option<&Column>) -> Option<u64> {
    let raw = record.get(column?.idx)?.trim();
    raw.parse::<u64>().ok()
}

fn is_missing(s: &str) -> bool {
    s.is_empty() || s.eq_ignore_ascii_case("na") || s == "."
}

#[cfg(test)]
mod tests {
    use super::{parse_call_file_from_reader, reader_builder};
    use crate::error::{IngestionError, ReasonCode};
    use crate::ingestion::config::{ColumnMap, Field, ParserConfig};

    fn parse(config: &ParserConfig, input: &str) -> Result<super::ParsedFile, IngestionError> {
        let mut rdr = reader_builder(config).from_reader(input.as_bytes());
        parse_call_file_from_reader(&mut rdr, config)
    }

    #[test]
    fn maf_skips_comment_lines_and_reads_reordered_columns() {
        let input = "#version 2.4\n#annotation\nVariant_Classification\tChromosome\tHugo_Symbol\nMissense_Mutation\tchr17\tTP53\nSilent\tchr12\tKRAS\n";
        let parsed = parse(&ParserConfig::maf(), input).unwrap();

        assert_eq!(parsed.calls.len(), 2);
        assert!(parsed.rejected.is_empty());
        assert_eq!(parsed.calls[0].gene_symbol.as_deref(), Some("TP53"));
        assert_eq!(parsed.calls[0].mutation_class.as_deref(), Some("Missense_Mutation"));
        assert_eq!(parsed.calls[1].chromosome.as_deref(), Some("chr12"));
        // Optional locus columns missing from the header are simply absent.
        assert_eq!(parsed.calls[1].start, None);
    }

    #[test]
    fn short_row_is_rejected_without_losing_neighbours() {
        let input = "Hugo_Symbol\tVariant_Classification\nTP53\tMissense_Mutation\nKRAS\nEGFR\tSilent\n";
        let parsed = parse(&ParserConfig::maf(), input).unwrap();

        assert_eq!(parsed.calls.len(), 2);
        assert_eq!(parsed.rejected.len(), 1);
        let rejection = &parsed.rejected[0];
        assert_eq!(rejection.row, 3);
        assert_eq!(rejection.error.reason_code(), ReasonCode::MalformedRow);
    }

    #[test]
    fn header_only_input_is_empty() {
        let err = parse(&ParserConfig::maf(), "Hugo_Symbol\tVariant_Classification\n").unwrap_err();
        assert!(matches!(err, IngestionError::EmptyInput));

        let err = parse(&ParserConfig::maf(), "").unwrap_err();
        assert!(matches!(err, IngestionError::EmptyInput));
    }

    #[test]
    fn missing_gene_column_fails_the_file() {
        let err = parse(&ParserConfig::maf(), "Gene\tVariant_Classification\nTP53\tSilent\n").unwrap_err();
        assert_eq!(err.reason_code(), ReasonCode::UnreadableFile);
        assert!(err.to_string().contains("missing required column 'Hugo_Symbol'"));
    }

    #[test]
    fn copy_number_values_are_typed() {
        let input = "gene_id\tgene_name\tchromosome\tstart\tend\tcopy_number\nENSG1\tERBB2\tchr17\t39687914\t39730426\t6\nENSG2\tTP53\tchr17\t7661779\t7687538\t\nENSG3\tMYC\tchr8\tx\t2\tabc\n";
        let parsed = parse(&ParserConfig::gene_level_copy_number(), input).unwrap();

        assert_eq!(parsed.calls.len(), 2);
        assert_eq!(parsed.calls[0].copy_number, Some(6.0));
        assert_eq!(parsed.calls[0].start, Some(39_687_914));
        assert_eq!(parsed.calls[1].copy_number, None);
        assert_eq!(parsed.rejected.len(), 1);
        assert!(matches!(parsed.rejected[0].error, IngestionError::ParseError { .. }));
    }

    #[test]
    fn segment_means_are_located_case_insensitively() {
        let input = "GDC_Aliquot\tChromosome\tStart\tEnd\tNum_Probes\tsegment_mean\nA\t1\t100\t200\t10\t0.25\nA\t1\t300\t400\t12\tNA\nA\t2\t100\t900\t40\t-1.5\n";
        let parsed = parse(&ParserConfig::copy_number_segments(), input).unwrap();

        assert_eq!(parsed.segment_means, vec![0.25, -1.5]);
        assert_eq!(parsed.skipped_rows, 1);
        assert!(parsed.calls.is_empty());
    }

    #[test]
    fn headerless_files_use_column_positions() {
        let config = ParserConfig {
            delimiter: b',',
            has_header: false,
            comment: None,
            columns: ColumnMap::new()
                .index(Field::GeneSymbol, 0)
                .index(Field::MutationClass, 1),
            ..ParserConfig::maf()
        };
        let parsed = parse(&config, "tp53,Nonsense_Mutation\nkras,Missense_Mutation\n").unwrap();
        assert_eq!(parsed.calls.len(), 2);
        assert_eq!(parsed.calls[0].row, 1);
        assert_eq!(parsed.calls[1].gene_symbol.as_deref(), Some("kras"));
    }

    #[test]
    fn invalid_utf8_row_is_malformed() {
        let mut input = b"Hugo_Symbol\tVariant_Classification\nTP53\tSilent\n".to_vec();
        input.extend_from_slice(b"KR\xffAS\tSilent\nEGFR\tSilent\n");
        let config = ParserConfig::maf();
        let mut rdr = reader_builder(&config).from_reader(input.as_slice());
        let parsed = parse_call_file_from_reader(&mut rdr, &config).unwrap();

        assert_eq!(parsed.calls.len(), 2);
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].error.reason_code(), ReasonCode::MalformedRow);
    }
}
