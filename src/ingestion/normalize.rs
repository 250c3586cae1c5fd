//! Raw row → [`VariantRecord`] normalization.
//!
//! Pure functions only: the same [`RawCall`], context and vocabulary always produce the same
//! result.

use crate::error::{IngestionError, IngestionResult};
use crate::types::{Locus, MutationClass, RawCall, Stage, VariantKind, VariantRecord};

use super::vocabulary::Vocabulary;

/// File-level facts every row of a file shares.
#[derive(Debug, Clone, Copy)]
pub struct RecordContext<'a> {
    pub stage: &'a Stage,
    /// Sample declared for the file; used when the row has no sample column or a blank cell.
    pub sample_id: &'a str,
    pub variant_kind: VariantKind,
    pub neutral_copy_number: f64,
}

/// Normalize one raw row.
///
/// Returns `Ok(None)` when the row is not a variant call at all (copy-neutral or uncalled
/// copy-number rows). Rows that are calls but lack a sample or gene after trimming fail with
/// [`IngestionError::MissingKeyField`].
pub fn normalize(
    raw: &RawCall,
    ctx: &RecordContext<'_>,
    vocabulary: &Vocabulary,
) -> IngestionResult<Option<VariantRecord>> {
    let mutation_class = match classify(raw, ctx, vocabulary) {
        Some(class) => class,
        None => return Ok(None),
    };

    // A blank sample cell falls back to the sample declared for the file.
    let sample_id = raw
        .sample_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(ctx.sample_id.trim());
    if sample_id.is_empty() {
        return Err(IngestionError::MissingKeyField { field: "sample_id" });
    }

    let gene_symbol = normalize_gene_symbol(raw.gene_symbol.as_deref().unwrap_or(""));
    if gene_symbol.is_empty() {
        return Err(IngestionError::MissingKeyField {
            field: "gene_symbol",
        });
    }

    let record = VariantRecord::new(
        sample_id,
        ctx.stage.clone(),
        gene_symbol,
        ctx.variant_kind,
        mutation_class,
    )?
    .with_locus(locus(raw));
    Ok(Some(record))
}

/// Trim and upper-case a gene symbol.
pub fn normalize_gene_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Canonical chromosome name: no `chr` prefix, upper-case, mitochondrion as `MT`.
pub fn normalize_chromosome(raw: &str) -> String {
    let trimmed = raw.trim();
    let bare = match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("chr") => &trimmed[3..],
        _ => trimmed,
    };
    let upper = bare.to_uppercase();
    if upper == "M" { "MT".to_string() } else { upper }
}

/// Class for a copy-number value relative to the neutral copy number.
pub fn copy_number_class(copy_number: f64, neutral: f64) -> Option<MutationClass> {
    if !copy_number.is_finite() {
        return None;
    }
    if copy_number > neutral {
        Some(MutationClass::new("amplification"))
    } else if copy_number < neutral {
        Some(MutationClass::new("deletion"))
    } else {
        None
    }
}

fn classify(
    raw: &RawCall,
    ctx: &RecordContext<'_>,
    vocabulary: &Vocabulary,
) -> Option<MutationClass> {
    if let Some(class) = raw.mutation_class.as_deref().filter(|c| !c.trim().is_empty()) {
        return Some(vocabulary.resolve(class));
    }
    if let Some(cn) = raw.copy_number {
        return copy_number_class(cn, ctx.neutral_copy_number).map(|c| resolve_derived(c, vocabulary));
    }
    match ctx.variant_kind {
        // A copy-number row with neither a call nor a copy number is simply uncalled.
        VariantKind::Cnv => None,
        VariantKind::Snv => Some(MutationClass::other()),
    }
}

// Derived classes go through the vocabulary so a custom table can rename them.
fn resolve_derived(class: MutationClass, vocabulary: &Vocabulary) -> MutationClass {
    if vocabulary.contains(class.as_str()) {
        vocabulary.resolve(class.as_str())
    } else {
        class
    }
}

fn locus(raw: &RawCall) -> Option<Locus> {
    let chromosome = raw
        .chromosome
        .as_deref()
        .map(normalize_chromosome)
        .filter(|c| !c.is_empty())?;
    Some(Locus {
        chromosome,
        start: raw.start,
        end: raw.end,
    })
}
