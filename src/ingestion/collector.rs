//! Append-only log of rejected files and rows.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{ErrorEntry, ReasonCode};

/// Ordered collection of [`ErrorEntry`] values for one run.
///
/// Entries keep the order they were recorded in; the batch layer records files in input
/// order so the log is reproducible across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorCollector {
    entries: Vec<ErrorEntry>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: ErrorEntry) {
        self.entries.push(entry);
    }

    pub fn extend<I: IntoIterator<Item = ErrorEntry>>(&mut self, entries: I) {
        self.entries.extend(entries);
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries per reason code.
    pub fn count_by_reason(&self) -> BTreeMap<ReasonCode, usize> {
        let mut out = BTreeMap::new();
        for entry in &self.entries {
            *out.entry(entry.reason()).or_insert(0) += 1;
        }
        out
    }

    pub fn count(&self, reason: ReasonCode) -> usize {
        self.entries.iter().filter(|e| e.reason() == reason).count()
    }

    /// Entries recorded for one input file.
    pub fn for_source<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a ErrorEntry> + 'a {
        self.entries.iter().filter(move |e| e.source() == source)
    }

    /// Files that contributed nothing at all (unreadable or empty).
    pub fn failed_sources(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .filter(|e| e.reason().is_file_level())
            .map(ErrorEntry::source)
            .collect()
    }

    pub fn into_entries(self) -> Vec<ErrorEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCollector;
    use crate::error::{ErrorEntry, ReasonCode};

    #[test]
    fn keeps_order_and_counts_reasons() {
        let mut errors = ErrorCollector::new();
        errors.record(ErrorEntry::new("a.maf", ReasonCode::MalformedRow, "short row").at_row(3));
        errors.record(ErrorEntry::new("b.maf", ReasonCode::EmptyFile, "no rows"));
        errors.extend([
            ErrorEntry::new("a.maf", ReasonCode::MissingKeyField, "gene").at_row(9),
            ErrorEntry::new("c.tsv", ReasonCode::UnreadableFile, "gone"),
        ]);

        assert_eq!(errors.len(), 4);
        assert_eq!(errors.entries()[1].source(), "b.maf");
        assert_eq!(errors.count(ReasonCode::MalformedRow), 1);

        let by_reason = errors.count_by_reason();
        assert_eq!(by_reason.len(), 4);
        assert_eq!(by_reason[&ReasonCode::EmptyFile], 1);

        let rows: Vec<_> = errors.for_source("a.maf").filter_map(|e| e.row()).collect();
        assert_eq!(rows, vec![3, 9]);

        let failed: Vec<_> = errors.failed_sources().into_iter().collect();
        assert_eq!(failed, vec!["b.maf", "c.tsv"]);
    }
}
