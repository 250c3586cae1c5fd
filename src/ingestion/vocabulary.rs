//! Controlled mutation-class vocabulary.
//!
//! Maps the spellings found in call files (`Missense_Mutation`, `AMP`, `3'UTR`, ...) onto a
//! small set of canonical [`MutationClass`] names. Lookups are case-insensitive and anything
//! not in the vocabulary resolves to [`MutationClass::other`], so unseen classes are still
//! counted.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::MutationClass;

/// Alias table from raw class spellings to canonical classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct Vocabulary {
    aliases: BTreeMap<String, MutationClass>,
}

impl Vocabulary {
    /// A vocabulary that knows no classes; everything resolves to `OTHER`.
    pub fn empty() -> Self {
        Self {
            aliases: BTreeMap::new(),
        }
    }

    /// Register `canonical` and the raw spellings that map to it.
    ///
    /// The canonical name is always an alias of itself.
    pub fn with_class<I, S>(mut self, canonical: &str, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let class = MutationClass::new(canonical.trim());
        self.aliases.insert(key(canonical), class.clone());
        for alias in aliases {
            self.aliases.insert(key(alias.as_ref()), class.clone());
        }
        self
    }

    /// Resolve a raw class spelling. Unknown or blank values map to `OTHER`.
    pub fn resolve(&self, raw: &str) -> MutationClass {
        self.aliases
            .get(&key(raw))
            .cloned()
            .unwrap_or_else(MutationClass::other)
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.aliases.contains_key(&key(raw))
    }

    /// Distinct canonical classes.
    pub fn classes(&self) -> BTreeSet<&MutationClass> {
        self.aliases.values().collect()
    }

    pub fn len(&self) -> usize {
        self.classes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl Default for Vocabulary {
    /// GDC MAF `Variant_Classification` values plus copy-number call labels.
    fn default() -> Self {
        Vocabulary::empty()
            .with_class("missense", ["Missense_Mutation", "missense_variant"])
            .with_class("nonsense", ["Nonsense_Mutation", "stop_gained"])
            .with_class("silent", ["Silent", "synonymous_variant"])
            .with_class("frame_shift_del", ["Frame_Shift_Del"])
            .with_class("frame_shift_ins", ["Frame_Shift_Ins"])
            .with_class("in_frame_del", ["In_Frame_Del"])
            .with_class("in_frame_ins", ["In_Frame_Ins"])
            .with_class("splice_site", ["Splice_Site"])
            .with_class("splice_region", ["Splice_Region"])
            .with_class("translation_start_site", ["Translation_Start_Site"])
            .with_class("nonstop", ["Nonstop_Mutation"])
            .with_class("3_prime_utr", ["3'UTR"])
            .with_class("5_prime_utr", ["5'UTR"])
            .with_class("3_prime_flank", ["3'Flank"])
            .with_class("5_prime_flank", ["5'Flank"])
            .with_class("intron", ["Intron"])
            .with_class("rna", ["RNA"])
            .with_class("igr", ["IGR"])
            .with_class("amplification", ["Amp", "Gain"])
            .with_class("deletion", ["Del", "Loss", "HomDel"])
    }
}

impl From<BTreeMap<String, Vec<String>>> for Vocabulary {
    fn from(table: BTreeMap<String, Vec<String>>) -> Self {
        table
            .iter()
            .fold(Vocabulary::empty(), |vocab, (canonical, aliases)| {
                vocab.with_class(canonical, aliases)
            })
    }
}

impl From<Vocabulary> for BTreeMap<String, Vec<String>> {
    fn from(vocab: Vocabulary) -> Self {
        let mut table: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (alias, class) in vocab.aliases {
            let entry = table.entry(class.as_str().to_string()).or_default();
            if alias != key(class.as_str()) {
                entry.push(alias);
            }
        }
        table
    }
}

fn key(raw: &str) -> String {
    raw.trim().to_lowercase()
}
