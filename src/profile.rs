//! Vocabulary richness per provenance label: Shannon entropy and type-token ratio.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::cooccurrence::FrequencyTable;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexicalProfile {
    pub label: String,
    pub tokens: u64,
    pub unique: usize,
    /// Bits.
    pub entropy: f64,
    pub ttr: f64,
}

/// `H = -sum(p * log2 p)` over the table; 0.0 for an empty table.
pub fn shannon_entropy(table: &FrequencyTable<String>) -> f64 {
    let total = table.total();
    if total == 0 {
        return 0.0;
    }
    table
        .iter()
        .map(|(_, &n)| {
            let p = n as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

pub fn lexical_profile(label: &str, lemmas: &[String]) -> LexicalProfile {
    let table: FrequencyTable<String> = lemmas.iter().cloned().collect();
    let tokens = table.total();
    let unique = table.len();
    LexicalProfile {
        label: label.to_string(),
        tokens,
        unique,
        entropy: shannon_entropy(&table),
        ttr: if tokens > 0 {
            unique as f64 / tokens as f64
        } else {
            0.0
        },
    }
}

/// One profile per label with at least `min_tokens` lemmas, richest vocabulary first.
pub fn profile_by_label(
    groups: &BTreeMap<String, Vec<String>>,
    min_tokens: u64,
) -> Vec<LexicalProfile> {
    let mut profiles: Vec<LexicalProfile> = groups
        .iter()
        .map(|(label, lemmas)| lexical_profile(label, lemmas))
        .filter(|p| p.tokens >= min_tokens)
        .collect();
    profiles.sort_by(|a, b| {
        b.entropy
            .total_cmp(&a.entropy)
            .then_with(|| a.label.cmp(&b.label))
    });
    profiles
}
