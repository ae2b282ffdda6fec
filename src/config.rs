//! Analysis configuration.
//!
//! Layers, lowest precedence first: a [`Preset`], an optional JSON file (only the keys it names
//! override the preset), an optional blacklist file, then explicit command-line flags.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::admission::{AdmissionFilter, Normalization};
use crate::cooccurrence::PairOrder;
use crate::error::{CollocationError, Result};
use crate::provenance::ProvenanceClassifier;
use crate::stream::StreamScope;

/// Named content-word definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Preset {
    /// Open-class words only: nouns, verbs, adjectives, adverbs, proper nouns.
    #[default]
    Content,
    /// Drops determiners, conjunctions, particles and pronouns.
    /// Keeps auxiliaries and adpositions.
    Function,
    /// Drops only punctuation, symbols, numerals and foreign material.
    Minimal,
}

const CONTENT_STOP_POS: &[&str] = &[
    "PUNCT", "SYM", "NUM", "X", "PRON", "AUX", "ADP", "SCONJ", "PART", "DET", "CCONJ",
];
const FUNCTION_STOP_POS: &[&str] = &[
    "DET", "CCONJ", "SCONJ", "PART", "PRON", "PUNCT", "SYM", "NUM",
];
const MINIMAL_STOP_POS: &[&str] = &["PUNCT", "SYM", "NUM", "X"];

/// Annotation artifacts seen in Latin treebanks: calendar abbreviations and praenomina.
const ARTIFACT_BLACKLIST: &[&str] = &[
    "calendar",
    "expression",
    "monetary",
    "kal.",
    "non.",
    "id.",
    "c.",
    "cn.",
    "m.",
    "l.",
];

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// One report per window size.
    pub windows: Vec<usize>,
    pub pair_order: PairOrder,
    pub stop_pos: BTreeSet<String>,
    pub blacklist: BTreeSet<String>,
    pub placeholder: String,
    pub min_lemma_len: usize,
    pub normalization: Normalization,
    pub provenance: ProvenanceClassifier,
    /// Restrict the stream to documents classified with this label.
    pub author: Option<String>,
    pub require_provenance: bool,
    pub min_occurrence: u64,
    pub reset: StreamScope,
    pub top: usize,
    pub profile_min_tokens: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig::from_preset(Preset::default())
    }
}

impl AnalysisConfig {
    pub fn from_preset(preset: Preset) -> Self {
        let base = AnalysisConfig {
            windows: vec![5],
            pair_order: PairOrder::Unordered,
            stop_pos: set(CONTENT_STOP_POS),
            blacklist: set(ARTIFACT_BLACKLIST),
            placeholder: "_".to_string(),
            min_lemma_len: 2,
            normalization: Normalization::Lowercase,
            provenance: ProvenanceClassifier::default(),
            author: None,
            require_provenance: false,
            min_occurrence: 5,
            reset: StreamScope::Corpus,
            top: 100,
            profile_min_tokens: 1000,
        };
        match preset {
            Preset::Content => base,
            Preset::Function => AnalysisConfig {
                pair_order: PairOrder::Ordered,
                stop_pos: set(FUNCTION_STOP_POS),
                blacklist: BTreeSet::new(),
                min_occurrence: 3,
                ..base
            },
            Preset::Minimal => AnalysisConfig {
                pair_order: PairOrder::Ordered,
                stop_pos: set(MINIMAL_STOP_POS),
                blacklist: BTreeSet::new(),
                normalization: Normalization::Alphabetic,
                min_occurrence: 10,
                ..base
            },
        }
    }

    /// Overlay the keys present in `overlay` onto this config.
    pub fn merge_json(self, overlay: Value) -> Result<Self> {
        let base = serde_json::to_value(&self)?;
        Ok(serde_json::from_value(deep_merge(base, overlay))?)
    }

    /// Overlay a JSON config file.
    pub fn merge_file(self, path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CollocationError::io(path, e))?;
        let overlay: Value = serde_json::from_str(&text)?;
        if !overlay.is_object() {
            return Err(CollocationError::Config(format!(
                "{} must contain a JSON object",
                path.display()
            )));
        }
        self.merge_json(overlay)
    }

    /// Add the lemmas of a one-per-line file to the blacklist.
    /// Blank lines and `#` comments are ignored.
    pub fn extend_blacklist_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path).map_err(|e| CollocationError::io(path, e))?;
        self.blacklist.extend(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_lowercase),
        );
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.windows.is_empty() {
            return Err(CollocationError::Config(
                "at least one window size is required".into(),
            ));
        }
        if let Some(&w) = self.windows.iter().find(|&&w| w < 2) {
            return Err(CollocationError::InvalidWindow(w));
        }
        if self.min_lemma_len < 2 {
            return Err(CollocationError::Config(format!(
                "min_lemma_len must be at least 2, got {}",
                self.min_lemma_len
            )));
        }
        if self.min_occurrence == 0 {
            return Err(CollocationError::Config(
                "min_occurrence must be at least 1".into(),
            ));
        }
        if let Some(author) = &self.author {
            if !self.provenance.rules.iter().any(|r| &r.label == author) {
                return Err(CollocationError::Config(format!(
                    "author {author:?} matches no provenance rule"
                )));
            }
        }
        Ok(())
    }

    pub fn admission_filter(&self) -> AdmissionFilter {
        AdmissionFilter {
            placeholder: self.placeholder.clone(),
            min_lemma_len: self.min_lemma_len,
            normalization: self.normalization,
            require_provenance: self.require_provenance,
            author: self.author.clone(),
            ..AdmissionFilter::default()
        }
        .with_stop_pos(self.stop_pos.iter().cloned())
        .with_blacklist(&self.blacklist)
    }
}

/// Recursive merge: objects merge key by key, `null` keeps the base, anything else replaces it.
fn deep_merge(base: Value, over: Value) -> Value {
    match (base, over) {
        (Value::Object(mut b), Value::Object(o)) => {
            for (key, over_val) in o {
                let base_val = b.remove(&key).unwrap_or(Value::Null);
                b.insert(key, deep_merge(base_val, over_val));
            }
            Value::Object(b)
        }
        (base, Value::Null) => base,
        (_, over) => over,
    }
}
