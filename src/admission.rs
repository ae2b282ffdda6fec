//! Decides which annotated tokens enter the lemma stream.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::provenance::Provenance;

/// One token as produced by the external annotation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedToken {
    pub surface_form: String,
    pub lemma: String,
    pub pos_tag: String,
    pub token_index: usize,
}

impl AnnotatedToken {
    pub fn new(surface_form: &str, lemma: &str, pos_tag: &str, token_index: usize) -> Self {
        AnnotatedToken {
            surface_form: surface_form.to_string(),
            lemma: lemma.to_string(),
            pos_tag: pos_tag.to_string(),
            token_index,
        }
    }
}

/// How a lemma is normalized before the length check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Lower-case only.
    #[default]
    Lowercase,
    /// Lower-case and drop every non-alphabetic character.
    Alphabetic,
}

impl Normalization {
    pub fn apply(&self, lemma: &str) -> String {
        let lower = lemma.to_lowercase();
        match self {
            Normalization::Lowercase => lower,
            Normalization::Alphabetic => lower.chars().filter(|c| c.is_alphabetic()).collect(),
        }
    }
}

/// Content-word filter. Built from `AnalysisConfig::admission_filter`.
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    pub stop_pos: HashSet<String>,
    /// Stored lower-cased.
    pub blacklist: HashSet<String>,
    pub placeholder: String,
    pub min_lemma_len: usize,
    pub normalization: Normalization,
    /// Reject tokens whose document is `Unclassified`.
    pub require_provenance: bool,
    /// Only admit tokens whose document carries this label.
    pub author: Option<String>,
}

impl Default for AdmissionFilter {
    fn default() -> Self {
        AdmissionFilter {
            stop_pos: HashSet::new(),
            blacklist: HashSet::new(),
            placeholder: "_".to_string(),
            min_lemma_len: 2,
            normalization: Normalization::Lowercase,
            require_provenance: false,
            author: None,
        }
    }
}

impl AdmissionFilter {
    pub fn with_stop_pos<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_pos = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_blacklist<I, S>(mut self, lemmas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blacklist = lemmas
            .into_iter()
            .map(|l| l.as_ref().to_lowercase())
            .collect();
        self
    }

    /// Whether the provenance label alone already rules the token out.
    pub fn rejects_provenance(&self, context: &Provenance) -> bool {
        if (self.require_provenance || self.author.is_some()) && !context.is_classified() {
            return true;
        }
        match (&self.author, context.label()) {
            (Some(wanted), Some(label)) => wanted != label,
            _ => false,
        }
    }

    /// Normalized lemma if the token is admitted, `None` otherwise.
    ///
    /// ```
    /// use lemma_collocations::admission::{AdmissionFilter, AnnotatedToken};
    /// use lemma_collocations::provenance::Provenance;
    /// let filter = AdmissionFilter::default().with_stop_pos(["PUNCT"]);
    /// let tok = AnnotatedToken::new("Romam", "Roma", "PROPN", 0);
    /// let lemma = filter.admitted_lemma(&tok, &Provenance::Unclassified);
    /// assert_eq!(lemma, Some("roma".to_string()));
    /// ```
    pub fn admitted_lemma(&self, token: &AnnotatedToken, context: &Provenance) -> Option<String> {
        if self.rejects_provenance(context) {
            return None;
        }
        if self.stop_pos.contains(&token.pos_tag) {
            return None;
        }
        let raw = token.lemma.trim();
        if raw.is_empty() || raw == self.placeholder {
            return None;
        }
        let lower = raw.to_lowercase();
        if self.blacklist.contains(&lower) {
            return None;
        }
        let normalized = self.normalization.apply(raw);
        if normalized.is_empty() || normalized.chars().count() < self.min_lemma_len {
            return None;
        }
        if normalized != lower && self.blacklist.contains(&normalized) {
            return None;
        }
        Some(normalized)
    }

    pub fn admit(&self, token: &AnnotatedToken, context: &Provenance) -> bool {
        self.admitted_lemma(token, context).is_some()
    }
}
