//! Maps a block of document metadata to an author/work label.
//!
//! Rules are plain data: an ordered list of `{label, markers}` groups. The first group with a
//! marker contained in the joined metadata text wins; nothing matching yields
//! [`Provenance::Unclassified`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label assigned to a sentence or document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Provenance {
    Label(String),
    Unclassified,
}

impl Provenance {
    pub fn is_classified(&self) -> bool {
        matches!(self, Provenance::Label(_))
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Provenance::Label(l) => Some(l),
            Provenance::Unclassified => None,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Label(l) => f.write_str(l),
            Provenance::Unclassified => f.write_str("unclassified"),
        }
    }
}

/// One rule group: any of `markers` found in the metadata selects `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRule {
    pub label: String,
    pub markers: Vec<String>,
}

impl ProvenanceRule {
    pub fn new(label: &str, markers: &[&str]) -> Self {
        ProvenanceRule {
            label: label.to_string(),
            markers: markers.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Ordered substring-rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceClassifier {
    pub rules: Vec<ProvenanceRule>,
    pub case_sensitive: bool,
}

impl Default for ProvenanceClassifier {
    /// Classical Latin authors keyed by PHI catalog id, name and a few work titles.
    fn default() -> Self {
        ProvenanceClassifier {
            rules: vec![
                ProvenanceRule::new(
                    "Cicero",
                    &[
                        "phi0474",
                        "Cicero",
                        "Atticum",
                        "Officiis",
                        "Catilinam",
                        "Archia",
                        "Murena",
                        "Sestio",
                        "Verr",
                    ],
                ),
                ProvenanceRule::new("Caesar", &["phi0448", "Caesar", "Gallico"]),
                ProvenanceRule::new("Vergil", &["phi0690", "Vergil", "Aeneid"]),
                ProvenanceRule::new("Ovid", &["phi0959", "Ovid", "Metamorphoses"]),
                ProvenanceRule::new("Jerome (Vulgate)", &["Jerome", "Vulgate", "Testamentum"]),
            ],
            case_sensitive: false,
        }
    }
}

impl ProvenanceClassifier {
    pub fn new(rules: Vec<ProvenanceRule>, case_sensitive: bool) -> Self {
        ProvenanceClassifier {
            rules,
            case_sensitive,
        }
    }

    /// Classify a metadata block. Empty input is always `Unclassified`.
    ///
    /// ```
    /// use lemma_collocations::provenance::{Provenance, ProvenanceClassifier};
    /// let classifier = ProvenanceClassifier::default();
    /// let meta = vec!["# source: phi0474".to_string()];
    /// assert_eq!(classifier.classify(&meta), Provenance::Label("Cicero".to_string()));
    /// assert_eq!(classifier.classify::<String>(&[]), Provenance::Unclassified);
    /// ```
    pub fn classify<S: AsRef<str>>(&self, metadata_lines: &[S]) -> Provenance {
        if metadata_lines.is_empty() {
            return Provenance::Unclassified;
        }
        let joined = metadata_lines
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<&str>>()
            .join(" ");
        let haystack = if self.case_sensitive {
            joined
        } else {
            joined.to_lowercase()
        };

        for rule in &self.rules {
            let hit = rule.markers.iter().any(|marker| {
                if marker.is_empty() {
                    // an empty marker would match everything
                    false
                } else if self.case_sensitive {
                    haystack.contains(marker.as_str())
                } else {
                    haystack.contains(&marker.to_lowercase())
                }
            });
            if hit {
                return Provenance::Label(rule.label.clone());
            }
        }
        Provenance::Unclassified
    }
}
