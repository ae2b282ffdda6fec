//! Ordered lemma sequences and the scope boundary policy.
//!
//! Sentence boundaries never split a stream. Scope boundaries (one input file) split it only
//! when the builder runs with [`StreamScope::File`].

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Where a stream is allowed to reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum StreamScope {
    /// One stream for the whole corpus.
    #[default]
    Corpus,
    /// A fresh stream per input file.
    File,
}

/// Admitted lemmas in original token order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LemmaStream {
    pub scope: String,
    pub lemmas: Vec<String>,
}

impl LemmaStream {
    pub fn new(scope: &str, lemmas: Vec<String>) -> Self {
        LemmaStream {
            scope: scope.to_string(),
            lemmas,
        }
    }

    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for LemmaStream {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        LemmaStream {
            scope: CORPUS_SCOPE.to_string(),
            lemmas: iter.into_iter().map(Into::into).collect(),
        }
    }
}

const CORPUS_SCOPE: &str = "corpus";

#[derive(Debug)]
pub struct LemmaStreamBuilder {
    scope: StreamScope,
    finished: Vec<LemmaStream>,
    active: Option<LemmaStream>,
}

impl LemmaStreamBuilder {
    pub fn new(scope: StreamScope) -> Self {
        LemmaStreamBuilder {
            scope,
            finished: Vec::new(),
            active: None,
        }
    }

    /// Append one admitted lemma coming from `scope_id` (usually the file path).
    pub fn append(&mut self, lemma: String, scope_id: &str) {
        let key = match self.scope {
            StreamScope::Corpus => CORPUS_SCOPE,
            StreamScope::File => scope_id,
        };
        if let Some(stream) = self.active.as_mut().filter(|s| s.scope == key) {
            stream.lemmas.push(lemma);
            return;
        }
        if let Some(done) = self.active.take() {
            self.finished.push(done);
        }
        self.active = Some(LemmaStream::new(key, vec![lemma]));
    }

    pub fn extend<I: IntoIterator<Item = String>>(&mut self, lemmas: I, scope_id: &str) {
        for lemma in lemmas {
            self.append(lemma, scope_id);
        }
    }

    /// Total lemmas appended so far.
    pub fn total_lemmas(&self) -> usize {
        self.finished.iter().map(LemmaStream::len).sum::<usize>()
            + self.active.as_ref().map_or(0, LemmaStream::len)
    }

    pub fn finish(mut self) -> Vec<LemmaStream> {
        if let Some(done) = self.active.take() {
            self.finished.push(done);
        }
        self.finished
    }
}
