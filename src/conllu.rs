//! Minimal CoNLL-U reader: enough to get `(form, lemma, upos)` per word plus the comment
//! lines that precede each sentence.
//!
//! Comments in a block containing `# newdoc` (minus its `sent_id`/`text` lines) are document
//! metadata and are attached to every sentence of that document. Other comments belong to the
//! next sentence only.

use log::debug;
use std::fs;
use std::path::Path;

use crate::admission::AnnotatedToken;
use crate::error::{CollocationError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sentence {
    pub metadata: Vec<String>,
    pub tokens: Vec<AnnotatedToken>,
}

#[derive(Default)]
struct ParseState {
    sentences: Vec<Sentence>,
    document: Vec<String>,
    comments: Vec<String>,
    comments_open_document: bool,
    tokens: Vec<AnnotatedToken>,
}

impl ParseState {
    fn comment(&mut self, line: &str) {
        if !self.tokens.is_empty() {
            // comment without a separating blank line still starts a new sentence
            self.end_sentence();
        }
        if line.starts_with("# newdoc") {
            self.comments_open_document = true;
        }
        self.comments.push(line.to_string());
    }

    fn end_sentence(&mut self) {
        if self.tokens.is_empty() {
            return;
        }
        let metadata = if self.comments_open_document {
            self.comments_open_document = false;
            self.document = self
                .comments
                .iter()
                .filter(|c| !is_sentence_comment(c))
                .cloned()
                .collect();
            std::mem::take(&mut self.comments)
        } else {
            let mut metadata = self.document.clone();
            metadata.append(&mut self.comments);
            metadata
        };
        self.sentences.push(Sentence {
            metadata,
            tokens: std::mem::take(&mut self.tokens),
        });
    }

    fn token(&mut self, line: &str, line_no: usize) {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            debug!("line {line_no}: {} field(s), record skipped", fields.len());
            return;
        }
        let id = fields[0];
        if id.contains('-') || id.contains('.') {
            // multi-word range or empty node
            return;
        }
        let index = self.tokens.len();
        self.tokens
            .push(AnnotatedToken::new(fields[1], fields[2], fields[3], index));
    }
}

fn is_sentence_comment(line: &str) -> bool {
    line.starts_with("# sent_id") || line.starts_with("# text")
}

/// Parse CoNLL-U text. Malformed records are skipped, never fatal.
pub fn parse_str(input: &str) -> Vec<Sentence> {
    let mut state = ParseState::default();
    for (n, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            state.end_sentence();
        } else if line.starts_with('#') {
            state.comment(line);
        } else {
            state.token(line, n + 1);
        }
    }
    state.end_sentence();
    state.sentences
}

/// Read and parse one file. Invalid UTF-8 is replaced rather than rejected.
pub fn read_file(path: &Path) -> Result<Vec<Sentence>> {
    let bytes = fs::read(path).map_err(|e| CollocationError::io(path, e))?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(parse_str(&text))
}
