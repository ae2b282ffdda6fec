#![forbid(unsafe_code)]
//! # lemma_collocations
//!
//! Collocation extraction over lemmatized, POS-tagged corpora (CoNLL-U).
//!
//! The pipeline runs strictly forward:
//! provenance classification → token admission → lemma streams → windowed pair/trigram
//! counting → PMI scoring → ranked reports.
//!
//! ```
//! use lemma_collocations::{AnalysisConfig, analyze_sentences, conllu};
//!
//! let input = "# source = phi0474\n\
//!     1\tRex\trex\tNOUN\n2\tamat\tamo\tVERB\n3\treginam\tregina\tNOUN\n";
//! let mut config = AnalysisConfig::default();
//! config.windows = vec![3];
//! config.min_occurrence = 1;
//! let reports = analyze_sentences(&conllu::parse_str(input), &config).unwrap();
//! assert_eq!(reports[0].summary.total_pairs, 3);
//! ```

use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub mod admission;
pub mod config;
pub mod conllu;
pub mod cooccurrence;
mod error;
pub mod pmi;
pub mod profile;
pub mod provenance;
pub mod report;
pub mod stream;

pub use admission::{AdmissionFilter, AnnotatedToken, Normalization};
pub use config::{AnalysisConfig, Preset};
pub use conllu::Sentence;
pub use cooccurrence::{
    CooccurrenceCounter, CooccurrenceCounts, FrequencyTable, PairKey, PairOrder, TrigramKey,
};
pub use error::{CollocationError, Result};
pub use pmi::PmiRecord;
pub use profile::LexicalProfile;
pub use provenance::{Provenance, ProvenanceClassifier, ProvenanceRule};
pub use report::{AnalysisReport, ExportFormat, Summary, csv_safe_cell};
pub use stream::{LemmaStream, LemmaStreamBuilder, StreamScope};

/// Label used for reports that are not scoped to one author.
pub const CORPUS_LABEL: &str = "corpus";

/// Parsed sentences of one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: String,
    pub sentences: Vec<Sentence>,
}

/// How `analyze_path` writes its results.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub export_format: ExportFormat,
    /// Defaults to the current directory.
    pub out_dir: Option<PathBuf>,
    /// Also compute per-author lexical profiles.
    pub profile: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            export_format: ExportFormat::Txt,
            out_dir: None,
            profile: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisOutcome {
    /// Printable summary of the run.
    pub result: String,
    pub reports: Vec<AnalysisReport>,
    pub profiles: Vec<LexicalProfile>,
    pub files_processed: usize,
    /// `(path, reason)` for every file that could not be read.
    pub failed_files: Vec<(String, String)>,
    pub written: Vec<PathBuf>,
}

/// A single file is taken as is; a directory is walked recursively for `*.conllu` files,
/// in file-name order so stream order is reproducible.
pub fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(CollocationError::NoInput(path.to_path_buf()));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let files: Vec<PathBuf> = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!("Skipping directory entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "conllu"))
        .collect();
    if files.is_empty() {
        return Err(CollocationError::NoInput(path.to_path_buf()));
    }
    Ok(files)
}

/// Parse all files in parallel. Unreadable files are reported, not fatal.
pub fn load_corpus(files: &[PathBuf]) -> (Vec<SourceDocument>, Vec<(String, String)>) {
    let parsed: Vec<(String, Result<Vec<Sentence>>)> = files
        .par_iter()
        .map(|p| (p.display().to_string(), conllu::read_file(p)))
        .collect();

    let mut documents = Vec::with_capacity(parsed.len());
    let mut failed = Vec::new();
    for (path, res) in parsed {
        match res {
            Ok(sentences) => {
                debug!("{path}: {} sentence(s)", sentences.len());
                documents.push(SourceDocument { path, sentences });
            }
            Err(e) => {
                warn!("Skipping {path}: {e}");
                failed.push((path, e.to_string()));
            }
        }
    }
    (documents, failed)
}

/// Run the admission filter over every token and build the lemma streams.
pub fn build_streams(documents: &[SourceDocument], config: &AnalysisConfig) -> Vec<LemmaStream> {
    let filter = config.admission_filter();
    let mut builder = LemmaStreamBuilder::new(config.reset);
    for doc in documents {
        for sentence in &doc.sentences {
            let provenance = config.provenance.classify(&sentence.metadata);
            if filter.rejects_provenance(&provenance) {
                continue;
            }
            for token in &sentence.tokens {
                if let Some(lemma) = filter.admitted_lemma(token, &provenance) {
                    builder.append(lemma, &doc.path);
                }
            }
        }
    }
    info!("Admitted {} lemma(s)", builder.total_lemmas());
    builder.finish()
}

/// Count and score the documents once per configured window size.
pub fn analyze_documents(
    documents: &[SourceDocument],
    config: &AnalysisConfig,
) -> Result<Vec<AnalysisReport>> {
    config.validate()?;
    let streams = build_streams(documents, config);
    if streams.is_empty() {
        warn!("Lemma stream is empty: no token passed the filters");
    }
    let label = config.author.as_deref().unwrap_or(CORPUS_LABEL);

    let mut reports = Vec::with_capacity(config.windows.len());
    for &window in &config.windows {
        let counter = CooccurrenceCounter::new(window, config.pair_order)?;
        // merged over every stream before any scoring
        let counts = counter.count_streams(&streams);
        info!(
            "Window {window}: {} pair(s), {} unique",
            counts.total_pairs(),
            counts.pairs.len()
        );
        reports.push(AnalysisReport::from_counts(
            label,
            window,
            config.pair_order,
            &counts,
            config.min_occurrence,
        ));
    }
    Ok(reports)
}

/// [`analyze_documents`] for sentences that do not come from files.
pub fn analyze_sentences(
    sentences: &[Sentence],
    config: &AnalysisConfig,
) -> Result<Vec<AnalysisReport>> {
    let doc = SourceDocument {
        path: "input".to_string(),
        sentences: sentences.to_vec(),
    };
    analyze_documents(std::slice::from_ref(&doc), config)
}

/// Lexical profile per provenance label. `author` and `require_provenance` are ignored:
/// every classified label gets its own profile.
pub fn profile_documents(
    documents: &[SourceDocument],
    config: &AnalysisConfig,
) -> Vec<LexicalProfile> {
    let mut filter = config.admission_filter();
    filter.author = None;
    filter.require_provenance = true;

    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for doc in documents {
        for sentence in &doc.sentences {
            let provenance = config.provenance.classify(&sentence.metadata);
            let Some(label) = provenance.label() else {
                continue;
            };
            let lemmas = sentence
                .tokens
                .iter()
                .filter_map(|t| filter.admitted_lemma(t, &provenance));
            groups.entry(label.to_string()).or_default().extend(lemmas);
        }
    }
    profile::profile_by_label(&groups, config.profile_min_tokens)
}

/// Read, analyze and export everything under `path`.
pub fn analyze_path(
    path: &Path,
    config: &AnalysisConfig,
    options: &RunOptions,
) -> Result<AnalysisOutcome> {
    config.validate()?;
    let files = collect_files(path)?;
    info!("Found {} file(s) under {}", files.len(), path.display());

    let (documents, failed_files) = load_corpus(&files);
    let reports = analyze_documents(&documents, config)?;
    let profiles = if options.profile {
        profile_documents(&documents, config)
    } else {
        Vec::new()
    };

    let out_dir = options.out_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut written = Vec::new();
    let mut result = String::new();
    for report in &reports {
        result.push_str(&report::render_summary(report));
        result.push('\n');
        if report.is_empty() {
            continue;
        }
        written.extend(report::export_report(
            report,
            options.export_format,
            config.top,
            &out_dir,
        )?);
    }
    if options.profile {
        if profiles.is_empty() {
            result.push_str(&format!(
                "No author reached {} token(s) for a profile.\n",
                config.profile_min_tokens
            ));
        } else {
            result.push_str(&report::render_profiles(&profiles));
            written.push(report::export_profiles(
                &profiles,
                options.export_format,
                &out_dir,
            )?);
        }
    }

    Ok(AnalysisOutcome {
        result,
        reports,
        profiles,
        files_processed: documents.len(),
        failed_files,
        written,
    })
}

pub fn print_failed_files(failed: &[(String, String)]) {
    eprintln!("\n{} file(s) could not be processed:", failed.len());
    for (path, reason) in failed {
        eprintln!("  {path}: {reason}");
    }
}
