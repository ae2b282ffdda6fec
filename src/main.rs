#![forbid(unsafe_code)]
//! # Collocations CLI
//!
//! Command-line interface for the `lemma_collocations` crate.
//! Reads lemmatized, POS-tagged CoNLL-U files and reports candidate collocations:
//! pairs ranked by PMI, pairs ranked by raw count, and adjacent trigrams.
//!
//! ## Features
//! - Start from a content-word preset and override any knob from a JSON file or flags.
//! - Several window sizes in one run (`--window 3,4,5`).
//! - Scope the stream to one author via the provenance marker table (`--author Cicero`).
//! - Per-author entropy / type-token ratio profile (`--profile`).
//! - Export as txt, csv, tsv or json.
//!
//! ## Example
//! ```bash
//! RUST_LOG=info cargo run --release -- ud_latin_perseus \
//!     --author Cicero --window 3,4,5 --export-format csv
//! ```

use clap::Parser;
use lemma_collocations::{
    AnalysisConfig, ExportFormat, Normalization, PairOrder, Preset, Result, RunOptions,
    StreamScope, analyze_path, print_failed_files,
};
use log::error;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// CoNLL-U file or directory to analyze
    path: String,

    /// Content-word preset the configuration starts from
    #[arg(long, value_enum, default_value_t = Preset::Content)]
    preset: Preset,

    /// JSON configuration file; only the keys it contains override the preset
    #[arg(long)]
    config: Option<PathBuf>,

    /// Additional blacklisted lemmas (.txt, one lemma per line)
    #[arg(long)]
    blacklist: Option<PathBuf>,

    /// Pair window size(s), comma separated (e.g. 3,4,5)
    #[arg(long, value_delimiter = ',')]
    window: Vec<usize>,

    /// Pair identity: keep observed order or merge A-B with B-A
    #[arg(long, value_enum)]
    order: Option<PairOrder>,

    /// POS tags to drop, comma separated (replaces the preset list)
    #[arg(long, value_delimiter = ',')]
    stop_pos: Vec<String>,

    /// Lemma normalization before the length check
    #[arg(long, value_enum)]
    normalization: Option<Normalization>,

    /// Minimum normalized lemma length
    #[arg(long)]
    min_lemma_len: Option<usize>,

    /// Minimum pair count for a PMI score
    #[arg(long)]
    min_occurrence: Option<u64>,

    /// Whether lemma streams reset at file boundaries
    #[arg(long, value_enum)]
    reset: Option<StreamScope>,

    /// Only analyze documents whose metadata classifies as this author label
    #[arg(long)]
    author: Option<String>,

    /// Drop tokens from documents no provenance rule matches
    #[arg(long, default_value_t = false)]
    require_provenance: bool,

    /// Rows per exported table
    #[arg(long)]
    top: Option<usize>,

    /// Output format for export (txt, csv, tsv, json)
    #[arg(long, default_value = "txt")]
    export_format: ExportFormat,

    /// Directory for exported files (default: current directory)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Also report entropy and type-token ratio per author
    #[arg(long, default_value_t = false)]
    profile: bool,

    /// Minimum lemma count for an author to appear in the profile
    #[arg(long)]
    profile_min_tokens: Option<u64>,
}

fn build_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = AnalysisConfig::from_preset(cli.preset);
    if let Some(path) = &cli.config {
        config = config.merge_file(path)?;
    }
    if let Some(path) = &cli.blacklist {
        config.extend_blacklist_file(path)?;
    }
    if !cli.window.is_empty() {
        config.windows = cli.window.clone();
    }
    if !cli.stop_pos.is_empty() {
        config.stop_pos = cli.stop_pos.iter().map(|t| t.trim().to_string()).collect();
    }
    if let Some(order) = cli.order {
        config.pair_order = order;
    }
    if let Some(normalization) = cli.normalization {
        config.normalization = normalization;
    }
    if let Some(n) = cli.min_lemma_len {
        config.min_lemma_len = n;
    }
    if let Some(n) = cli.min_occurrence {
        config.min_occurrence = n;
    }
    if let Some(reset) = cli.reset {
        config.reset = reset;
    }
    if cli.author.is_some() {
        config.author = cli.author.clone();
    }
    if cli.require_provenance {
        config.require_provenance = true;
    }
    if let Some(top) = cli.top {
        config.top = top;
    }
    if let Some(n) = cli.profile_min_tokens {
        config.profile_min_tokens = n;
    }
    config.validate()?;
    Ok(config)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Error: {}", e);
            process::exit(1);
        }
    };
    let options = RunOptions {
        export_format: cli.export_format,
        out_dir: cli.out_dir.clone(),
        profile: cli.profile,
    };

    match analyze_path(Path::new(&cli.path), &config, &options) {
        Ok(outcome) => {
            println!("{}", outcome.result);
            if !outcome.failed_files.is_empty() {
                print_failed_files(&outcome.failed_files);
            }
        }
        Err(e) => {
            error!("Error: {}", e);
            process::exit(1);
        }
    }
}
