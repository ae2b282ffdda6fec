//! Ranked result tables and their renderings (text tables, CSV/TSV, JSON).

use chrono::prelude::*;
use clap::ValueEnum;
use csv::WriterBuilder;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::cooccurrence::{CooccurrenceCounts, PairKey, PairOrder, TrigramKey};
use crate::error::{CollocationError, Result};
use crate::pmi::{PmiRecord, score_counts};
use crate::profile::LexicalProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Txt,
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub window: usize,
    pub pair_order: PairOrder,
    pub min_occurrence: u64,
    pub total_tokens: u64,
    pub total_pairs: u64,
    pub unique_pairs: usize,
    pub unique_trigrams: usize,
}

/// Three ranked sequences plus summary scalars for one label and window size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub label: String,
    pub summary: Summary,
    pub pmi: Vec<PmiRecord>,
    pub pair_frequencies: Vec<(PairKey, u64)>,
    pub trigram_frequencies: Vec<(TrigramKey, u64)>,
}

impl AnalysisReport {
    /// Rank merged counts. Must only be called once all partial tables are merged.
    pub fn from_counts(
        label: &str,
        window: usize,
        pair_order: PairOrder,
        counts: &CooccurrenceCounts,
        min_occurrence: u64,
    ) -> Self {
        AnalysisReport {
            label: label.to_string(),
            summary: Summary {
                window,
                pair_order,
                min_occurrence,
                total_tokens: counts.total_unigrams(),
                total_pairs: counts.total_pairs(),
                unique_pairs: counts.pairs.len(),
                unique_trigrams: counts.trigrams.len(),
            },
            pmi: score_counts(counts, min_occurrence),
            pair_frequencies: counts.pairs.ranked(),
            trigram_frequencies: counts.trigrams.ranked(),
        }
    }

    /// No admitted lemma at all.
    pub fn is_empty(&self) -> bool {
        self.summary.total_tokens == 0
    }

    pub fn window(&self) -> usize {
        self.summary.window
    }
}

/// Neutralize spreadsheet formula injection: cells starting with `= + - @` (or a tab/CR) get a
/// leading `'`. Cells that already start with `'` are left alone.
pub fn csv_safe_cell(cell: String) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@' | '\t' | '\r') => format!("'{cell}"),
        _ => cell,
    }
}

const RULE: usize = 60;

/// Short summary printed to stdout after a run.
pub fn render_summary(report: &AnalysisReport) -> String {
    let s = &report.summary;
    if report.is_empty() {
        return format!(
            "[{} | window {}] No data: no lemma passed the filters.",
            report.label, s.window
        );
    }
    let mut out = format!(
        "[{} | window {}] tokens: {}, pairs: {}, unique pairs: {}, scored pairs (min count {}): {}",
        report.label,
        s.window,
        s.total_tokens,
        s.total_pairs,
        s.unique_pairs,
        s.min_occurrence,
        report.pmi.len()
    );
    if let Some(best) = report.pmi.first() {
        let _ = write!(out, "\n  top PMI: {} = {:.2} ({}x)", best.pair, best.score, best.count);
    }
    out
}

/// Full fixed-width text report, every section truncated to `top` rows.
pub fn render_text(report: &AnalysisReport, top: usize) -> String {
    let s = &report.summary;
    let heavy = "=".repeat(RULE);
    let light = "-".repeat(RULE);
    let mut out = String::new();

    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(
        out,
        "COLLOCATIONS: {} (window {}, {:?} pairs)",
        report.label, s.window, s.pair_order
    );
    let _ = writeln!(out, "{heavy}\n");
    let _ = writeln!(out, "Total Filtered Tokens: {}", s.total_tokens);
    let _ = writeln!(out, "Total Pairs: {}", s.total_pairs);
    let _ = writeln!(out, "Unique Pairs Found: {}\n", s.unique_pairs);

    if report.is_empty() {
        let _ = writeln!(out, "No data.");
        return out;
    }

    let _ = writeln!(
        out,
        "TOP COLLOCATIONS (PAIRS) by PMI (Min count: {})",
        s.min_occurrence
    );
    let _ = writeln!(out, "{light}");
    let _ = writeln!(out, "{:<30} | {:<10} | {:<5}", "Collocation", "PMI", "Count");
    let _ = writeln!(out, "{light}");
    for r in report.pmi.iter().take(top) {
        let _ = writeln!(
            out,
            "{:<30} | {:>10.2} | {:>5}",
            r.pair.to_string(),
            r.score,
            r.count
        );
    }

    let _ = writeln!(out, "\n{heavy}");
    let _ = writeln!(out, "TOP FREQUENT PAIRS (Raw Count)");
    let _ = writeln!(out, "{light}");
    let _ = writeln!(out, "{:<30} | {:<5}", "Pair", "Count");
    let _ = writeln!(out, "{light}");
    for (pair, count) in report.pair_frequencies.iter().take(top) {
        let _ = writeln!(out, "{:<30} | {:>5}", pair.to_string(), count);
    }

    let _ = writeln!(out, "\n{heavy}");
    let _ = writeln!(out, "TOP TRIGRAMS (3-Word Phrases) by FREQUENCY");
    let _ = writeln!(out, "{heavy}");
    for (trigram, count) in report.trigram_frequencies.iter().take(top) {
        let _ = writeln!(out, "{:<45} | {:>5}", trigram.to_string(), count);
    }
    out
}

pub fn render_profiles(profiles: &[LexicalProfile]) -> String {
    let rule = "-".repeat(65);
    let mut out = String::new();
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "{:<20} | {:<10} | {:<8} | {:<8} | {:<6}",
        "Author", "Tokens", "Unique", "Entropy", "TTR"
    );
    let _ = writeln!(out, "{rule}");
    for p in profiles {
        let _ = writeln!(
            out,
            "{:<20} | {:<10} | {:<8} | {:<8.4} | {:.4}",
            p.label, p.tokens, p.unique, p.entropy, p.ttr
        );
    }
    let _ = writeln!(out, "{rule}");
    out
}

/// Lower-case, anything but letters and digits becomes `_`.
pub fn file_stem(label: &str) -> String {
    let slug: String = label
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = slug.trim_matches('_');
    if trimmed.is_empty() {
        "corpus".to_string()
    } else {
        trimmed.to_string()
    }
}

fn timestamp() -> String {
    let local: DateTime<Local> = Local::now();
    local.format("%Y%m%d_%H%M%S").to_string()
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| CollocationError::io(path, e))
}

fn write_string(path: &Path, content: &str) -> Result<()> {
    let mut w = create(path)?;
    w.write_all(content.as_bytes())
        .and_then(|_| w.flush())
        .map_err(|e| CollocationError::io(path, e))
}

/// Rows are written as given: callers pass text columns through [`csv_safe_cell`] and leave
/// numeric columns alone.
fn write_delimited(
    path: &Path,
    delimiter: u8,
    header: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(create(path)?);
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush().map_err(|e| CollocationError::io(path, e))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut w = create(path)?;
    serde_json::to_writer_pretty(&mut w, value)?;
    w.flush().map_err(|e| CollocationError::io(path, e))
}

#[derive(Serialize)]
struct PairRow<'a> {
    word1: &'a str,
    word2: &'a str,
    count: u64,
}

#[derive(Serialize)]
struct PmiRow<'a> {
    word1: &'a str,
    word2: &'a str,
    count: u64,
    pmi: f64,
}

#[derive(Serialize)]
struct TrigramRow<'a> {
    word1: &'a str,
    word2: &'a str,
    word3: &'a str,
    count: u64,
}

/// Write one report into `out_dir`; returns the paths written.
///
/// Names follow `<label>_w<window>_<YYYYMMDD_HHMMSS>_<table>.<ext>`.
pub fn export_report(
    report: &AnalysisReport,
    format: ExportFormat,
    top: usize,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let prefix = format!(
        "{}_w{}_{}",
        file_stem(&report.label),
        report.window(),
        timestamp()
    );
    let ext = format.extension();
    let path_for = |table: &str| out_dir.join(format!("{prefix}_{table}.{ext}"));

    let pmi = report.pmi.iter().take(top);
    let pairs = report.pair_frequencies.iter().take(top);
    let trigrams = report.trigram_frequencies.iter().take(top);

    match format {
        ExportFormat::Txt => {
            let path = path_for("report");
            write_string(&path, &render_text(report, top))?;
            Ok(vec![path])
        }
        ExportFormat::Csv | ExportFormat::Tsv => {
            let delimiter = if format == ExportFormat::Csv { b',' } else { b'\t' };
            let (pmi_path, pairs_path, tri_path) =
                (path_for("pmi"), path_for("pairs"), path_for("trigrams"));
            write_delimited(
                &pmi_path,
                delimiter,
                &["word1", "word2", "count", "pmi"],
                pmi.map(|r| {
                    vec![
                        csv_safe_cell(r.pair.0.clone()),
                        csv_safe_cell(r.pair.1.clone()),
                        r.count.to_string(),
                        format!("{:.4}", r.score),
                    ]
                }),
            )?;
            write_delimited(
                &pairs_path,
                delimiter,
                &["word1", "word2", "count"],
                pairs.map(|(k, n)| {
                    vec![
                        csv_safe_cell(k.0.clone()),
                        csv_safe_cell(k.1.clone()),
                        n.to_string(),
                    ]
                }),
            )?;
            write_delimited(
                &tri_path,
                delimiter,
                &["word1", "word2", "word3", "count"],
                trigrams.map(|(k, n)| {
                    vec![
                        csv_safe_cell(k.0.clone()),
                        csv_safe_cell(k.1.clone()),
                        csv_safe_cell(k.2.clone()),
                        n.to_string(),
                    ]
                }),
            )?;
            Ok(vec![pmi_path, pairs_path, tri_path])
        }
        ExportFormat::Json => {
            let paths = [
                path_for("summary"),
                path_for("pmi"),
                path_for("pairs"),
                path_for("trigrams"),
            ];
            write_json(&paths[0], &report.summary)?;
            let pmi_rows: Vec<PmiRow> = pmi
                .map(|r| PmiRow {
                    word1: &r.pair.0,
                    word2: &r.pair.1,
                    count: r.count,
                    pmi: r.score,
                })
                .collect();
            write_json(&paths[1], &pmi_rows)?;
            let pair_rows: Vec<PairRow> = pairs
                .map(|(k, n)| PairRow {
                    word1: &k.0,
                    word2: &k.1,
                    count: *n,
                })
                .collect();
            write_json(&paths[2], &pair_rows)?;
            let tri_rows: Vec<TrigramRow> = trigrams
                .map(|(k, n)| TrigramRow {
                    word1: &k.0,
                    word2: &k.1,
                    word3: &k.2,
                    count: *n,
                })
                .collect();
            write_json(&paths[3], &tri_rows)?;
            Ok(paths.to_vec())
        }
    }
}

pub fn export_profiles(
    profiles: &[LexicalProfile],
    format: ExportFormat,
    out_dir: &Path,
) -> Result<PathBuf> {
    let path = out_dir.join(format!(
        "authors_{}_profile.{}",
        timestamp(),
        format.extension()
    ));
    match format {
        ExportFormat::Txt => write_string(&path, &render_profiles(profiles))?,
        ExportFormat::Csv | ExportFormat::Tsv => {
            let delimiter = if format == ExportFormat::Csv { b',' } else { b'\t' };
            write_delimited(
                &path,
                delimiter,
                &["author", "tokens", "unique", "entropy", "ttr"],
                profiles.iter().map(|p| {
                    vec![
                        csv_safe_cell(p.label.clone()),
                        p.tokens.to_string(),
                        p.unique.to_string(),
                        format!("{:.4}", p.entropy),
                        format!("{:.4}", p.ttr),
                    ]
                }),
            )?
        }
        ExportFormat::Json => write_json(&path, profiles)?,
    }
    Ok(path)
}
