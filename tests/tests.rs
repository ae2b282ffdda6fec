//! Integration tests for `lemma_collocations`.
//
// This suite verifies:
// - Library behavior (CoNLL-U ingestion, provenance scoping, windowed counts, PMI, profiles)
// - CLI behavior including export formats, config layering and failure modes
//
// Notes:
// - CLI tests run the binary with a per-process working directory (no global CWD change).
// - Tests that change global CWD (library-level outputs) are marked #[serial].

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use regex::Regex;
use serde_json::Value as Json;
use serial_test::serial;
use tempfile::tempdir;

use lemma_collocations::{
    AnalysisConfig, CollocationError, ExportFormat, PairKey, PairOrder, Preset, RunOptions,
    StreamScope, analyze_path, analyze_sentences, collect_files, conllu, csv_safe_cell,
    load_corpus,
};

// --------------------- helpers ---------------------

/// Create a file with content in a temp dir.
fn write_file(dir: &assert_fs::TempDir, name: &str, content: &str) -> PathBuf {
    let f = dir.child(name);
    f.write_str(content).unwrap();
    f.path().to_path_buf()
}

/// Read file to string.
fn read_to_string<P: AsRef<Path>>(p: P) -> String {
    fs::read_to_string(p).unwrap()
}

/// Render CoNLL-U: one metadata block, then sentences of `(lemma, upos)`.
fn conllu_doc(metadata: &[&str], sentences: &[&[(&str, &str)]]) -> String {
    let mut out = String::new();
    for line in metadata {
        out.push_str(line);
        out.push('\n');
    }
    for sentence in sentences {
        for (i, (lemma, upos)) in sentence.iter().enumerate() {
            out.push_str(&format!(
                "{}\t{}\t{}\t{}\t_\t_\t0\tdep\t_\t_\n",
                i + 1,
                lemma,
                lemma,
                upos
            ));
        }
        out.push('\n');
    }
    out
}

/// Four-lemma Cicero sentence: rex amat rex regina.
fn cicero_doc() -> String {
    conllu_doc(
        &["# newdoc id = perseus", "# source = phi0474"],
        &[&[
            ("rex", "NOUN"),
            ("amat", "VERB"),
            ("et", "CCONJ"),
            ("rex", "NOUN"),
            (".", "PUNCT"),
            ("regina", "NOUN"),
        ]],
    )
}

fn unrelated_doc() -> String {
    conllu_doc(
        &["# newdoc id = misc", "# note: unrelated"],
        &[&[("miles", "NOUN"), ("pugnat", "VERB"), ("fortiter", "ADV")]],
    )
}

/// Config with a single window and no count threshold.
fn config(window: usize) -> AnalysisConfig {
    AnalysisConfig {
        windows: vec![window],
        min_occurrence: 1,
        ..AnalysisConfig::from_preset(Preset::Content)
    }
}

/// Run CLI successfully with a specific working directory.
fn run_cli_ok_in(dir: &std::path::Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = assert_cmd::Command::cargo_bin("collocations").unwrap();
    cmd.current_dir(dir);
    cmd.args(args).assert().success()
}

/// Run CLI expecting failure with a specific working directory.
fn run_cli_fail_in(dir: &std::path::Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = assert_cmd::Command::cargo_bin("collocations").unwrap();
    cmd.current_dir(dir);
    cmd.args(args).assert().failure()
}

/// All files in `dir` whose name ends with `suffix`, sorted.
fn files_with_suffix(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(suffix))
                .unwrap_or(false)
        })
        .collect();
    found.sort();
    found
}

/// Find the single file ending with a given suffix (e.g., "_w3_..._pmi.json").
fn find_with_suffix(dir: &Path, suffix: &str) -> PathBuf {
    files_with_suffix(dir, suffix)
        .pop()
        .unwrap_or_else(|| panic!("No file found ending with {}", suffix))
}

fn load_json(p: &Path) -> Json {
    serde_json::from_str(&read_to_string(p)).expect("valid json")
}

// --------------------- library tests ---------------------

#[test]
fn lib_end_to_end_unordered_counts() {
    let sentences = conllu::parse_str(&cicero_doc());
    let mut cfg = config(3);
    cfg.pair_order = PairOrder::Unordered;
    let reports = analyze_sentences(&sentences, &cfg).unwrap();
    let r = &reports[0];

    assert_eq!(r.summary.total_tokens, 4);
    assert_eq!(r.summary.total_pairs, 4);
    assert_eq!(r.summary.unique_pairs, 3);
    let pairs: Vec<(PairKey, u64)> = r.pair_frequencies.clone();
    assert_eq!(
        pairs,
        vec![
            (PairKey("amat".into(), "rex".into()), 2),
            (PairKey("amat".into(), "regina".into()), 1),
            (PairKey("regina".into(), "rex".into()), 1),
        ]
    );
}

#[test]
fn lib_ordered_mode_keeps_direction() {
    let sentences = conllu::parse_str(&cicero_doc());
    let mut cfg = config(3);
    cfg.pair_order = PairOrder::Ordered;
    let r = &analyze_sentences(&sentences, &cfg).unwrap()[0];
    assert_eq!(r.summary.total_pairs, 4);
    assert_eq!(r.summary.unique_pairs, 4);
    assert!(
        r.pair_frequencies
            .iter()
            .any(|(k, _)| k == &PairKey("rex".into(), "amat".into()))
    );
    assert!(
        r.pair_frequencies
            .iter()
            .any(|(k, _)| k == &PairKey("amat".into(), "rex".into()))
    );
}

#[test]
fn lib_threshold_and_ranking() {
    let sentences = conllu::parse_str(&cicero_doc());
    let mut cfg = config(3);
    cfg.min_occurrence = 2;
    let r = &analyze_sentences(&sentences, &cfg).unwrap()[0];
    assert_eq!(r.pmi.len(), 1);
    assert_eq!(r.pmi[0].pair, PairKey("amat".into(), "rex".into()));
    assert!((r.pmi[0].score - 2.0).abs() < 1e-9);
    // frequency tables are not thresholded
    assert_eq!(r.pair_frequencies.len(), 3);
}

#[test]
fn lib_author_scope_excludes_unclassified_documents() {
    let mut text = cicero_doc();
    text.push_str(&unrelated_doc());
    let sentences = conllu::parse_str(&text);

    let open = &analyze_sentences(&sentences, &config(3)).unwrap()[0];
    assert_eq!(open.summary.total_tokens, 7);

    let mut cfg = config(3);
    cfg.author = Some("Cicero".into());
    let scoped = &analyze_sentences(&sentences, &cfg).unwrap()[0];
    assert_eq!(scoped.label, "Cicero");
    assert_eq!(scoped.summary.total_tokens, 4);
    assert!(
        scoped
            .pair_frequencies
            .iter()
            .all(|(k, _)| k.0 != "miles" && k.1 != "miles")
    );

    let mut cfg = config(3);
    cfg.require_provenance = true;
    let classified_only = &analyze_sentences(&sentences, &cfg).unwrap()[0];
    assert_eq!(classified_only.summary.total_tokens, 4);
}

#[test]
fn lib_no_matching_author_is_no_data_not_error() {
    let sentences = conllu::parse_str(&unrelated_doc());
    let mut cfg = config(5);
    cfg.author = Some("Vergil".into());
    let r = &analyze_sentences(&sentences, &cfg).unwrap()[0];
    assert!(r.is_empty());
    assert!(r.pmi.is_empty());
    assert!(r.pair_frequencies.is_empty());
}

#[test]
fn lib_collect_files_filters_and_sorts() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "b.conllu", &cicero_doc());
    write_file(&td, "nested/a.conllu", &unrelated_doc());
    write_file(&td, "notes.txt", "ignore me");
    let files = collect_files(td.path()).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|p| p.extension().unwrap() == "conllu"));

    let empty = tempdir().unwrap();
    assert!(matches!(
        collect_files(empty.path()),
        Err(CollocationError::NoInput(_))
    ));
}

#[test]
fn lib_unreadable_file_is_skipped() {
    let td = assert_fs::TempDir::new().unwrap();
    let good = write_file(&td, "good.conllu", &cicero_doc());
    let missing = td.path().join("vanished.conllu");
    let (docs, failed) = load_corpus(&[missing, good]);
    assert_eq!(docs.len(), 1);
    assert_eq!(failed.len(), 1);
    assert!(failed[0].0.ends_with("vanished.conllu"));
}

#[test]
fn lib_analyze_path_exports_csv_to_out_dir() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "corpus/cicero.conllu", &cicero_doc());
    let out = td.child("out");
    out.create_dir_all().unwrap();

    let options = RunOptions {
        export_format: ExportFormat::Csv,
        out_dir: Some(out.path().to_path_buf()),
        profile: false,
    };
    let outcome = analyze_path(&td.path().join("corpus"), &config(3), &options).unwrap();
    assert_eq!(outcome.files_processed, 1);
    assert!(outcome.failed_files.is_empty());
    assert_eq!(outcome.written.len(), 3);
    assert!(outcome.result.contains("tokens: 4, pairs: 4"));

    let re = Regex::new(r"^corpus_w3_\d{8}_\d{6}_(pmi|pairs|trigrams)\.csv$").unwrap();
    for p in &outcome.written {
        let name = p.file_name().unwrap().to_string_lossy().to_string();
        assert!(re.is_match(&name), "unexpected export name {name}");
    }

    let pairs = read_to_string(find_with_suffix(out.path(), "_pairs.csv"));
    let mut lines = pairs.lines();
    assert_eq!(lines.next(), Some("word1,word2,count"));
    assert_eq!(lines.next(), Some("amat,rex,2"));
}

#[test]
#[serial]
fn lib_analyze_path_defaults_to_current_dir() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "cicero.conllu", &cicero_doc());
    std::env::set_current_dir(td.path()).unwrap();

    let options = RunOptions {
        export_format: ExportFormat::Txt,
        ..RunOptions::default()
    };
    analyze_path(td.path(), &config(3), &options).expect("analysis runs");

    let report = read_to_string(find_with_suffix(td.path(), "_report.txt"));
    assert!(report.contains("TOP COLLOCATIONS (PAIRS) by PMI (Min count: 1)"));
    assert!(report.contains("(amat, rex)"));
    assert!(report.contains("TOP TRIGRAMS"));
}

#[test]
fn lib_reset_per_file_vs_corpus() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(
        &td,
        "1.conllu",
        &conllu_doc(&[], &[&[("arma", "NOUN"), ("virum", "NOUN")]]),
    );
    write_file(
        &td,
        "2.conllu",
        &conllu_doc(&[], &[&[("cano", "VERB"), ("troia", "PROPN")]]),
    );
    let out = tempdir().unwrap();
    let options = RunOptions {
        export_format: ExportFormat::Json,
        out_dir: Some(out.path().to_path_buf()),
        profile: false,
    };

    let mut cfg = config(3);
    cfg.reset = StreamScope::Corpus;
    let joined = analyze_path(td.path(), &cfg, &options).unwrap();
    // arma-virum, arma-cano, virum-cano, virum-troia, cano-troia
    assert_eq!(joined.reports[0].summary.total_pairs, 5);

    cfg.reset = StreamScope::File;
    let split = analyze_path(td.path(), &cfg, &options).unwrap();
    assert_eq!(split.reports[0].summary.total_pairs, 2);
    assert_eq!(split.reports[0].summary.total_tokens, 4);
}

#[test]
fn lib_profiles_per_author() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "a.conllu", &cicero_doc());
    write_file(
        &td,
        "b.conllu",
        &conllu_doc(
            &["# source = Caesar, De Bello Gallico"],
            &[&[("caesar", "PROPN"), ("gallia", "PROPN"), ("gallia", "PROPN")]],
        ),
    );
    write_file(&td, "c.conllu", &unrelated_doc());
    let out = tempdir().unwrap();
    let mut cfg = config(5);
    cfg.profile_min_tokens = 1;
    let options = RunOptions {
        export_format: ExportFormat::Json,
        out_dir: Some(out.path().to_path_buf()),
        profile: true,
    };
    let outcome = analyze_path(td.path(), &cfg, &options).unwrap();
    let labels: Vec<&str> = outcome.profiles.iter().map(|p| p.label.as_str()).collect();
    // Cicero: rex amat rex regina -> 1.5 bits; Caesar: caesar gallia gallia -> ~0.918 bits
    assert_eq!(labels, vec!["Cicero", "Caesar"]);
    let json = load_json(&find_with_suffix(out.path(), "_profile.json"));
    assert_eq!(json[0]["label"], "Cicero");
    assert_eq!(json[0]["tokens"], 4);
}

// --------------------- CLI tests ---------------------

#[test]
fn cli_nonexistent_path_fails() {
    let td = tempdir().unwrap(); // base dir
    let bad = td.path().join("does_not_exist_here");
    run_cli_fail_in(
        td.path(),
        &[bad.to_string_lossy().as_ref(), "--export-format", "csv"],
    )
    .stderr(predicate::str::contains("no .conllu input"));
}

#[test]
fn cli_window_below_two_fails() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "cicero.conllu", &cicero_doc());
    run_cli_fail_in(
        td.path(),
        &[td.path().to_string_lossy().as_ref(), "--window", "1"],
    )
    .stderr(predicate::str::contains("window size must be at least 2"));
}

#[test]
fn cli_basic_run_csv_with_several_windows() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "cicero.conllu", &cicero_doc());

    run_cli_ok_in(
        td.path(),
        &[
            td.path().to_string_lossy().as_ref(),
            "--export-format",
            "csv",
            "--window",
            "3,4,5",
            "--min-occurrence",
            "1",
        ],
    )
    .stdout(predicate::str::contains("window 3").and(predicate::str::contains("window 5")));

    for w in [3, 4, 5] {
        let re = Regex::new(&format!(r"^corpus_w{w}_\d{{8}}_\d{{6}}_pmi\.csv$")).unwrap();
        let found = fs::read_dir(td.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| re.is_match(e.file_name().to_string_lossy().as_ref()));
        assert!(found, "Expected corpus_w{w}_*_pmi.csv in temp dir");
    }
}

#[test]
fn cli_min_lemma_len_below_two_fails() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "cicero.conllu", &cicero_doc());
    run_cli_fail_in(
        td.path(),
        &[
            td.path().to_string_lossy().as_ref(),
            "--normalization",
            "alphabetic",
            "--min-lemma-len",
            "0",
        ],
    )
    .stderr(predicate::str::contains("min_lemma_len must be at least 2"));
}

#[test]
fn cli_export_json_with_author_scope() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "a.conllu", &cicero_doc());
    write_file(&td, "b.conllu", &unrelated_doc());

    run_cli_ok_in(
        td.path(),
        &[
            td.path().to_string_lossy().as_ref(),
            "--export-format",
            "json",
            "--author",
            "Cicero",
            "--window",
            "3",
            "--order",
            "unordered",
            "--min-occurrence",
            "1",
        ],
    );

    let summary = load_json(&find_with_suffix(td.path(), "_summary.json"));
    assert_eq!(summary["total_tokens"], 4);
    assert_eq!(summary["total_pairs"], 4);
    assert_eq!(summary["unique_pairs"], 3);

    let pmi = load_json(&find_with_suffix(td.path(), "_pmi.json"));
    let rows = pmi.as_array().expect("json array");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["word1"], "amat");
    assert_eq!(rows[0]["word2"], "regina");
    assert!((rows[0]["pmi"].as_f64().unwrap() - 2.0).abs() < 1e-9);

    // every export is named after the author label
    assert!(
        files_with_suffix(td.path(), ".json")
            .iter()
            .all(|p| p.file_name().unwrap().to_string_lossy().starts_with("cicero_w3_"))
    );
}

#[test]
fn cli_unknown_author_fails() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "a.conllu", &cicero_doc());
    run_cli_fail_in(
        td.path(),
        &[td.path().to_string_lossy().as_ref(), "--author", "Homer"],
    )
    .stderr(predicate::str::contains("matches no provenance rule"));
}

#[test]
fn cli_config_file_and_blacklist_layering() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "corpus/a.conllu", &cicero_doc());
    let cfg = write_file(
        &td,
        "config.json",
        r#"{ "windows": [2], "pair_order": "ordered", "min_occurrence": 1 }"#,
    );
    let blacklist = write_file(&td, "blacklist.txt", "Regina\n");

    run_cli_ok_in(
        td.path(),
        &[
            td.path().join("corpus").to_string_lossy().as_ref(),
            "--config",
            cfg.to_str().unwrap(),
            "--blacklist",
            blacklist.to_str().unwrap(),
            "--export-format",
            "tsv",
        ],
    );

    // stream: rex amat rex ; window 2, ordered -> rex>amat, amat>rex
    let name = find_with_suffix(td.path(), "_pairs.tsv");
    assert!(name.file_name().unwrap().to_string_lossy().starts_with("corpus_w2_"));
    let pairs = read_to_string(find_with_suffix(td.path(), "_pairs.tsv"));
    let rows: Vec<&str> = pairs.lines().skip(1).collect();
    assert_eq!(rows, vec!["amat\trex\t1", "rex\tamat\t1"]);
}

#[test]
fn cli_flags_override_config_file() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "corpus/a.conllu", &cicero_doc());
    let cfg = write_file(&td, "config.json", r#"{ "windows": [2] }"#);

    run_cli_ok_in(
        td.path(),
        &[
            td.path().join("corpus").to_string_lossy().as_ref(),
            "--config",
            cfg.to_str().unwrap(),
            "--window",
            "4",
            "--export-format",
            "csv",
        ],
    );
    assert!(files_with_suffix(td.path(), "_pairs.csv").iter().all(|p| {
        p.file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("corpus_w4_")
    }));
    assert_eq!(files_with_suffix(td.path(), "_pairs.csv").len(), 1);
}

#[test]
fn cli_invalid_config_file_fails() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "a.conllu", &cicero_doc());
    let cfg = write_file(&td, "config.json", r#"{ "reset": "sentence" }"#);
    run_cli_fail_in(
        td.path(),
        &[
            td.path().join("a.conllu").to_string_lossy().as_ref(),
            "--config",
            cfg.to_str().unwrap(),
        ],
    )
    .stderr(predicate::str::contains("JSON error"));
}

#[test]
fn cli_empty_stream_reports_no_data() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "b.conllu", &unrelated_doc());
    run_cli_ok_in(
        td.path(),
        &[
            td.path().to_string_lossy().as_ref(),
            "--require-provenance",
            "--export-format",
            "csv",
        ],
    )
    .stdout(predicate::str::contains("No data"));
    assert!(files_with_suffix(td.path(), ".csv").is_empty());
}

#[test]
fn cli_profile_prints_author_table() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "a.conllu", &cicero_doc());
    run_cli_ok_in(
        td.path(),
        &[
            td.path().to_string_lossy().as_ref(),
            "--profile",
            "--profile-min-tokens",
            "1",
        ],
    )
    .stdout(
        predicate::str::contains("Entropy")
            .and(predicate::str::contains("Cicero"))
            .and(predicate::str::contains("1.5000")),
    );
    assert_eq!(files_with_suffix(td.path(), "_profile.txt").len(), 1);
}

// --- Tests to verify sanitizing works ---

#[test]
fn csv_export_neutralizes_formula_lemmas_and_keeps_numbers() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(
        &td,
        "corpus/a.conllu",
        &conllu_doc(
            &[],
            &[&[
                (r#"=HYPERLINK("x")"#, "NOUN"),
                ("rex", "NOUN"),
                ("amat", "VERB"),
            ]],
        ),
    );
    let out = td.child("out");
    out.create_dir_all().unwrap();
    let options = RunOptions {
        export_format: ExportFormat::Csv,
        out_dir: Some(out.path().to_path_buf()),
        profile: false,
    };
    analyze_path(&td.path().join("corpus"), &config(2), &options).unwrap();

    // lemma cell: leading quote added, inner quotes doubled by the CSV writer
    let pairs = read_to_string(find_with_suffix(out.path(), "_pairs.csv"));
    assert!(
        pairs.contains(r#""'=hyperlink(""x"")",rex,1"#),
        "unexpected pairs table: {pairs}"
    );

    // numeric cells are never prefixed
    let pmi = read_to_string(find_with_suffix(out.path(), "_pmi.csv"));
    let mut rdr = csv::Reader::from_reader(pmi.as_bytes());
    for row in rdr.records() {
        let row = row.unwrap();
        assert!(row[2].parse::<u64>().is_ok());
        assert!(row[3].parse::<f64>().is_ok());
    }
}

#[test]
fn csv_safe_cell_leaves_quoted_and_plain_cells_alone() {
    assert_eq!(csv_safe_cell("'@SAFE".to_string()), "'@SAFE");
    assert_eq!(csv_safe_cell("regina".to_string()), "regina");
    assert_eq!(csv_safe_cell("@cmd".to_string()), "'@cmd");
}
