use std::path::PathBuf;

/// Errors raised by the collocation pipeline.
///
/// Per-file read failures are not represented here: they are collected into
/// `AnalysisOutcome::failed_files` and the run carries on with the next file.
#[derive(thiserror::Error, Debug)]
pub enum CollocationError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no .conllu input found at {0}")]
    NoInput(PathBuf),
    #[error("window size must be at least 2, got {0}")]
    InvalidWindow(usize),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl CollocationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CollocationError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CollocationError>;
