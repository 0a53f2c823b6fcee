//! Error types for disparity-harness.

use std::path::PathBuf;
use thiserror::Error;

/// Run-level error. Raised before any case executes.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Malformed or missing run parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A case file that could not be read or parsed.
    #[error("case source {path}: {reason}")]
    CaseSource { path: PathBuf, reason: String },

    /// Filesystem error.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl HarnessError {
    /// Creates a new Configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    /// Creates a new CaseSource error.
    pub fn case_source(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CaseSource {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new Io error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a new Json error.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;
