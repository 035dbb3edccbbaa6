//! Error types for the benchmark harness.
//!
//! Only failures of the harness itself are errors. A trial whose executable
//! crashes, hangs, or writes nothing is recorded as a failed
//! [`TrialRecord`](crate::TrialRecord) instead.

use std::path::PathBuf;

use matbench_config::ConfigError;
use matbench_core::MatrixError;
use thiserror::Error;

/// Harness-level error.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The build step failed; nothing downstream is meaningful.
    #[error("Build failed: {0}")]
    BuildFailure(String),

    /// An expected artifact was not produced.
    #[error("Missing artifact: {}", path.display())]
    MissingArtifact { path: PathBuf },

    /// A timing-results file could not be parsed.
    #[error("Malformed timing file at line {line}: {message}")]
    MalformedTiming { line: usize, message: String },

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BenchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BenchError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, BenchError>;
