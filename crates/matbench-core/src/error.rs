//! Error types for matbench-core

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building, reading, or multiplying matrices.
#[derive(Debug, Error)]
pub enum MatrixError {
    /// A requested dimension was zero.
    #[error("Invalid dimension: {rows}x{cols} (rows and cols must be at least 1)")]
    InvalidDimension { rows: usize, cols: usize },

    /// The value range for random generation is empty.
    #[error("Invalid value range: [{low}, {high}) is empty")]
    InvalidRange { low: i64, high: i64 },

    /// Operand shapes cannot be multiplied.
    #[error("Dimension mismatch: cannot multiply {a_rows}x{a_cols} by {b_rows}x{b_cols}")]
    DimensionMismatch {
        a_rows: usize,
        a_cols: usize,
        b_rows: usize,
        b_cols: usize,
    },

    /// Flat data does not match the declared shape.
    #[error("Shape error: {rows}x{cols} needs {expected} values, got {actual}")]
    Shape {
        rows: usize,
        cols: usize,
        expected: usize,
        actual: usize,
    },

    /// The reference product left the `i64` range.
    #[error("Arithmetic overflow computing element ({row}, {col})")]
    Overflow { row: usize, col: usize },

    /// Matrix text could not be parsed.
    #[error("Malformed matrix at line {line}: {message}")]
    MalformedMatrix { line: usize, message: String },

    /// Filesystem error with the offending path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MatrixError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MatrixError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        MatrixError::MalformedMatrix {
            line,
            message: message.into(),
        }
    }

    /// Returns true when the error is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MatrixError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// Result type alias for matrix operations
pub type Result<T> = std::result::Result<T, MatrixError>;
