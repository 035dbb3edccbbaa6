//! Reference multiplication and result comparison.

use tracing::debug;

use crate::error::{MatrixError, Result};
use crate::matrix::Matrix;

/// Computes `a × b` with a plain dense loop.
///
/// # Errors
///
/// Returns [`MatrixError::DimensionMismatch`] if `a.cols() != b.rows()`, and
/// [`MatrixError::Overflow`] if an element leaves the `i64` range.
///
/// # Examples
///
/// ```
/// use matbench_core::{reference_product, Matrix};
///
/// let a = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
/// let b = Matrix::from_rows(vec![vec![5, 6], vec![7, 8]]).unwrap();
/// let c = reference_product(&a, &b).unwrap();
/// assert_eq!(c.row(0), &[19, 22]);
/// assert_eq!(c.row(1), &[43, 50]);
/// ```
pub fn reference_product(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    if a.cols() != b.rows() {
        return Err(MatrixError::DimensionMismatch {
            a_rows: a.rows(),
            a_cols: a.cols(),
            b_rows: b.rows(),
            b_cols: b.cols(),
        });
    }

    let (n, m) = (a.rows(), b.cols());
    let mut out = vec![0i64; n * m];

    // i-k-j order keeps the inner loop on contiguous rows of b and out.
    for i in 0..n {
        let out_row = &mut out[i * m..(i + 1) * m];
        for (k, &a_ik) in a.row(i).iter().enumerate() {
            if a_ik == 0 {
                continue;
            }
            for (j, &b_kj) in b.row(k).iter().enumerate() {
                let sum = a_ik
                    .checked_mul(b_kj)
                    .and_then(|p| out_row[j].checked_add(p))
                    .ok_or(MatrixError::Overflow { row: i, col: j })?;
                out_row[j] = sum;
            }
        }
    }

    Matrix::from_vec(n, m, out)
}

/// Equality policy for comparing a candidate result with the reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompareMode {
    /// Identical shapes and identical values.
    Exact,
    /// Identical shapes and `|x - y| <= abs + rel * |y|` per element.
    Tolerant { abs: f64, rel: f64 },
}

impl CompareMode {
    pub const DEFAULT_ABS: f64 = 1e-8;
    pub const DEFAULT_REL: f64 = 1e-5;

    /// Tolerant mode with the default epsilons.
    pub fn tolerant() -> Self {
        CompareMode::Tolerant {
            abs: Self::DEFAULT_ABS,
            rel: Self::DEFAULT_REL,
        }
    }

    fn accepts(self, actual: i64, expected: i64) -> bool {
        match self {
            CompareMode::Exact => actual == expected,
            CompareMode::Tolerant { abs, rel } => {
                let (x, y) = (actual as f64, expected as f64);
                (x - y).abs() <= abs + rel * y.abs()
            }
        }
    }
}

impl Default for CompareMode {
    fn default() -> Self {
        Self::tolerant()
    }
}

/// First element where a candidate disagrees with the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub row: usize,
    pub col: usize,
    pub actual: i64,
    pub expected: i64,
}

/// Compares `actual` against `expected` under `mode`.
///
/// Shape differences yield `false`, never an error.
///
/// # Examples
///
/// ```
/// use matbench_core::{matrices_equal, CompareMode, Matrix};
///
/// let x = Matrix::from_rows(vec![vec![100_000, 2]]).unwrap();
/// let y = Matrix::from_rows(vec![vec![100_001, 2]]).unwrap();
///
/// assert!(!matrices_equal(&x, &y, CompareMode::Exact));
/// assert!(matrices_equal(&x, &y, CompareMode::tolerant()));
/// ```
pub fn matrices_equal(actual: &Matrix, expected: &Matrix, mode: CompareMode) -> bool {
    if actual.shape() != expected.shape() {
        debug!(
            event = "shape_mismatch",
            actual_rows = actual.rows(),
            actual_cols = actual.cols(),
            expected_rows = expected.rows(),
            expected_cols = expected.cols(),
        );
        return false;
    }
    first_mismatch(actual, expected, mode).is_none()
}

/// Locates the first disagreeing element, scanning row by row.
///
/// Returns `None` when the matrices are equal under `mode` or when their
/// shapes differ (use [`matrices_equal`] for a full verdict).
pub fn first_mismatch(actual: &Matrix, expected: &Matrix, mode: CompareMode) -> Option<Mismatch> {
    if actual.shape() != expected.shape() {
        return None;
    }
    let cols = actual.cols();
    actual
        .as_slice()
        .iter()
        .zip(expected.as_slice())
        .position(|(&x, &y)| !mode.accepts(x, y))
        .map(|index| Mismatch {
            row: index / cols,
            col: index % cols,
            actual: actual.as_slice()[index],
            expected: expected.as_slice()[index],
        })
}
