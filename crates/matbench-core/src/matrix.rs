//! Dense integer matrices and random generation.

use std::fmt;

use rand::Rng;
use tracing::warn;

use crate::error::{MatrixError, Result};

/// A dense, row-major matrix of `i64` values.
///
/// Every matrix has at least one row and one column, and every row has
/// exactly `cols` entries. The only way to build one is through the
/// validating constructors below.
///
/// # Examples
///
/// ```
/// use matbench_core::Matrix;
///
/// let m = Matrix::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
/// assert_eq!(m.shape(), (2, 3));
/// assert_eq!(m.get(1, 2), 6);
/// assert_eq!(m.row(0), &[1, 2, 3]);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<i64>,
}

impl Matrix {
    /// Creates a matrix from flat row-major data.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<i64>) -> Result<Self> {
        check_dimensions(rows, cols)?;
        let expected = rows * cols;
        if data.len() != expected {
            return Err(MatrixError::Shape {
                rows,
                cols,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Creates a matrix from a list of rows, which must all have equal length.
    pub fn from_rows(rows: Vec<Vec<i64>>) -> Result<Self> {
        let row_count = rows.len();
        let cols = rows.first().map_or(0, Vec::len);
        check_dimensions(row_count, cols)?;

        let mut data = Vec::with_capacity(row_count * cols);
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(MatrixError::malformed(
                    index + 1,
                    format!("row has {} values, expected {}", row.len(), cols),
                ));
            }
            data.extend(row);
        }
        Ok(Self {
            rows: row_count,
            cols,
            data,
        })
    }

    /// Creates a matrix filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        check_dimensions(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        })
    }

    /// Generates a matrix with entries drawn uniformly from `range`.
    ///
    /// # Examples
    ///
    /// ```
    /// use matbench_core::{Matrix, ValueRange};
    /// use rand::rngs::StdRng;
    /// use rand::SeedableRng;
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let m = Matrix::generate(3, 4, ValueRange::new(0, 10).unwrap(), &mut rng).unwrap();
    /// assert_eq!(m.shape(), (3, 4));
    /// assert!(m.as_slice().iter().all(|v| (0..10).contains(v)));
    /// ```
    pub fn generate<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        range: ValueRange,
        rng: &mut R,
    ) -> Result<Self> {
        check_dimensions(rows, cols)?;
        let data = (0..rows * cols)
            .map(|_| rng.random_range(range.low..range.high))
            .collect();
        Ok(Self { rows, cols, data })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the element at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> i64 {
        assert!(row < self.rows && col < self.cols, "index out of bounds");
        self.data[row * self.cols + col]
    }

    /// Sets the element at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: i64) {
        assert!(row < self.rows && col < self.cols, "index out of bounds");
        self.data[row * self.cols + col] = value;
    }

    /// Returns one row as a slice.
    pub fn row(&self, row: usize) -> &[i64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Iterates over the rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[i64]> {
        self.data.chunks_exact(self.cols)
    }

    /// Returns the flat row-major data.
    pub fn as_slice(&self) -> &[i64] {
        &self.data
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matrix({}x{}) [", self.rows, self.cols)?;
        for row in self.iter_rows() {
            writeln!(f, "  {:?}", row)?;
        }
        write!(f, "]")
    }
}

/// Half-open range `[low, high)` for generated matrix entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange {
    low: i64,
    high: i64,
}

impl ValueRange {
    /// Creates a range, rejecting empty ones.
    pub fn new(low: i64, high: i64) -> Result<Self> {
        if low >= high {
            return Err(MatrixError::InvalidRange { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> i64 {
        self.low
    }

    pub fn high(&self) -> i64 {
        self.high
    }
}

impl Default for ValueRange {
    /// `[0, 10)`, the range the benchmark inputs have always used.
    fn default() -> Self {
        Self { low: 0, high: 10 }
    }
}

/// Generates a pair of operands for `a × b`.
///
/// When the requested shapes cannot be multiplied (`cols_a != rows_b`),
/// `cols_a` is coerced to `rows_b` and a warning is emitted instead of
/// failing. This lets size sweeps pass square sizes without care.
///
/// # Examples
///
/// ```
/// use matbench_core::{generate_operands, ValueRange};
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let mut rng = StdRng::seed_from_u64(1);
/// let (a, b) = generate_operands(3, 4, 5, 2, ValueRange::default(), &mut rng).unwrap();
/// assert_eq!(a.shape(), (3, 5));
/// assert_eq!(b.shape(), (5, 2));
/// ```
pub fn generate_operands<R: Rng + ?Sized>(
    rows_a: usize,
    cols_a: usize,
    rows_b: usize,
    cols_b: usize,
    range: ValueRange,
    rng: &mut R,
) -> Result<(Matrix, Matrix)> {
    check_dimensions(rows_a, cols_a)?;
    check_dimensions(rows_b, cols_b)?;

    let cols_a = if cols_a != rows_b {
        warn!(
            event = "coerce_dimensions",
            requested_cols_a = cols_a,
            rows_b = rows_b,
            "operand shapes do not allow multiplication, adjusting cols of A"
        );
        rows_b
    } else {
        cols_a
    };

    let a = Matrix::generate(rows_a, cols_a, range, rng)?;
    let b = Matrix::generate(rows_b, cols_b, range, rng)?;
    Ok((a, b))
}

fn check_dimensions(rows: usize, cols: usize) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Err(MatrixError::InvalidDimension { rows, cols });
    }
    Ok(())
}
