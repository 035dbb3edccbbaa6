//! Text codec for matrix files.
//!
//! A matrix file holds `rows` lines of `cols` whitespace-separated integers,
//! optionally preceded by a `"<rows> <cols>"` header line. Which variant a
//! file uses is fixed per [`FileRole`] by a [`FileConvention`], so readers
//! never guess. [`detect_header`] exists for ad-hoc files only.

use std::fmt::Write as _;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{MatrixError, Result};
use crate::matrix::Matrix;

/// Whether a matrix file starts with a dimension line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HeaderConvention {
    Headered,
    Headerless,
}

impl HeaderConvention {
    #[inline]
    pub fn has_header(self) -> bool {
        matches!(self, HeaderConvention::Headered)
    }
}

/// The part a file plays in one multiplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileRole {
    MatrixA,
    MatrixB,
    Result,
}

impl FileRole {
    /// File stem used by the executables under test.
    pub fn stem(self) -> &'static str {
        match self {
            FileRole::MatrixA => "matrixA",
            FileRole::MatrixB => "matrixB",
            FileRole::Result => "resultMatrix",
        }
    }
}

/// Header convention for each file role.
///
/// # Examples
///
/// ```
/// use matbench_core::{FileConvention, FileRole, HeaderConvention};
///
/// let conv = FileConvention::per_trial();
/// assert_eq!(conv.header_for(FileRole::MatrixA), HeaderConvention::Headered);
/// assert_eq!(conv.header_for(FileRole::Result), HeaderConvention::Headerless);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileConvention {
    pub matrix_a: HeaderConvention,
    pub matrix_b: HeaderConvention,
    pub result: HeaderConvention,
}

impl FileConvention {
    /// Inputs headered, results headerless.
    pub fn per_trial() -> Self {
        Self {
            matrix_a: HeaderConvention::Headered,
            matrix_b: HeaderConvention::Headered,
            result: HeaderConvention::Headerless,
        }
    }

    /// Every file headerless; batch executables read `size * size` raw values.
    pub fn batch() -> Self {
        Self {
            matrix_a: HeaderConvention::Headerless,
            matrix_b: HeaderConvention::Headerless,
            result: HeaderConvention::Headerless,
        }
    }

    pub fn header_for(&self, role: FileRole) -> HeaderConvention {
        match role {
            FileRole::MatrixA => self.matrix_a,
            FileRole::MatrixB => self.matrix_b,
            FileRole::Result => self.result,
        }
    }
}

impl Default for FileConvention {
    fn default() -> Self {
        Self::per_trial()
    }
}

/// Renders a matrix in the text format.
///
/// # Examples
///
/// ```
/// use matbench_core::{codec, Matrix};
///
/// let m = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
/// assert_eq!(codec::to_text(&m, true), "2 2\n1 2\n3 4\n");
/// assert_eq!(codec::to_text(&m, false), "1 2\n3 4\n");
/// ```
pub fn to_text(matrix: &Matrix, with_header: bool) -> String {
    let mut out = String::new();
    if with_header {
        writeln!(out, "{} {}", matrix.rows(), matrix.cols()).unwrap();
    }
    for row in matrix.iter_rows() {
        push_row(&mut out, row);
    }
    out
}

fn push_row(out: &mut String, row: &[i64]) {
    for (j, value) in row.iter().enumerate() {
        if j > 0 {
            out.push(' ');
        }
        write!(out, "{}", value).unwrap();
    }
    out.push('\n');
}

/// Writes a matrix to `path`, creating or truncating the file.
pub fn save(matrix: &Matrix, path: impl AsRef<Path>, with_header: bool) -> Result<()> {
    let path = path.as_ref();
    let file = fs::File::create(path).map_err(|e| MatrixError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let write_all = |writer: &mut BufWriter<fs::File>| -> std::io::Result<()> {
        if with_header {
            writeln!(writer, "{} {}", matrix.rows(), matrix.cols())?;
        }
        let mut line = String::new();
        for row in matrix.iter_rows() {
            line.clear();
            push_row(&mut line, row);
            writer.write_all(line.as_bytes())?;
        }
        writer.flush()
    };
    write_all(&mut writer).map_err(|e| MatrixError::io(path, e))
}

/// Reads a matrix from `path`.
///
/// `has_header` must match the file. A headerless file read as headered
/// fails the dimension check. A headered file read as headerless fails
/// unless the matrix has exactly two columns, in which case the header
/// becomes a bogus first row; callers should go through [`load_role`].
pub fn load(path: impl AsRef<Path>, has_header: bool) -> Result<Matrix> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| MatrixError::io(path, e))?;
    parse(&text, has_header)
}

/// Parses matrix text.
///
/// # Examples
///
/// ```
/// use matbench_core::codec;
///
/// let m = codec::parse("2 3\n1 2 3\n4 5 6\n", true).unwrap();
/// assert_eq!(m.shape(), (2, 3));
///
/// // Trailing spaces, as written by some executables, are accepted.
/// let r = codec::parse("7 8 \n9 10 \n", false).unwrap();
/// assert_eq!(r.get(1, 1), 10);
/// ```
pub fn parse(text: &str, has_header: bool) -> Result<Matrix> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let declared = if has_header {
        let (line_no, line) = lines
            .next()
            .ok_or_else(|| MatrixError::malformed(1, "empty file, expected header"))?;
        Some(parse_header(line_no, line)?)
    } else {
        None
    };

    let mut rows: Vec<Vec<i64>> = Vec::new();
    for (line_no, line) in lines {
        let row = line
            .split_whitespace()
            .map(|token| {
                token.parse::<i64>().map_err(|_| {
                    MatrixError::malformed(line_no, format!("invalid integer '{}'", token))
                })
            })
            .collect::<Result<Vec<i64>>>()?;

        if let Some(expected) = rows.first().map(Vec::len) {
            if row.len() != expected {
                return Err(MatrixError::malformed(
                    line_no,
                    format!("row has {} values, expected {}", row.len(), expected),
                ));
            }
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(MatrixError::malformed(
            text.lines().count().max(1),
            "no data rows",
        ));
    }

    if let Some((declared_rows, declared_cols)) = declared {
        let found_cols = rows[0].len();
        if declared_rows != rows.len() || declared_cols != found_cols {
            return Err(MatrixError::malformed(
                1,
                format!(
                    "header declares {}x{} but data is {}x{}",
                    declared_rows,
                    declared_cols,
                    rows.len(),
                    found_cols
                ),
            ));
        }
    }

    Matrix::from_rows(rows)
}

fn parse_header(line_no: usize, line: &str) -> Result<(usize, usize)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 2 {
        return Err(MatrixError::malformed(
            line_no,
            format!("header must be '<rows> <cols>', found '{}'", line.trim()),
        ));
    }
    let parse_dim = |token: &str| {
        token
            .parse::<usize>()
            .map_err(|_| MatrixError::malformed(line_no, format!("invalid dimension '{}'", token)))
    };
    Ok((parse_dim(tokens[0])?, parse_dim(tokens[1])?))
}

/// Guesses whether matrix text starts with a dimension header.
///
/// A header is recognized only when the first line has exactly two
/// non-negative integers `r c`, the rest of the file has `r` non-empty
/// lines, and each of them has `c` values.
///
/// # Examples
///
/// ```
/// use matbench_core::codec::detect_header;
///
/// assert!(detect_header("2 2\n1 2\n3 4\n"));
/// assert!(!detect_header("1 2\n3 4\n"));
/// ```
pub fn detect_header(text: &str) -> bool {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let Some(first) = lines.next() else {
        return false;
    };
    let Ok((rows, cols)) = parse_header(1, first) else {
        return false;
    };

    let mut count = 0;
    for line in lines {
        if line.split_whitespace().count() != cols {
            return false;
        }
        count += 1;
    }
    count == rows && rows > 0
}

/// Reads a matrix, detecting whether it carries a header.
pub fn load_detected(path: impl AsRef<Path>) -> Result<(Matrix, HeaderConvention)> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| MatrixError::io(path, e))?;
    let convention = if detect_header(&text) {
        HeaderConvention::Headered
    } else {
        HeaderConvention::Headerless
    };
    let matrix = parse(&text, convention.has_header())?;
    Ok((matrix, convention))
}

/// Writes a matrix using the header convention of `role`.
pub fn save_role(
    matrix: &Matrix,
    path: impl AsRef<Path>,
    role: FileRole,
    convention: &FileConvention,
) -> Result<()> {
    save(matrix, path, convention.header_for(role).has_header())
}

/// Reads a matrix using the header convention of `role`.
pub fn load_role(
    path: impl AsRef<Path>,
    role: FileRole,
    convention: &FileConvention,
) -> Result<Matrix> {
    load(path, convention.header_for(role).has_header())
}
