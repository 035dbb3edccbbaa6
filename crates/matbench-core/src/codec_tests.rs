//! Tests for the matrix text codec.

use std::fs;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use super::codec::*;
use super::*;

fn sample() -> Matrix {
    Matrix::from_rows(vec![vec![1, -2, 3], vec![4, 5, 60]]).unwrap()
}

#[test]
fn test_save_load_headered() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("matrixA.txt");

    save(&sample(), &path, true).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "2 3\n1 -2 3\n4 5 60\n");
    assert_eq!(load(&path, true).unwrap(), sample());
}

#[test]
fn test_save_load_headerless() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("resultMatrix.txt");

    save(&sample(), &path, false).unwrap();
    assert_eq!(load(&path, false).unwrap(), sample());
}

#[test]
fn test_generated_matrices_survive_disk() {
    let dir = TempDir::new().unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    for (rows, cols) in [(1, 1), (3, 4), (17, 5)] {
        let m = Matrix::generate(rows, cols, ValueRange::default(), &mut rng).unwrap();
        let path = dir.path().join(format!("m_{}_{}.txt", rows, cols));
        save(&m, &path, true).unwrap();
        assert_eq!(load(&path, true).unwrap(), m);
    }
}

#[test]
fn test_save_overwrites() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("m.txt");
    fs::write(&path, "garbage that is much longer than the matrix\n".repeat(10)).unwrap();

    let m = Matrix::from_rows(vec![vec![7]]).unwrap();
    save(&m, &path, false).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "7\n");
}

#[test]
fn test_parse_accepts_trailing_spaces_and_blank_lines() {
    let m = parse("1 2 \n\n3 4 \n\n", false).unwrap();
    assert_eq!(m.shape(), (2, 2));
    assert_eq!(m.get(1, 0), 3);
}

#[test]
fn test_headerless_file_read_as_headered_fails() {
    let err = parse("1 2 3\n4 5 6\n", true).unwrap_err();
    assert!(matches!(err, MatrixError::MalformedMatrix { line: 1, .. }));
}

#[test]
fn test_header_dimension_mismatch() {
    let err = parse("3 2\n1 2\n3 4\n", true).unwrap_err();
    assert!(err.to_string().contains("header declares 3x2"));
}

#[test]
fn test_headered_file_read_as_headerless_fails_for_wide_rows() {
    let text = to_text(&sample(), true);
    assert!(parse(&text, false).is_err());
}

#[test]
fn test_ragged_rows_report_line() {
    let err = parse("1 2\n3\n", false).unwrap_err();
    assert!(matches!(err, MatrixError::MalformedMatrix { line: 2, .. }));
}

#[test]
fn test_invalid_token() {
    let err = parse("2 2\n1 x\n3 4\n", true).unwrap_err();
    assert!(err.to_string().contains("invalid integer 'x'"));
}

#[test]
fn test_empty_input() {
    assert!(parse("", false).is_err());
    assert!(parse("", true).is_err());
    assert!(parse("2 2\n", true).is_err());
}

#[test]
fn test_missing_file_is_io_not_found() {
    let dir = TempDir::new().unwrap();
    let err = load(dir.path().join("absent.txt"), false).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_detect_header() {
    assert!(detect_header(&to_text(&sample(), true)));
    assert!(!detect_header(&to_text(&sample(), false)));
    // A 2-column headerless matrix whose first row is not a valid header.
    assert!(!detect_header("5 5\n1 2\n"));
    assert!(!detect_header(""));
}

#[test]
fn test_load_detected() {
    let dir = TempDir::new().unwrap();
    let headered = dir.path().join("a.txt");
    let bare = dir.path().join("b.txt");
    save(&sample(), &headered, true).unwrap();
    save(&sample(), &bare, false).unwrap();

    let (m, conv) = load_detected(&headered).unwrap();
    assert_eq!(conv, HeaderConvention::Headered);
    assert_eq!(m, sample());

    let (m, conv) = load_detected(&bare).unwrap();
    assert_eq!(conv, HeaderConvention::Headerless);
    assert_eq!(m, sample());
}

#[test]
fn test_role_conventions_are_applied() {
    let dir = TempDir::new().unwrap();
    let conv = FileConvention::per_trial();
    let a_path = dir.path().join("matrixA.txt");
    let r_path = dir.path().join("resultMatrix.txt");

    save_role(&sample(), &a_path, FileRole::MatrixA, &conv).unwrap();
    save_role(&sample(), &r_path, FileRole::Result, &conv).unwrap();

    assert!(fs::read_to_string(&a_path).unwrap().starts_with("2 3\n"));
    assert!(fs::read_to_string(&r_path).unwrap().starts_with("1 -2 3\n"));
    assert_eq!(load_role(&a_path, FileRole::MatrixA, &conv).unwrap(), sample());
    assert_eq!(load_role(&r_path, FileRole::Result, &conv).unwrap(), sample());
}

#[test]
fn test_role_stems() {
    assert_eq!(FileRole::MatrixA.stem(), "matrixA");
    assert_eq!(FileRole::MatrixB.stem(), "matrixB");
    assert_eq!(FileRole::Result.stem(), "resultMatrix");
}
