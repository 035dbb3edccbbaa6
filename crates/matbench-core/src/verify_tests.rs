//! Tests for reference multiplication and comparison.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::*;

#[test]
fn test_reference_product_shape_3x4_by_4x3() {
    let mut rng = StdRng::seed_from_u64(11);
    let range = ValueRange::new(0, 10).unwrap();
    let a = Matrix::generate(3, 4, range, &mut rng).unwrap();
    let b = Matrix::generate(4, 3, range, &mut rng).unwrap();

    let product = reference_product(&a, &b).unwrap();
    assert_eq!(product.shape(), (3, 3));
    assert!(matrices_equal(&product, &product, CompareMode::Exact));
}

#[test]
fn test_reference_product_shape_is_a_rows_by_b_cols() {
    let mut rng = StdRng::seed_from_u64(5);
    for (n, k, m) in [(1, 1, 1), (2, 7, 3), (5, 1, 9), (8, 8, 8)] {
        let a = Matrix::generate(n, k, ValueRange::default(), &mut rng).unwrap();
        let b = Matrix::generate(k, m, ValueRange::default(), &mut rng).unwrap();
        assert_eq!(reference_product(&a, &b).unwrap().shape(), (n, m));
    }
}

#[test]
fn test_reference_product_values() {
    let a = Matrix::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
    let b = Matrix::from_rows(vec![vec![7, 8], vec![9, 10], vec![11, 12]]).unwrap();
    let c = reference_product(&a, &b).unwrap();
    assert_eq!(c.as_slice(), &[58, 64, 139, 154]);
}

#[test]
fn test_dimension_mismatch_iff_inner_dims_differ() {
    let a = Matrix::zeros(2, 3).unwrap();
    let ok = Matrix::zeros(3, 2).unwrap();
    let bad = Matrix::zeros(2, 2).unwrap();

    assert!(reference_product(&a, &ok).is_ok());
    assert!(matches!(
        reference_product(&a, &bad),
        Err(MatrixError::DimensionMismatch {
            a_cols: 3,
            b_rows: 2,
            ..
        })
    ));
}

#[test]
fn test_reference_product_overflow_is_an_error() {
    let a = Matrix::from_rows(vec![vec![i64::MAX, 1]]).unwrap();
    let b = Matrix::from_rows(vec![vec![2], vec![1]]).unwrap();
    assert!(matches!(
        reference_product(&a, &b),
        Err(MatrixError::Overflow { row: 0, col: 0 })
    ));
}

#[test]
fn test_exact_reflexive() {
    let mut rng = StdRng::seed_from_u64(9);
    let m = Matrix::generate(6, 4, ValueRange::new(-50, 50).unwrap(), &mut rng).unwrap();
    assert!(matrices_equal(&m, &m, CompareMode::Exact));
    assert!(matrices_equal(&m, &m, CompareMode::tolerant()));
}

#[test]
fn test_shape_mismatch_is_false_not_error() {
    let x = Matrix::zeros(2, 3).unwrap();
    let y = Matrix::zeros(3, 2).unwrap();
    assert!(!matrices_equal(&x, &y, CompareMode::Exact));
    assert!(!matrices_equal(&x, &y, CompareMode::tolerant()));
    assert_eq!(first_mismatch(&x, &y, CompareMode::Exact), None);
}

#[test]
fn test_tolerant_bounds() {
    let mode = CompareMode::Tolerant { abs: 1.0, rel: 0.0 };
    let y = Matrix::from_rows(vec![vec![10, 20]]).unwrap();
    let near = Matrix::from_rows(vec![vec![11, 19]]).unwrap();
    let far = Matrix::from_rows(vec![vec![12, 20]]).unwrap();

    assert!(matrices_equal(&near, &y, mode));
    assert!(!matrices_equal(&far, &y, mode));
}

#[test]
fn test_tolerant_relative_term_scales_with_expected() {
    let mode = CompareMode::Tolerant { abs: 0.0, rel: 0.01 };
    let y = Matrix::from_rows(vec![vec![1000, 10]]).unwrap();
    assert!(matrices_equal(
        &Matrix::from_rows(vec![vec![1010, 10]]).unwrap(),
        &y,
        mode
    ));
    assert!(!matrices_equal(
        &Matrix::from_rows(vec![vec![1000, 11]]).unwrap(),
        &y,
        mode
    ));
}

#[test]
fn test_default_mode_is_tolerant() {
    assert_eq!(CompareMode::default(), CompareMode::tolerant());
    // Small integers differing by one are rejected even in tolerant mode.
    let x = Matrix::from_rows(vec![vec![3]]).unwrap();
    let y = Matrix::from_rows(vec![vec![4]]).unwrap();
    assert!(!matrices_equal(&x, &y, CompareMode::default()));
}

#[test]
fn test_first_mismatch_location() {
    let y = Matrix::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
    let x = Matrix::from_rows(vec![vec![1, 2], vec![3, 5]]).unwrap();
    assert_eq!(
        first_mismatch(&x, &y, CompareMode::Exact),
        Some(Mismatch {
            row: 1,
            col: 1,
            actual: 5,
            expected: 4
        })
    );
}
