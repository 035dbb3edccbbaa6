//! Tests for matrix construction and generation.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use super::*;

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

#[test]
fn test_from_vec_checks_length() {
    let err = Matrix::from_vec(2, 2, vec![1, 2, 3]).unwrap_err();
    assert!(matches!(
        err,
        MatrixError::Shape {
            expected: 4,
            actual: 3,
            ..
        }
    ));
}

#[test]
fn test_from_rows_rejects_ragged() {
    let err = Matrix::from_rows(vec![vec![1, 2], vec![3]]).unwrap_err();
    assert!(matches!(err, MatrixError::MalformedMatrix { line: 2, .. }));
}

#[test]
fn test_zero_dimensions_rejected() {
    assert!(matches!(
        Matrix::zeros(0, 3),
        Err(MatrixError::InvalidDimension { rows: 0, cols: 3 })
    ));
    assert!(matches!(
        Matrix::generate(4, 0, ValueRange::default(), &mut rng()),
        Err(MatrixError::InvalidDimension { rows: 4, cols: 0 })
    ));
    assert!(Matrix::from_rows(vec![]).is_err());
}

#[test]
fn test_value_range_must_be_non_empty() {
    assert!(matches!(
        ValueRange::new(5, 5),
        Err(MatrixError::InvalidRange { low: 5, high: 5 })
    ));
    assert!(ValueRange::new(-3, 4).is_ok());
}

#[test]
fn test_generate_respects_range() {
    let range = ValueRange::new(-2, 3).unwrap();
    let m = Matrix::generate(16, 16, range, &mut rng()).unwrap();
    assert_eq!(m.shape(), (16, 16));
    assert!(m.as_slice().iter().all(|v| (-2..3).contains(v)));
}

#[test]
fn test_generate_is_reproducible_with_seed() {
    let a = Matrix::generate(5, 7, ValueRange::default(), &mut rng()).unwrap();
    let b = Matrix::generate(5, 7, ValueRange::default(), &mut rng()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_row_access_and_set() {
    let mut m = Matrix::zeros(2, 3).unwrap();
    m.set(1, 2, 9);
    assert_eq!(m.get(1, 2), 9);
    assert_eq!(m.row(1), &[0, 0, 9]);
    assert_eq!(m.iter_rows().count(), 2);
}

#[test]
fn test_generate_operands_compatible_shapes_untouched() {
    let (a, b) = generate_operands(3, 4, 4, 3, ValueRange::default(), &mut rng()).unwrap();
    assert_eq!(a.shape(), (3, 4));
    assert_eq!(b.shape(), (4, 3));
}

#[derive(Clone, Default)]
struct EventNames(Arc<Mutex<Vec<String>>>);

struct NameVisitor<'a>(&'a mut Option<String>);

impl Visit for NameVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "event" {
            *self.0 = Some(format!("{:?}", value).trim_matches('"').to_string());
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "event" {
            *self.0 = Some(value.to_string());
        }
    }
}

impl<S: Subscriber> Layer<S> for EventNames {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut name = None;
        event.record(&mut NameVisitor(&mut name));
        if let Some(name) = name {
            self.0.lock().unwrap().push(name);
        }
    }
}

#[test]
fn test_generate_operands_coerces_incompatible_shapes_with_warning() {
    let names = EventNames::default();
    let subscriber = tracing_subscriber::registry().with(names.clone());

    let (a, b) = tracing::subscriber::with_default(subscriber, || {
        generate_operands(3, 4, 5, 3, ValueRange::default(), &mut rng())
    })
    .unwrap();

    assert_eq!(a.cols(), 5);
    assert_eq!(b.rows(), 5);
    assert_eq!(a.cols(), b.rows());
    assert!(names
        .0
        .lock()
        .unwrap()
        .iter()
        .any(|n| n == "coerce_dimensions"));
}

#[test]
fn test_generate_operands_still_checks_dimensions() {
    assert!(generate_operands(0, 4, 4, 4, ValueRange::default(), &mut rng()).is_err());
}
