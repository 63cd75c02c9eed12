//! SampledField compliance test helpers.
//!
//! These functions verify that a field implementation satisfies the
//! sampling contract. Reused across the centered and staggered grid test
//! modules.

use crate::field::SampledField;
use swirl_core::{FieldError, Vector};

/// Assert that `sample_at` agrees with repeated `sample` calls.
pub fn assert_sample_at_consistent(field: &dyn SampledField, points: &[Vector]) {
    let batch = field.sample_at(points).unwrap();
    assert_eq!(batch.len(), points.len());
    for (p, b) in points.iter().zip(batch.iter()) {
        let single = field.sample(p).unwrap();
        assert_eq!(&single, b, "sample({p:?}) differs from sample_at");
    }
}

/// Assert that every sample has `channels()` entries.
pub fn assert_channel_count(field: &dyn SampledField, points: &[Vector]) {
    for p in points {
        let v = field.sample(p).unwrap();
        assert_eq!(
            v.len(),
            field.channels(),
            "sample({p:?}) has {} channels, expected {}",
            v.len(),
            field.channels()
        );
    }
}

/// Assert that points of the wrong rank are rejected.
pub fn assert_rank_checked(field: &dyn SampledField) {
    let Some(rank) = field.rank() else {
        return;
    };
    let wrong: Vector = smallvec::SmallVec::from_elem(0.0, rank + 1);
    assert_eq!(
        field.sample(&wrong).unwrap_err(),
        FieldError::RankMismatch {
            expected: rank,
            actual: rank + 1
        }
    );
}

/// Assert that sampling exactly at a stored point returns the stored value.
pub fn assert_interpolates_stored(field: &dyn SampledField, points: &[Vector], stored: &[f64], ch: usize) {
    for (p, s) in points.iter().zip(stored) {
        let v = field.sample(p).unwrap()[ch];
        assert!(
            (v - s).abs() < 1e-12,
            "sample({p:?})[{ch}] = {v}, stored {s}"
        );
    }
}

/// Run all compliance checks.
pub fn run_full_compliance(field: &dyn SampledField, points: &[Vector]) {
    assert_sample_at_consistent(field, points);
    assert_channel_count(field, points);
    assert_rank_checked(field);
}
