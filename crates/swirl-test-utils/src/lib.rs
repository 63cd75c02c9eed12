//! Test fixtures and mock fields for Swirl development.
//!
//! Provides standard domains, seeded random fields (via `ChaCha8Rng`, so
//! every run sees the same data), approximate-equality assertions and a
//! [`CountingField`] mock that records how often it is sampled.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use smallvec::smallvec;
use swirl_core::{FieldError, FieldKind, Vector};
use swirl_space::{
    Boundaries, Bounds, CenteredGrid, Domain, Extrapolation, Material, SampledField,
    StaggeredGrid,
};

// ── Domains ─────────────────────────────────────────────────────

/// A square 2D domain of `n x n` unit cells with the same material on every
/// face.
pub fn square_domain(n: usize, material: Material) -> Domain {
    domain(&[n, n], material)
}

/// A box domain with unit cells and the given resolution.
///
/// # Panics
///
/// Panics on an invalid resolution; fixtures are only used in tests.
pub fn domain(resolution: &[usize], material: Material) -> Domain {
    let size: Vec<f64> = resolution.iter().map(|&n| n as f64).collect();
    Domain::new(
        Bounds::from_size(&size).expect("fixture bounds"),
        resolution.iter().copied().collect(),
        Boundaries::uniform(resolution.len(), material).expect("fixture boundaries"),
    )
    .expect("fixture domain")
}

/// Closed box, open on the top face (the classic smoke plume setup).
pub fn open_top_box(n: usize) -> Domain {
    let boundaries = Boundaries::uniform(2, Material::Closed)
        .and_then(|b| b.with_face(1, true, Material::Open))
        .expect("fixture boundaries");
    Domain::new(
        Bounds::from_size(&[n as f64, n as f64]).expect("fixture bounds"),
        smallvec![n, n],
        boundaries,
    )
    .expect("fixture domain")
}

// ── Seeded random fields ────────────────────────────────────────

/// Deterministic RNG for `seed`.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Scalar density with values in `[0, 1)` and the domain's scalar
/// extrapolation.
pub fn random_density(domain: &Domain, seed: u64) -> CenteredGrid {
    let mut rng = seeded_rng(seed);
    let values: Vec<f64> = (0..domain.geometry().cell_count())
        .map(|_| rng.random::<f64>())
        .collect();
    CenteredGrid::new(
        domain.geometry().clone(),
        1,
        values,
        domain.boundaries().scalar_extrapolation(),
    )
    .expect("fixture density")
}

/// Velocity with face values in `[-amplitude, amplitude)` and the domain's
/// vector extrapolation.
pub fn random_velocity(domain: &Domain, amplitude: f64, seed: u64) -> StaggeredGrid {
    let mut rng = seeded_rng(seed);
    let layout = domain.zero_velocity();
    let components = (0..domain.rank())
        .map(|d| {
            (0..layout.component(d).len())
                .map(|_| rng.random_range(-amplitude..amplitude))
                .collect()
        })
        .collect();
    layout.with_components(components).expect("fixture velocity")
}

// ── Assertions ──────────────────────────────────────────────────

/// Assert `|a - b| <= tol`.
#[track_caller]
pub fn assert_close(a: f64, b: f64, tol: f64) {
    assert!(
        (a - b).abs() <= tol,
        "expected {a} to be within {tol} of {b} (diff {})",
        (a - b).abs()
    );
}

/// Assert two slices agree element-wise within `tol`.
#[track_caller]
pub fn assert_slices_close(a: &[f64], b: &[f64], tol: f64) {
    assert_eq!(a.len(), b.len(), "length mismatch");
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!(
            (x - y).abs() <= tol,
            "element {i}: {x} vs {y} (diff {}, tol {tol})",
            (x - y).abs()
        );
    }
}

/// Assert two staggered grids agree face by face within `tol`.
#[track_caller]
pub fn assert_staggered_close(a: &StaggeredGrid, b: &StaggeredGrid, tol: f64) {
    assert_eq!(a.components().len(), b.components().len(), "rank mismatch");
    for (ca, cb) in a.components().iter().zip(b.components()) {
        assert_slices_close(ca, cb, tol);
    }
}

// ── Mock fields ─────────────────────────────────────────────────

/// Wraps a field and counts the points it is sampled at.
///
/// Used to check how often a scheme evaluates its velocity.
pub struct CountingField<F> {
    inner: F,
    samples: AtomicUsize,
}

impl<F: SampledField> CountingField<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            samples: AtomicUsize::new(0),
        }
    }

    /// Number of points sampled so far.
    pub fn samples(&self) -> usize {
        self.samples.load(Ordering::Relaxed)
    }
}

impl<F: SampledField> SampledField for CountingField<F> {
    fn kind(&self) -> FieldKind {
        self.inner.kind()
    }

    fn rank(&self) -> Option<usize> {
        self.inner.rank()
    }

    fn channels(&self) -> usize {
        self.inner.channels()
    }

    fn extrapolation(&self) -> &Extrapolation {
        self.inner.extrapolation()
    }

    fn sample(&self, point: &[f64]) -> Result<Vector, FieldError> {
        self.samples.fetch_add(1, Ordering::Relaxed);
        self.inner.sample(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swirl_space::ConstantField;

    #[test]
    fn random_fields_are_deterministic() {
        let d = square_domain(4, Material::Closed);
        assert_eq!(random_density(&d, 7), random_density(&d, 7));
        assert_ne!(random_density(&d, 7), random_density(&d, 8));
        let v = random_velocity(&d, 2.0, 3);
        assert!(v.max_abs() < 2.0);
        assert_eq!(v, random_velocity(&d, 2.0, 3));
    }

    #[test]
    fn counting_field_counts_points() {
        let f = CountingField::new(ConstantField::new(smallvec![1.0, 2.0]));
        f.sample_at(&[smallvec![0.0, 0.0], smallvec![1.0, 1.0]]).unwrap();
        f.sample(&[3.0, 3.0]).unwrap();
        assert_eq!(f.samples(), 3);
    }

    #[test]
    fn open_top_box_is_not_all_solid() {
        let d = open_top_box(4);
        assert!(!d.boundaries().all_solid());
        assert_eq!(d.boundaries().face(1, true), Material::Open);
    }
}
