//! Advection: transporting fields along a velocity field.
//!
//! # Schemes
//!
//! | Field          | Scheme                                        |
//! |----------------|-----------------------------------------------|
//! | constant       | unchanged                                     |
//! | point cloud    | Euler ([`points`]) or RK4 ([`runge_kutta_4`]) |
//! | centered grid  | [`semi_lagrangian`] or [`mac_cormack`]        |
//! | staggered grid | [`semi_lagrangian`] or [`mac_cormack`]        |
//!
//! [`advect`] dispatches through the default [`Advector`] table. Build an
//! [`Advector`] directly to pick a different grid scheme or to register a
//! scheme for a field kind.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;
use swirl_core::{AdvectError, FieldError, FieldKind, Vector};
use swirl_space::par::map_indexed;
use swirl_space::{Field, GridField, PointCloud, SampledField};

/// `point + scale * v`, checking that the velocity matches the point rank.
fn displaced(point: &[f64], v: &[f64], scale: f64) -> Result<Vector, FieldError> {
    if v.len() != point.len() {
        return Err(FieldError::RankMismatch {
            expected: point.len(),
            actual: v.len(),
        });
    }
    Ok(point.iter().zip(v).map(|(p, vi)| p + scale * vi).collect())
}

/// Sample `velocity` at every point and return `points[i] + scale * v_i`.
fn trace(
    points: &[Vector],
    velocity: &dyn SampledField,
    scale: f64,
) -> Result<Vec<Vector>, FieldError> {
    let v = velocity.sample_at(points)?;
    points
        .iter()
        .zip(v.iter())
        .map(|(p, vi)| displaced(p, vi, scale))
        .collect()
}

/// Semi-Lagrangian advection with a single backward lookup.
///
/// For every sample point `x` of `field` the velocity `v(x)` is sampled
/// and the new value is `field` interpolated at `x - dt v(x)`. Staggered
/// components are traced independently and only sample their own
/// component.
pub fn semi_lagrangian<G: GridField>(
    field: &G,
    velocity: &dyn SampledField,
    dt: f64,
) -> Result<G, AdvectError> {
    let mut lattices = Vec::with_capacity(field.lattice_count());
    for l in 0..field.lattice_count() {
        let backward = trace(&field.lattice_points(l), velocity, -dt)?;
        let values = map_indexed(backward.len(), |i| field.sample_lattice(l, &backward[i]))
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        lattices.push(values);
    }
    Ok(field.with_lattice_values(lattices)?)
}

/// MacCormack advection: semi-Lagrangian plus an error-correction pass.
///
/// With `f1` the semi-Lagrangian result and `f2` the field `f1` traced
/// forward again, the corrected value is
/// `f1 + correction_strength * 0.5 * (field - f2)`, clamped to the range of
/// the original values surrounding the backward lookup point.
/// `correction_strength = 0` reproduces [`semi_lagrangian`].
pub fn mac_cormack<G: GridField>(
    field: &G,
    velocity: &dyn SampledField,
    dt: f64,
    correction_strength: f64,
) -> Result<G, AdvectError> {
    validate_correction_strength(correction_strength)?;

    let count = field.lattice_count();
    let mut backward = Vec::with_capacity(count);
    let mut forward = Vec::with_capacity(count);
    let mut first = Vec::with_capacity(count);
    for l in 0..count {
        let points = field.lattice_points(l);
        let v = velocity.sample_at(&points)?;
        let (bwd, fwd): (Vec<_>, Vec<_>) = points
            .iter()
            .zip(v.iter())
            .map(|(p, vi)| Ok((displaced(p, vi, -dt)?, displaced(p, vi, dt)?)))
            .collect::<Result<Vec<_>, FieldError>>()?
            .into_iter()
            .unzip();
        let values = map_indexed(bwd.len(), |i| field.sample_lattice(l, &bwd[i]))
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;
        backward.push(bwd);
        forward.push(fwd);
        first.push(values);
    }
    let semi = field.with_lattice_values(first.clone())?;

    let mut corrected = Vec::with_capacity(count);
    for l in 0..count {
        let original = field.lattice_values(l);
        let (bwd, fwd, f1) = (&backward[l], &forward[l], &first[l]);
        let values = map_indexed(f1.len(), |i| -> Result<Vector, FieldError> {
            let f2 = semi.sample_lattice(l, &fwd[i])?;
            let limits = field.closest_lattice_values(l, &bwd[i])?;
            let mut out: Vector = SmallVec::with_capacity(f1[i].len());
            for ch in 0..f1[i].len() {
                let value = f1[i][ch] + correction_strength * 0.5 * (original[i][ch] - f2[ch]);
                let lo = limits.iter().map(|c| c[ch]).fold(f64::INFINITY, f64::min);
                let hi = limits.iter().map(|c| c[ch]).fold(f64::NEG_INFINITY, f64::max);
                out.push(value.max(lo).min(hi));
            }
            Ok(out)
        })
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;
        corrected.push(values);
    }
    Ok(field.with_lattice_values(corrected)?)
}

fn validate_correction_strength(s: f64) -> Result<(), AdvectError> {
    if !(0.0..=1.0).contains(&s) {
        return Err(AdvectError::InvalidScheme {
            reason: format!("correction_strength must be in [0, 1], got {s}"),
        });
    }
    Ok(())
}

/// Fourth-order Runge-Kutta transport of a point cloud.
///
/// Only the positions move; values, extrapolation and the overlap flag are
/// carried over.
pub fn runge_kutta_4(
    cloud: &PointCloud,
    velocity: &dyn SampledField,
    dt: f64,
) -> Result<PointCloud, AdvectError> {
    let x = cloud.points();
    let k1 = velocity.sample_at(x)?;
    let k2 = velocity.sample_at(&shift_all(x, &k1, 0.5 * dt)?)?;
    let k3 = velocity.sample_at(&shift_all(x, &k2, 0.5 * dt)?)?;
    let k4 = velocity.sample_at(&shift_all(x, &k3, dt)?)?;
    let combined: Vec<Vector> = (0..x.len())
        .map(|i| {
            (0..k1[i].len())
                .map(|d| (k1[i][d] + 2.0 * (k2[i][d] + k3[i][d]) + k4[i][d]) / 6.0)
                .collect()
        })
        .collect();
    Ok(cloud.with_points(shift_all(x, &combined, dt)?)?)
}

/// Euler transport of a point cloud by a velocity cloud sampled at the same
/// points.
///
/// Returns [`AdvectError::MismatchedElements`] if the two clouds do not
/// share their positions.
pub fn points(cloud: &PointCloud, velocity: &PointCloud, dt: f64) -> Result<PointCloud, AdvectError> {
    if !cloud.same_elements(velocity) {
        return Err(AdvectError::MismatchedElements {
            field_points: cloud.len(),
            velocity_points: velocity.len(),
        });
    }
    Ok(cloud.with_points(shift_all(cloud.points(), velocity.values(), dt)?)?)
}

fn shift_all(points: &[Vector], v: &[Vector], scale: f64) -> Result<Vec<Vector>, FieldError> {
    points
        .iter()
        .zip(v.iter())
        .map(|(p, vi)| displaced(p, vi, scale))
        .collect()
}

// ── Dispatch ────────────────────────────────────────────────────

/// Scheme used for grid fields by the default [`Advector`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GridScheme {
    /// Single backward lookup.
    #[default]
    SemiLagrangian,
    /// Backward lookup plus clamped error correction.
    MacCormack {
        /// Fraction of the estimated error that is corrected, in `[0, 1]`.
        correction_strength: f64,
    },
}

impl GridScheme {
    /// Returns `Err` if a MacCormack strength is outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), AdvectError> {
        match self {
            Self::SemiLagrangian => Ok(()),
            Self::MacCormack {
                correction_strength,
            } => validate_correction_strength(*correction_strength),
        }
    }

    /// Advect a grid field with this scheme.
    pub fn apply<G: GridField>(
        &self,
        field: &G,
        velocity: &dyn SampledField,
        dt: f64,
    ) -> Result<G, AdvectError> {
        match self {
            Self::SemiLagrangian => semi_lagrangian(field, velocity, dt),
            Self::MacCormack {
                correction_strength,
            } => mac_cormack(field, velocity, dt, *correction_strength),
        }
    }
}

/// An advection scheme as stored in the [`Advector`] table.
pub type Scheme = Arc<dyn Fn(&Field, &Field, f64) -> Result<Field, AdvectError> + Send + Sync>;

/// Registration table mapping each [`FieldKind`] to its advection scheme.
///
/// The default table covers all four kinds. Kinds can be replaced or
/// removed; advecting a kind with no entry fails with
/// [`AdvectError::UnsupportedField`].
#[derive(Clone)]
pub struct Advector {
    schemes: IndexMap<FieldKind, Scheme>,
}

impl Advector {
    /// A table with no registered schemes.
    pub fn empty() -> Self {
        Self {
            schemes: IndexMap::new(),
        }
    }

    /// The default table using `grid_scheme` for both grid kinds.
    pub fn with_grid_scheme(grid_scheme: GridScheme) -> Result<Self, AdvectError> {
        grid_scheme.validate()?;
        Ok(Self::standard(grid_scheme))
    }

    /// Constant, point-cloud and grid entries; `grid_scheme` is already
    /// validated.
    fn standard(grid_scheme: GridScheme) -> Self {
        let mut advector = Self::empty();
        advector.register(FieldKind::Constant, Arc::new(|field, _, _| Ok(field.clone())));
        advector.register(FieldKind::PointCloud, Arc::new(advect_point_cloud));
        let grids: Scheme = Arc::new(move |field, velocity, dt| match field {
            Field::Centered(g) => Ok(Field::Centered(grid_scheme.apply(g, velocity, dt)?)),
            Field::Staggered(g) => Ok(Field::Staggered(grid_scheme.apply(g, velocity, dt)?)),
            other => Err(AdvectError::UnsupportedField { kind: other.kind() }),
        });
        advector.register(FieldKind::Centered, grids.clone());
        advector.register(FieldKind::Staggered, grids);
        advector
    }

    /// Register (or replace) the scheme for `kind`, returning the previous
    /// one.
    pub fn register(&mut self, kind: FieldKind, scheme: Scheme) -> Option<Scheme> {
        self.schemes.insert(kind, scheme)
    }

    /// Remove the scheme for `kind`.
    pub fn unregister(&mut self, kind: FieldKind) -> Option<Scheme> {
        self.schemes.shift_remove(&kind)
    }

    /// Kinds with a registered scheme, in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = FieldKind> + '_ {
        self.schemes.keys().copied()
    }

    /// Advect `field` along `velocity` for `dt`.
    pub fn advect(&self, field: &Field, velocity: &Field, dt: f64) -> Result<Field, AdvectError> {
        let scheme = self
            .schemes
            .get(&field.kind())
            .ok_or(AdvectError::UnsupportedField { kind: field.kind() })?;
        scheme(field, velocity, dt)
    }
}

impl Default for Advector {
    fn default() -> Self {
        Self::standard(GridScheme::SemiLagrangian)
    }
}

impl fmt::Debug for Advector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advector")
            .field("kinds", &self.schemes.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn advect_point_cloud(field: &Field, velocity: &Field, dt: f64) -> Result<Field, AdvectError> {
    let Field::PointCloud(cloud) = field else {
        return Err(AdvectError::UnsupportedField { kind: field.kind() });
    };
    match velocity {
        Field::PointCloud(v) if v.same_elements(cloud) => Ok(points(cloud, v, dt)?.into()),
        _ => Ok(runge_kutta_4(cloud, velocity, dt)?.into()),
    }
}

/// Advect any field with the default scheme table (semi-Lagrangian grids).
pub fn advect(field: &Field, velocity: &Field, dt: f64) -> Result<Field, AdvectError> {
    Advector::default().advect(field, velocity, dt)
}
