//! Effects applied to fluid fields each step, and gravity.
//!
//! An [`Effect`] transforms a field over a time increment. Effects are
//! applied in list order, each seeing the output of the previous one.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use swirl_core::{FieldError, Vector};
use swirl_space::par::map_indexed;
use swirl_space::{CenteredGrid, Geometry, SampledField, StaggeredGrid};

/// A transformation of a field of type `F` over a time increment.
pub trait Effect<F>: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Apply the effect for a step of length `dt`.
    fn apply(&self, field: &F, dt: f64) -> Result<F, FieldError>;
}

/// Shared handle to a density effect.
pub type DensityEffect = Arc<dyn Effect<CenteredGrid>>;

/// Shared handle to a velocity effect.
pub type VelocityEffect = Arc<dyn Effect<StaggeredGrid>>;

// ── FnEffect ────────────────────────────────────────────────────

/// An effect backed by a closure.
///
/// # Examples
///
/// ```
/// use swirl_engine::{Effect, FnEffect};
/// use swirl_space::CenteredGrid;
///
/// let decay = FnEffect::new("decay", |rho: &CenteredGrid, dt| Ok(rho.scale(1.0 - 0.1 * dt)));
/// assert_eq!(Effect::<CenteredGrid>::name(&decay), "decay");
/// ```
pub struct FnEffect<F> {
    name: String,
    f: Box<dyn Fn(&F, f64) -> Result<F, FieldError> + Send + Sync>,
}

impl<F> FnEffect<F> {
    /// Wrap `f` under `name`.
    pub fn new<G>(name: impl Into<String>, f: G) -> Self
    where
        G: Fn(&F, f64) -> Result<F, FieldError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl<F> Effect<F> for FnEffect<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, field: &F, dt: f64) -> Result<F, FieldError> {
        (self.f)(field, dt)
    }
}

impl<F> fmt::Debug for FnEffect<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEffect").field("name", &self.name).finish()
    }
}

// ── FieldEffect ─────────────────────────────────────────────────

/// How a [`FieldEffect`] combines its value with the field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EffectMode {
    /// `f + dt * value * mask`: a source (or sink) rate.
    #[default]
    Add,
    /// `(1 - mask) f + mask * value`: pin the field inside the geometry.
    Replace,
    /// `f * (1 + mask * (value - 1))`: scale the field inside the geometry.
    Multiply,
}

/// A value imposed on the region covered by a geometry.
///
/// The mask is soft: each sample gets the fraction of its cell-sized box
/// covered by the geometry. `value` holds one entry per channel (density)
/// or per axis (velocity); a single entry applies to all of them.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldEffect {
    name: String,
    geometry: Geometry,
    value: Vector,
    mode: EffectMode,
}

impl FieldEffect {
    /// An effect of `mode` with `value` inside `geometry`.
    pub fn new(name: impl Into<String>, geometry: Geometry, value: Vector, mode: EffectMode) -> Self {
        Self {
            name: name.into(),
            geometry,
            value,
            mode,
        }
    }

    /// A density/velocity source: [`EffectMode::Add`].
    pub fn inflow(geometry: Geometry, rate: Vector) -> Self {
        Self::new("inflow", geometry, rate, EffectMode::Add)
    }

    /// The region the effect acts on.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The imposed value.
    pub fn value(&self) -> &Vector {
        &self.value
    }

    /// The combination rule.
    pub fn mode(&self) -> EffectMode {
        self.mode
    }

    fn value_for(&self, slot: usize, slots: usize, context: &str) -> Result<f64, FieldError> {
        match self.value.len() {
            1 => Ok(self.value[0]),
            n if n == slots => Ok(self.value[slot]),
            n => Err(FieldError::ShapeMismatch {
                context: context.into(),
                expected: slots,
                actual: n,
            }),
        }
    }

    fn combine(&self, f: f64, mask: f64, value: f64, dt: f64) -> f64 {
        match self.mode {
            EffectMode::Add => f + dt * value * mask,
            EffectMode::Replace => (1.0 - mask) * f + mask * value,
            EffectMode::Multiply => f * (1.0 + mask * (value - 1.0)),
        }
    }
}

fn half_cell(dx: &[f64]) -> SmallVec<[f64; 3]> {
    dx.iter().map(|h| 0.5 * h).collect()
}

impl Effect<CenteredGrid> for FieldEffect {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, field: &CenteredGrid, dt: f64) -> Result<CenteredGrid, FieldError> {
        let channels = field.channels();
        let values: SmallVec<[f64; 3]> = (0..channels)
            .map(|ch| self.value_for(ch, channels, "FieldEffect channels"))
            .collect::<Result<_, _>>()?;
        let half = half_cell(field.dx());
        let points = field.points();
        let masks = map_indexed(points.len(), |i| self.geometry.fraction_inside(&points[i], &half));
        let current = field.values();
        let out = map_indexed(current.len(), |k| {
            let (cell, ch) = (k / channels, k % channels);
            self.combine(current[k], masks[cell], values[ch], dt)
        });
        field.with_values(out)
    }
}

impl Effect<StaggeredGrid> for FieldEffect {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, field: &StaggeredGrid, dt: f64) -> Result<StaggeredGrid, FieldError> {
        let rank = field.geometry().rank();
        let half = half_cell(field.geometry().dx());
        let components = (0..rank)
            .map(|d| {
                let value = self.value_for(d, rank, "FieldEffect components")?;
                let faces = field.face_points(d);
                let current = field.component(d);
                Ok(map_indexed(faces.len(), |i| {
                    let mask = self.geometry.fraction_inside(&faces[i], &half);
                    self.combine(current[i], mask, value, dt)
                }))
            })
            .collect::<Result<Vec<_>, FieldError>>()?;
        field.with_components(components)
    }
}

// ── Gravity ─────────────────────────────────────────────────────

/// Standard gravitational acceleration.
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Global gravity vector driving buoyancy.
#[derive(Clone, Debug, PartialEq)]
pub struct Gravity {
    vector: Vector,
}

impl Gravity {
    /// Gravity with an explicit acceleration vector.
    pub fn new(vector: Vector) -> Self {
        Self { vector }
    }

    /// [`STANDARD_GRAVITY`] pointing down the up axis: y in 2D and 3D, x in
    /// 1D.
    pub fn standard(rank: usize) -> Self {
        let mut vector: Vector = SmallVec::from_elem(0.0, rank);
        if let Some(up) = vector.get_mut(up_axis(rank)) {
            *up = -STANDARD_GRAVITY;
        }
        Self { vector }
    }

    /// No gravity.
    pub fn none(rank: usize) -> Self {
        Self {
            vector: SmallVec::from_elem(0.0, rank),
        }
    }

    /// The acceleration vector.
    pub fn vector(&self) -> &Vector {
        &self.vector
    }

    /// Number of components.
    pub fn rank(&self) -> usize {
        self.vector.len()
    }

    /// Returns `true` if every component is zero.
    pub fn is_zero(&self) -> bool {
        self.vector.iter().all(|g| *g == 0.0)
    }
}

/// The axis pointing "up": 1 in 2D and 3D, 0 in 1D.
pub fn up_axis(rank: usize) -> usize {
    if rank >= 2 {
        1
    } else {
        0
    }
}
