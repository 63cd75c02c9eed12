//! The [`SampledField`] trait and the [`Field`] variant enum.

use swirl_core::{FieldError, FieldKind, Vector};

use crate::centered::CenteredGrid;
use crate::constant::ConstantField;
use crate::extrapolation::Extrapolation;
use crate::par::map_indexed;
use crate::points::PointCloud;
use crate::staggered::StaggeredGrid;

/// Point-sampling interface shared by every field representation.
///
/// Advection and projection only ever look at other fields through this
/// trait: they ask for values at arbitrary positions and never depend on
/// how the field stores them.
///
/// # Thread Safety
///
/// `Sync` is required because [`sample_at`](Self::sample_at) fans out over
/// sample points with `rayon`.
pub trait SampledField: Send + Sync {
    /// The variant of this field.
    fn kind(&self) -> FieldKind;

    /// Spatial rank, or `None` for rank-agnostic fields (constants).
    fn rank(&self) -> Option<usize>;

    /// Number of values per sample point (1 for scalars).
    fn channels(&self) -> usize;

    /// The rule for values outside the sampled support.
    fn extrapolation(&self) -> &Extrapolation;

    /// Interpolate all channels at a single point.
    fn sample(&self, point: &[f64]) -> Result<Vector, FieldError>;

    /// Interpolate all channels at many points, in order.
    fn sample_at(&self, points: &[Vector]) -> Result<Vec<Vector>, FieldError> {
        map_indexed(points.len(), |i| self.sample(&points[i]))
            .into_iter()
            .collect()
    }
}

/// A field stored on one or more regular lattices that can be rebuilt from
/// new values at its own sample points.
///
/// Centered grids have a single lattice holding `channels` values per
/// point. Staggered grids have one scalar lattice per axis.
pub trait GridField: SampledField + Clone {
    /// Number of lattices.
    fn lattice_count(&self) -> usize;

    /// Sample positions of lattice `l`, in storage order.
    fn lattice_points(&self, l: usize) -> Vec<Vector>;

    /// Stored values of lattice `l`, one vector per point.
    fn lattice_values(&self, l: usize) -> Vec<Vector>;

    /// Interpolate lattice `l` alone at `point`.
    fn sample_lattice(&self, l: usize, point: &[f64]) -> Result<Vector, FieldError>;

    /// The `2^rank` stored values of lattice `l` surrounding `point`.
    fn closest_lattice_values(&self, l: usize, point: &[f64]) -> Result<Vec<Vector>, FieldError>;

    /// The same layout holding new values, one list per lattice.
    fn with_lattice_values(&self, values: Vec<Vec<Vector>>) -> Result<Self, FieldError>;
}

/// Any field the engine knows how to transport.
#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    /// Cell-centered grid.
    Centered(CenteredGrid),
    /// Face-staggered vector grid.
    Staggered(StaggeredGrid),
    /// Discrete sample positions with values.
    PointCloud(PointCloud),
    /// Spatially uniform value.
    Constant(ConstantField),
}

impl Field {
    /// Borrow the inner grid if this is a [`Field::Centered`].
    pub fn as_centered(&self) -> Option<&CenteredGrid> {
        match self {
            Self::Centered(g) => Some(g),
            _ => None,
        }
    }

    /// Borrow the inner grid if this is a [`Field::Staggered`].
    pub fn as_staggered(&self) -> Option<&StaggeredGrid> {
        match self {
            Self::Staggered(g) => Some(g),
            _ => None,
        }
    }

    /// Borrow the inner cloud if this is a [`Field::PointCloud`].
    pub fn as_point_cloud(&self) -> Option<&PointCloud> {
        match self {
            Self::PointCloud(p) => Some(p),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn SampledField {
        match self {
            Self::Centered(g) => g,
            Self::Staggered(g) => g,
            Self::PointCloud(p) => p,
            Self::Constant(c) => c,
        }
    }
}

impl SampledField for Field {
    fn kind(&self) -> FieldKind {
        self.inner().kind()
    }

    fn rank(&self) -> Option<usize> {
        self.inner().rank()
    }

    fn channels(&self) -> usize {
        self.inner().channels()
    }

    fn extrapolation(&self) -> &Extrapolation {
        self.inner().extrapolation()
    }

    fn sample(&self, point: &[f64]) -> Result<Vector, FieldError> {
        self.inner().sample(point)
    }

    fn sample_at(&self, points: &[Vector]) -> Result<Vec<Vector>, FieldError> {
        self.inner().sample_at(points)
    }
}

impl From<CenteredGrid> for Field {
    fn from(g: CenteredGrid) -> Self {
        Self::Centered(g)
    }
}

impl From<StaggeredGrid> for Field {
    fn from(g: StaggeredGrid) -> Self {
        Self::Staggered(g)
    }
}

impl From<PointCloud> for Field {
    fn from(p: PointCloud) -> Self {
        Self::PointCloud(p)
    }
}

impl From<ConstantField> for Field {
    fn from(c: ConstantField) -> Self {
        Self::Constant(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn field_reports_inner_kind() {
        let c: Field = ConstantField::new(smallvec![1.0, 2.0]).into();
        assert_eq!(c.kind(), FieldKind::Constant);
        assert_eq!(c.channels(), 2);
        assert_eq!(c.sample(&[9.0, 9.0]).unwrap().as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn point_cloud_cannot_be_sampled() {
        let p: Field = PointCloud::new(vec![smallvec![0.0]], vec![smallvec![1.0]], Extrapolation::ZERO)
            .unwrap()
            .into();
        assert_eq!(
            p.sample(&[0.0]).unwrap_err(),
            FieldError::SamplingUnsupported {
                kind: FieldKind::PointCloud
            }
        );
    }
}
