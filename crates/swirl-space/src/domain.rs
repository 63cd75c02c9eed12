//! The simulation domain: grid geometry plus boundary materials.

use smallvec::smallvec;
use swirl_core::{FieldError, Index, Vector};

use crate::boundary::Boundaries;
use crate::centered::CenteredGrid;
use crate::extrapolation::Extrapolation;
use crate::geom::Geometry;
use crate::grid::{Bounds, GridGeometry};
use crate::staggered::StaggeredGrid;

/// A box, its resolution, and what lies beyond each face.
///
/// Every grid the engine creates for a simulation comes from the domain, so
/// density, velocity, pressure, and the masks all share one geometry.
///
/// # Examples
///
/// ```
/// use smallvec::smallvec;
/// use swirl_space::{Boundaries, Bounds, Domain, Material};
///
/// let domain = Domain::new(
///     Bounds::from_size(&[100.0, 100.0]).unwrap(),
///     smallvec![32, 32],
///     Boundaries::uniform(2, Material::Closed).unwrap(),
/// )
/// .unwrap();
/// let density = domain.scalar_grid(0.0).unwrap();
/// assert_eq!(density.cell_count(), 1024);
/// assert_eq!(domain.zero_velocity().component(0).len(), 33 * 32);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Domain {
    geometry: GridGeometry,
    boundaries: Boundaries,
}

impl Domain {
    /// Create a domain.
    ///
    /// Returns `Err` if the bounds, resolution, and boundaries disagree in
    /// rank or the resolution has an empty axis.
    pub fn new(
        bounds: Bounds,
        resolution: Index,
        boundaries: Boundaries,
    ) -> Result<Self, FieldError> {
        if boundaries.rank() != bounds.rank() {
            return Err(FieldError::RankMismatch {
                expected: bounds.rank(),
                actual: boundaries.rank(),
            });
        }
        let geometry = GridGeometry::new(bounds, resolution)?;
        Ok(Self {
            geometry,
            boundaries,
        })
    }

    /// Number of spatial axes.
    pub fn rank(&self) -> usize {
        self.geometry.rank()
    }

    /// Grid geometry shared by all fields of this domain.
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Boundary materials.
    pub fn boundaries(&self) -> &Boundaries {
        &self.boundaries
    }

    /// Bounding box.
    pub fn bounds(&self) -> &Bounds {
        self.geometry.bounds()
    }

    /// Cell spacing.
    pub fn dx(&self) -> &Vector {
        self.geometry.dx()
    }

    /// A uniform scalar grid with the domain's scalar extrapolation.
    pub fn scalar_grid(&self, value: f64) -> Result<CenteredGrid, FieldError> {
        CenteredGrid::uniform(
            self.geometry.clone(),
            1,
            value,
            self.boundaries.scalar_extrapolation(),
        )
    }

    /// A centered grid initialised from `init(center)`.
    pub fn centered_grid<F>(
        &self,
        channels: usize,
        extrapolation: Extrapolation,
        init: F,
    ) -> Result<CenteredGrid, FieldError>
    where
        F: Fn(&[f64]) -> Vector + Sync + Send,
    {
        CenteredGrid::from_fn(self.geometry.clone(), channels, extrapolation, init)
    }

    /// A velocity grid initialised from `init(axis, face_center)`, using the
    /// domain's vector extrapolation.
    pub fn staggered_grid<F>(&self, init: F) -> Result<StaggeredGrid, FieldError>
    where
        F: Fn(usize, &[f64]) -> f64 + Sync + Send,
    {
        StaggeredGrid::from_fn(
            self.geometry.clone(),
            self.boundaries.vector_extrapolation(),
            init,
        )
    }

    /// The zero velocity field.
    pub fn zero_velocity(&self) -> StaggeredGrid {
        StaggeredGrid::zeros(self.geometry.clone(), self.boundaries.vector_extrapolation())
    }

    /// Binary mask: 1 where the cell center lies inside `geometry`, else 0.
    pub fn scalar_grid_from_geometry(
        &self,
        geometry: &Geometry,
        extrapolation: Extrapolation,
    ) -> Result<CenteredGrid, FieldError> {
        self.centered_grid(1, extrapolation, |p| {
            smallvec![if geometry.contains(p) { 1.0 } else { 0.0 }]
        })
    }

    /// Soft mask on velocity faces: the fraction of a cell-sized box around
    /// each face center that lies inside `geometry`.
    pub fn soft_mask_staggered(&self, geometry: &Geometry) -> Result<StaggeredGrid, FieldError> {
        let half: Vector = self.dx().iter().map(|d| 0.5 * d).collect();
        self.staggered_grid(|_, p| geometry.fraction_inside(p, &half))
    }
}
