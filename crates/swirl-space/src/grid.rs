//! Bounding boxes and uniform grid geometry.

use smallvec::SmallVec;
use swirl_core::{FieldError, Index, Vector};

use crate::lattice::Lattice;

/// Maximum supported spatial rank.
pub const MAX_RANK: usize = 3;

/// An axis-aligned box `[lower, upper)` in simulation space.
#[derive(Clone, Debug, PartialEq)]
pub struct Bounds {
    lower: Vector,
    upper: Vector,
}

impl Bounds {
    /// Create a box from its lower and upper corners.
    ///
    /// Returns `Err` if the corners differ in rank, the rank is outside
    /// `1..=3`, or any extent is non-positive or non-finite.
    pub fn new(lower: Vector, upper: Vector) -> Result<Self, FieldError> {
        if lower.len() != upper.len() {
            return Err(FieldError::RankMismatch {
                expected: lower.len(),
                actual: upper.len(),
            });
        }
        if lower.is_empty() || lower.len() > MAX_RANK {
            return Err(FieldError::InvalidBounds {
                reason: format!("rank must be in 1..={MAX_RANK}, got {}", lower.len()),
            });
        }
        for (axis, (lo, hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if !lo.is_finite() || !hi.is_finite() || hi <= lo {
                return Err(FieldError::InvalidBounds {
                    reason: format!("axis {axis}: [{lo}, {hi}) is empty or not finite"),
                });
            }
        }
        Ok(Self { lower, upper })
    }

    /// A box with its lower corner at the origin.
    pub fn from_size(size: &[f64]) -> Result<Self, FieldError> {
        Self::new(SmallVec::from_elem(0.0, size.len()), SmallVec::from_slice(size))
    }

    /// Number of spatial axes.
    pub fn rank(&self) -> usize {
        self.lower.len()
    }

    /// Lower corner.
    pub fn lower(&self) -> &Vector {
        &self.lower
    }

    /// Upper corner.
    pub fn upper(&self) -> &Vector {
        &self.upper
    }

    /// Edge lengths.
    pub fn size(&self) -> Vector {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .map(|(lo, hi)| hi - lo)
            .collect()
    }

    /// Geometric center.
    pub fn center(&self) -> Vector {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .map(|(lo, hi)| 0.5 * (lo + hi))
            .collect()
    }

    /// Returns `true` if `point` lies inside the closed box.
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.rank()
            && point
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(p, (lo, hi))| *p >= *lo && *p <= *hi)
    }
}

/// A uniform cartesian grid: a bounding box split into `resolution` cells.
///
/// Cell spacing (`dx`) is derived once and never changes.
#[derive(Clone, Debug, PartialEq)]
pub struct GridGeometry {
    bounds: Bounds,
    resolution: Index,
    dx: Vector,
}

impl GridGeometry {
    /// Create a grid geometry.
    ///
    /// Returns `Err` if the resolution rank differs from the bounds rank or
    /// any axis has zero cells.
    pub fn new(bounds: Bounds, resolution: Index) -> Result<Self, FieldError> {
        if resolution.len() != bounds.rank() {
            return Err(FieldError::RankMismatch {
                expected: bounds.rank(),
                actual: resolution.len(),
            });
        }
        if resolution.iter().any(|&n| n == 0) {
            return Err(FieldError::EmptyGrid);
        }
        let dx = bounds
            .size()
            .iter()
            .zip(resolution.iter())
            .map(|(s, &n)| s / n as f64)
            .collect();
        Ok(Self {
            bounds,
            resolution,
            dx,
        })
    }

    /// Number of spatial axes.
    pub fn rank(&self) -> usize {
        self.resolution.len()
    }

    /// The grid's bounding box.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Cells per axis.
    pub fn resolution(&self) -> &Index {
        &self.resolution
    }

    /// Cell edge length per axis.
    pub fn dx(&self) -> &Vector {
        &self.dx
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.resolution.iter().product()
    }

    /// Volume (area, length) of one cell.
    pub fn cell_volume(&self) -> f64 {
        self.dx.iter().product()
    }

    /// Lattice of cell centers.
    pub(crate) fn cell_lattice(&self) -> Lattice {
        let origin = self
            .bounds
            .lower()
            .iter()
            .zip(self.dx.iter())
            .map(|(lo, dx)| lo + 0.5 * dx)
            .collect();
        Lattice::new(origin, self.dx.clone(), self.resolution.clone())
    }

    /// Lattice of the faces normal to `axis`.
    ///
    /// Along `axis` there are `res + 1` faces, or `res` when the axis wraps
    /// (the last face coincides with the first).
    pub(crate) fn face_lattice(&self, axis: usize, periodic: bool) -> Lattice {
        let mut lattice = self.cell_lattice();
        lattice.origin[axis] = self.bounds.lower()[axis];
        if !periodic {
            lattice.counts[axis] += 1;
        }
        lattice
    }
}
