//! Domain boundary materials and the extrapolations they imply.

use smallvec::SmallVec;
use swirl_core::FieldError;

use crate::extrapolation::Extrapolation;
use crate::grid::MAX_RANK;

/// What lies beyond one face of the simulation box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Material {
    /// Fluid may leave and enter freely; pressure is zero outside.
    Open,
    /// A solid no-slip wall.
    Closed,
    /// The face is glued to the opposite face of the same axis.
    Periodic,
}

impl Material {
    /// Extrapolation for scalar quantities such as density.
    pub fn scalar(self) -> Extrapolation {
        match self {
            Self::Open => Extrapolation::ZERO,
            Self::Closed => Extrapolation::Boundary,
            Self::Periodic => Extrapolation::Periodic,
        }
    }

    /// Extrapolation for velocity.
    pub fn vector(self) -> Extrapolation {
        match self {
            Self::Open => Extrapolation::Boundary,
            Self::Closed => Extrapolation::ZERO,
            Self::Periodic => Extrapolation::Periodic,
        }
    }

    /// Extrapolation of the active-cell mask (cells where pressure is
    /// solved for).
    pub fn active(self) -> Extrapolation {
        match self {
            Self::Open | Self::Closed => Extrapolation::ZERO,
            Self::Periodic => Extrapolation::Periodic,
        }
    }

    /// Extrapolation of the accessible-cell mask (cells fluid may enter).
    pub fn accessible(self) -> Extrapolation {
        match self {
            Self::Open => Extrapolation::ONE,
            Self::Closed => Extrapolation::ZERO,
            Self::Periodic => Extrapolation::Periodic,
        }
    }
}

/// One `[lower, upper]` material pair per axis.
///
/// # Examples
///
/// ```
/// use swirl_space::{Boundaries, Extrapolation, Material};
///
/// // Closed box with an open ceiling.
/// let b = Boundaries::uniform(2, Material::Closed)
///     .unwrap()
///     .with_face(1, true, Material::Open)
///     .unwrap();
/// assert!(!b.all_solid());
/// assert_eq!(b.accessible_extrapolation().side(1, true), &Extrapolation::ONE);
/// assert_eq!(b.accessible_extrapolation().side(0, false), &Extrapolation::ZERO);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Boundaries {
    faces: SmallVec<[[Material; 2]; MAX_RANK]>,
}

impl Boundaries {
    /// Create from explicit per-axis face materials.
    ///
    /// Returns `Err` if the rank is outside `1..=3` or a periodic face is
    /// paired with a non-periodic one.
    pub fn new(faces: &[[Material; 2]]) -> Result<Self, FieldError> {
        if faces.is_empty() || faces.len() > MAX_RANK {
            return Err(FieldError::InvalidBoundaries {
                reason: format!("rank must be in 1..={MAX_RANK}, got {}", faces.len()),
            });
        }
        for (axis, [lo, hi]) in faces.iter().enumerate() {
            if (*lo == Material::Periodic) != (*hi == Material::Periodic) {
                return Err(FieldError::InvalidBoundaries {
                    reason: format!("axis {axis} is periodic on one side only"),
                });
            }
        }
        Ok(Self {
            faces: SmallVec::from_slice(faces),
        })
    }

    /// The same material on every face.
    pub fn uniform(rank: usize, material: Material) -> Result<Self, FieldError> {
        Self::new(&vec![[material; 2]; rank])
    }

    /// Replace one face.
    pub fn with_face(&self, axis: usize, upper: bool, material: Material) -> Result<Self, FieldError> {
        let mut faces = self.faces.clone();
        match faces.get_mut(axis) {
            Some(pair) => pair[upper as usize] = material,
            None => {
                return Err(FieldError::InvalidBoundaries {
                    reason: format!("axis {axis} out of range for rank {}", self.rank()),
                })
            }
        }
        Self::new(&faces)
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.faces.len()
    }

    /// Material of one face.
    pub fn face(&self, axis: usize, upper: bool) -> Material {
        self.faces[axis][upper as usize]
    }

    /// Returns `true` if every face is a solid wall.
    pub fn all_solid(&self) -> bool {
        self.faces.iter().flatten().all(|m| *m == Material::Closed)
    }

    /// Returns `true` if `axis` wraps.
    pub fn is_periodic(&self, axis: usize) -> bool {
        self.faces[axis][0] == Material::Periodic
    }

    fn extrapolation(&self, rule: fn(Material) -> Extrapolation) -> Extrapolation {
        Extrapolation::mixed(
            self.faces
                .iter()
                .map(|[lo, hi]| [rule(*lo), rule(*hi)])
                .collect(),
        )
    }

    /// Extrapolation for scalar fields on this domain.
    pub fn scalar_extrapolation(&self) -> Extrapolation {
        self.extrapolation(Material::scalar)
    }

    /// Extrapolation for velocity fields on this domain.
    pub fn vector_extrapolation(&self) -> Extrapolation {
        self.extrapolation(Material::vector)
    }

    /// Extrapolation for the active-cell mask.
    pub fn active_extrapolation(&self) -> Extrapolation {
        self.extrapolation(Material::active)
    }

    /// Extrapolation for the accessible-cell mask.
    pub fn accessible_extrapolation(&self) -> Extrapolation {
        self.extrapolation(Material::accessible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_sided_periodic_rejected() {
        let err = Boundaries::new(&[[Material::Periodic, Material::Closed]]);
        assert!(matches!(err, Err(FieldError::InvalidBoundaries { .. })));
    }

    #[test]
    fn rank_out_of_range_rejected() {
        assert!(Boundaries::new(&[]).is_err());
        assert!(Boundaries::uniform(4, Material::Open).is_err());
    }

    #[test]
    fn all_solid_only_for_closed() {
        assert!(Boundaries::uniform(3, Material::Closed).unwrap().all_solid());
        assert!(!Boundaries::uniform(3, Material::Periodic).unwrap().all_solid());
        let open_top = Boundaries::uniform(2, Material::Closed)
            .unwrap()
            .with_face(1, true, Material::Open)
            .unwrap();
        assert!(!open_top.all_solid());
    }

    #[test]
    fn uniform_boundaries_give_leaf_rules() {
        let b = Boundaries::uniform(2, Material::Open).unwrap();
        assert_eq!(b.scalar_extrapolation(), Extrapolation::ZERO);
        assert_eq!(b.vector_extrapolation(), Extrapolation::Boundary);
        assert_eq!(b.active_extrapolation(), Extrapolation::ZERO);
        assert_eq!(b.accessible_extrapolation(), Extrapolation::ONE);

        let c = Boundaries::uniform(2, Material::Closed).unwrap();
        assert_eq!(c.scalar_extrapolation(), Extrapolation::Boundary);
        assert_eq!(c.vector_extrapolation(), Extrapolation::ZERO);
        assert_eq!(c.accessible_extrapolation(), Extrapolation::ZERO);
    }

    #[test]
    fn mixed_periodic_axis() {
        let b = Boundaries::new(&[
            [Material::Periodic, Material::Periodic],
            [Material::Closed, Material::Open],
        ])
        .unwrap();
        assert!(b.is_periodic(0));
        assert!(!b.is_periodic(1));
        let ext = b.vector_extrapolation();
        assert!(ext.is_periodic(0));
        assert_eq!(ext.side(1, false), &Extrapolation::ZERO);
        assert_eq!(ext.side(1, true), &Extrapolation::Boundary);
    }

    #[test]
    fn with_face_rejects_bad_axis() {
        let b = Boundaries::uniform(2, Material::Closed).unwrap();
        assert!(b.with_face(2, false, Material::Open).is_err());
        assert!(b.with_face(0, false, Material::Periodic).is_err());
    }
}
