//! Strongly-typed identifiers and the small-vector aliases used for
//! positions and lattice indices.

use smallvec::SmallVec;
use std::fmt;

/// Monotonically increasing tick counter.
///
/// Incremented each time a world advances one step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub u64);

impl TickId {
    /// The tick following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// A position, displacement, or per-point value in simulation space.
///
/// Uses `SmallVec<[f64; 3]>` so that 1D/2D/3D positions and vector values
/// never touch the heap. Scalar values are stored as length-1 vectors.
pub type Vector = SmallVec<[f64; 3]>;

/// A multi-dimensional lattice index or resolution.
pub type Index = SmallVec<[usize; 3]>;
