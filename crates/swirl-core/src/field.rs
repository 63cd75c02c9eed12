//! Field kind classification.

use std::fmt;

/// The variant of a field, used for dispatch and error reporting.
///
/// Every field in the workspace is exactly one of these kinds. The
/// advection engine keys its registration table on this enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    /// Values sampled at the geometric centers of uniform cells.
    Centered,
    /// Vector field with each component sampled at its own face centers.
    Staggered,
    /// A discrete set of positions, each carrying a value.
    PointCloud,
    /// A spatially uniform value.
    Constant,
}

impl FieldKind {
    /// All kinds, in declaration order.
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Centered,
        FieldKind::Staggered,
        FieldKind::PointCloud,
        FieldKind::Constant,
    ];

    /// Human-readable name, matching the public type name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Centered => "CenteredGrid",
            Self::Staggered => "StaggeredGrid",
            Self::PointCloud => "PointCloud",
            Self::Constant => "ConstantField",
        }
    }

    /// Returns `true` for the two lattice-backed kinds.
    pub fn is_grid(self) -> bool {
        matches!(self, Self::Centered | Self::Staggered)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
