//! Analytic geometries used for obstacles, inflows, and masks.

use smallvec::SmallVec;
use swirl_core::Vector;

/// A region of space.
///
/// Geometries are closed under union and complement, which is all the
/// projection needs to build its fluid masks.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// Contains nothing.
    Empty,
    /// A ball.
    Sphere {
        /// Center of the ball.
        center: Vector,
        /// Radius of the ball.
        radius: f64,
    },
    /// An axis-aligned box.
    Cuboid {
        /// Lower corner.
        lower: Vector,
        /// Upper corner.
        upper: Vector,
    },
    /// Points inside any part.
    Union(Vec<Geometry>),
    /// Points not inside the wrapped geometry.
    Inverse(Box<Geometry>),
}

impl Geometry {
    /// A ball of `radius` around `center`.
    pub fn sphere(center: Vector, radius: f64) -> Self {
        Self::Sphere { center, radius }
    }

    /// An axis-aligned box between two corners.
    pub fn cuboid(lower: Vector, upper: Vector) -> Self {
        Self::Cuboid { lower, upper }
    }

    /// An axis-aligned box given by its center and half edge lengths.
    pub fn cuboid_centered(center: &[f64], half_size: &[f64]) -> Self {
        Self::Cuboid {
            lower: center.iter().zip(half_size).map(|(c, h)| c - h).collect(),
            upper: center.iter().zip(half_size).map(|(c, h)| c + h).collect(),
        }
    }

    /// Union of several geometries. Nested unions are flattened and empty
    /// parts dropped.
    pub fn union(parts: impl IntoIterator<Item = Geometry>) -> Self {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                Self::Empty => {}
                Self::Union(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Self::Empty,
            1 => flat.remove(0),
            _ => Self::Union(flat),
        }
    }

    /// The complement of this geometry.
    pub fn inverted(self) -> Self {
        match self {
            Self::Inverse(inner) => *inner,
            other => Self::Inverse(Box::new(other)),
        }
    }

    /// Returns `true` if `point` lies inside (boundary included).
    pub fn contains(&self, point: &[f64]) -> bool {
        match self {
            Self::Empty => false,
            Self::Sphere { center, radius } => {
                point.len() == center.len() && distance(point, center) <= *radius
            }
            Self::Cuboid { lower, upper } => {
                point.len() == lower.len()
                    && point
                        .iter()
                        .zip(lower.iter().zip(upper.iter()))
                        .all(|(p, (lo, hi))| *p >= *lo && *p <= *hi)
            }
            Self::Union(parts) => parts.iter().any(|g| g.contains(point)),
            Self::Inverse(inner) => !inner.contains(point),
        }
    }

    /// A representative center, used as the pivot for rotation.
    ///
    /// Unions use the mean of their parts' centers. `Empty` has none.
    pub fn center(&self) -> Option<Vector> {
        match self {
            Self::Empty => None,
            Self::Sphere { center, .. } => Some(center.clone()),
            Self::Cuboid { lower, upper } => Some(
                lower
                    .iter()
                    .zip(upper.iter())
                    .map(|(lo, hi)| 0.5 * (lo + hi))
                    .collect(),
            ),
            Self::Union(parts) => {
                let centers: Vec<Vector> = parts.iter().filter_map(Geometry::center).collect();
                let first = centers.first()?;
                let n = centers.len() as f64;
                let mut mean: Vector = SmallVec::from_elem(0.0, first.len());
                for c in &centers {
                    for (m, v) in mean.iter_mut().zip(c.iter()) {
                        *m += v / n;
                    }
                }
                Some(mean)
            }
            Self::Inverse(inner) => inner.center(),
        }
    }

    /// The same geometry translated by `delta`.
    pub fn shifted(&self, delta: &[f64]) -> Self {
        let add = |v: &Vector| -> Vector { v.iter().zip(delta).map(|(a, b)| a + b).collect() };
        match self {
            Self::Empty => Self::Empty,
            Self::Sphere { center, radius } => Self::Sphere {
                center: add(center),
                radius: *radius,
            },
            Self::Cuboid { lower, upper } => Self::Cuboid {
                lower: add(lower),
                upper: add(upper),
            },
            Self::Union(parts) => Self::Union(parts.iter().map(|g| g.shifted(delta)).collect()),
            Self::Inverse(inner) => Self::Inverse(Box::new(inner.shifted(delta))),
        }
    }

    /// Approximate fraction of the box `center ± half_extent` covered by
    /// this geometry, in `[0, 1]`.
    ///
    /// Exact for cuboids. Spheres use the signed distance of the box
    /// center to the surface relative to the mean half extent. Unions take
    /// the largest fraction of any part.
    pub fn fraction_inside(&self, center: &[f64], half_extent: &[f64]) -> f64 {
        match self {
            Self::Empty => 0.0,
            Self::Sphere {
                center: c,
                radius,
            } => {
                if center.len() != c.len() {
                    return 0.0;
                }
                let h = half_extent.iter().sum::<f64>() / half_extent.len().max(1) as f64;
                let signed = distance(center, c) - radius;
                if h <= 0.0 {
                    return if signed <= 0.0 { 1.0 } else { 0.0 };
                }
                (0.5 - signed / (2.0 * h)).clamp(0.0, 1.0)
            }
            Self::Cuboid { lower, upper } => {
                if center.len() != lower.len() {
                    return 0.0;
                }
                let mut fraction = 1.0;
                for (axis, (&c, &h)) in center.iter().zip(half_extent).enumerate() {
                    let (lo, hi) = (lower[axis], upper[axis]);
                    let axis_fraction = if h <= 0.0 {
                        if c >= lo && c <= hi { 1.0 } else { 0.0 }
                    } else {
                        let overlap = (hi.min(c + h) - lo.max(c - h)).max(0.0);
                        overlap / (2.0 * h)
                    };
                    fraction *= axis_fraction;
                }
                fraction
            }
            Self::Union(parts) => parts
                .iter()
                .map(|g| g.fraction_inside(center, half_extent))
                .fold(0.0, f64::max),
            Self::Inverse(inner) => 1.0 - inner.fraction_inside(center, half_extent),
        }
    }
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Rigid rotation about a center.
///
/// `strength` is the angular velocity: one value (about the out-of-plane
/// axis) in 2D, a 3-vector in 3D, empty in 1D.
#[derive(Clone, Debug, PartialEq)]
pub struct AngularVelocity {
    center: Vector,
    strength: Vector,
}

impl AngularVelocity {
    /// Rotation about `center` with angular velocity `strength`.
    pub fn new(center: Vector, strength: Vector) -> Self {
        Self { center, strength }
    }

    /// Velocity of the rotating frame at `point`.
    pub fn at(&self, point: &[f64]) -> Vector {
        let r: Vector = point
            .iter()
            .zip(self.center.iter())
            .map(|(p, c)| p - c)
            .collect();
        match (point.len(), self.strength.as_slice()) {
            (2, [w, ..]) => SmallVec::from_slice(&[-w * r[1], w * r[0]]),
            (3, [wx, wy, wz]) => SmallVec::from_slice(&[
                wy * r[2] - wz * r[1],
                wz * r[0] - wx * r[2],
                wx * r[1] - wy * r[0],
            ]),
            (n, _) => SmallVec::from_elem(0.0, n),
        }
    }
}
