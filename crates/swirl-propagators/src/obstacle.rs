//! Solid obstacles inside the fluid domain.

use smallvec::SmallVec;
use swirl_core::Vector;
use swirl_space::{AngularVelocity, Geometry};

/// A solid body: a geometry plus its rigid motion.
///
/// An obstacle with zero linear and angular velocity is *stationary*. The
/// projection treats stationary obstacles purely as masked-out cells;
/// moving obstacles additionally imprint their velocity on the faces they
/// cover.
///
/// # Examples
///
/// ```
/// use smallvec::smallvec;
/// use swirl_propagators::Obstacle;
/// use swirl_space::Geometry;
///
/// let wall = Obstacle::new(Geometry::cuboid(smallvec![0.0, 0.0], smallvec![1.0, 4.0]));
/// assert!(wall.is_stationary());
///
/// let piston = wall.clone().with_velocity(smallvec![2.0, 0.0]);
/// assert!(!piston.is_stationary());
/// let later = piston.advanced(0.5);
/// assert_eq!(later.geometry().center().unwrap().as_slice(), &[1.5, 2.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    geometry: Geometry,
    velocity: Vector,
    angular_velocity: Vector,
}

impl Obstacle {
    /// A stationary obstacle.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            velocity: Vector::new(),
            angular_velocity: Vector::new(),
        }
    }

    /// Set the linear velocity.
    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the angular velocity: one value in 2D, three in 3D.
    pub fn with_angular_velocity(mut self, angular_velocity: Vector) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// The obstacle's shape.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Linear velocity (empty means zero).
    pub fn velocity(&self) -> &Vector {
        &self.velocity
    }

    /// Angular velocity (empty means zero).
    pub fn angular_velocity(&self) -> &Vector {
        &self.angular_velocity
    }

    /// Returns `true` if the obstacle neither translates nor rotates.
    pub fn is_stationary(&self) -> bool {
        self.velocity.iter().all(|v| *v == 0.0) && self.angular_velocity.iter().all(|w| *w == 0.0)
    }

    /// Returns `true` if the velocity vectors fit a domain of `rank`.
    pub fn fits_rank(&self, rank: usize) -> bool {
        let linear_ok = self.velocity.is_empty() || self.velocity.len() == rank;
        let angular_ok = matches!(
            (rank, self.angular_velocity.len()),
            (_, 0) | (2, 1) | (3, 3)
        );
        linear_ok && angular_ok
    }

    /// Rigid-body velocity at `point`: rotation about the geometry center
    /// plus translation.
    pub fn velocity_at(&self, point: &[f64]) -> Vector {
        let mut v: Vector = match self.geometry.center() {
            Some(center) if !self.angular_velocity.is_empty() => {
                AngularVelocity::new(center, self.angular_velocity.clone()).at(point)
            }
            _ => SmallVec::from_elem(0.0, point.len()),
        };
        for (vi, li) in v.iter_mut().zip(self.velocity.iter()) {
            *vi += li;
        }
        v
    }

    /// The obstacle after moving for `dt` with its linear velocity.
    ///
    /// Rotation of the geometry itself is not tracked.
    pub fn advanced(&self, dt: f64) -> Self {
        if self.velocity.iter().all(|v| *v == 0.0) {
            return self.clone();
        }
        let delta: Vector = self.velocity.iter().map(|v| v * dt).collect();
        Self {
            geometry: self.geometry.shifted(&delta),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn block() -> Geometry {
        Geometry::cuboid(smallvec![0.0, 0.0], smallvec![2.0, 2.0])
    }

    #[test]
    fn stationary_by_default() {
        assert!(Obstacle::new(block()).is_stationary());
        assert!(Obstacle::new(block())
            .with_velocity(smallvec![0.0, 0.0])
            .is_stationary());
        assert!(!Obstacle::new(block())
            .with_angular_velocity(smallvec![0.1])
            .is_stationary());
    }

    #[test]
    fn velocity_combines_rotation_and_translation() {
        let o = Obstacle::new(block())
            .with_velocity(smallvec![1.0, 0.0])
            .with_angular_velocity(smallvec![1.0]);
        // r = (1, 0) from center (1, 1): rotation gives (0, 1).
        assert_eq!(o.velocity_at(&[2.0, 1.0]).as_slice(), &[1.0, 1.0]);
    }

    #[test]
    fn rank_fit() {
        let o = Obstacle::new(block()).with_angular_velocity(smallvec![1.0]);
        assert!(o.fits_rank(2));
        assert!(!o.fits_rank(3));
        let o = Obstacle::new(block()).with_velocity(smallvec![1.0, 2.0, 3.0]);
        assert!(!o.fits_rank(2));
    }

    #[test]
    fn stationary_obstacles_do_not_move() {
        let o = Obstacle::new(block());
        assert_eq!(o.advanced(10.0), o);
    }
}
