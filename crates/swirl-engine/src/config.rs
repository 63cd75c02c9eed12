//! World configuration, validation, and error types.
//!
//! [`WorldConfig`] is the input for constructing a
//! [`FluidWorld`](crate::FluidWorld). [`validate()`](WorldConfig::validate)
//! checks it once at startup so that stepping never has to.

use std::error::Error;
use std::fmt;

use crate::fluid::Fluid;
use crate::physics::{Environment, Physics};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`WorldConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// `dt` is NaN, infinite, zero, or negative.
    InvalidDt {
        /// The invalid value.
        value: f64,
    },
    /// The gravity vector does not match the domain rank.
    GravityRank {
        /// Domain rank.
        expected: usize,
        /// Gravity components.
        actual: usize,
    },
    /// An obstacle's velocities do not fit the domain rank.
    ObstacleRank {
        /// Position of the obstacle in the environment.
        index: usize,
        /// Domain rank.
        expected: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDt { value } => {
                write!(f, "dt must be finite and positive, got {value}")
            }
            Self::GravityRank { expected, actual } => {
                write!(f, "gravity has {actual} components, domain rank is {expected}")
            }
            Self::ObstacleRank { index, expected } => {
                write!(f, "obstacle {index} velocity does not fit domain rank {expected}")
            }
        }
    }
}

impl Error for ConfigError {}

// ── WorldConfig ────────────────────────────────────────────────────

/// Complete configuration for constructing a [`FluidWorld`](crate::FluidWorld).
pub struct WorldConfig {
    /// Initial fluid state.
    pub fluid: Fluid,
    /// Physics advancing the fluid each tick.
    pub physics: Box<dyn Physics>,
    /// Obstacles, gravity and effects.
    pub environment: Environment,
    /// Time increment per tick.
    pub dt: f64,
    /// Move obstacles by their linear velocity after every tick.
    pub move_obstacles: bool,
}

impl WorldConfig {
    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. dt must be usable as a tick length.
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::InvalidDt { value: self.dt });
        }
        let rank = self.fluid.rank();
        // 2. Gravity shares the domain rank.
        if self.environment.gravity.rank() != rank {
            return Err(ConfigError::GravityRank {
                expected: rank,
                actual: self.environment.gravity.rank(),
            });
        }
        // 3. Every obstacle's motion fits the domain.
        if let Some(index) = self
            .environment
            .obstacles
            .iter()
            .position(|o| !o.fits_rank(rank))
        {
            return Err(ConfigError::ObstacleRank {
                index,
                expected: rank,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for WorldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldConfig")
            .field("physics", &self.physics.name())
            .field("environment", &self.environment)
            .field("dt", &self.dt)
            .field("move_obstacles", &self.move_obstacles)
            .finish_non_exhaustive()
    }
}
