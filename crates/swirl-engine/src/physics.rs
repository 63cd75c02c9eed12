//! The [`Physics`] trait and the [`Environment`] a fluid is stepped in.

use std::fmt;
use std::sync::Arc;

use swirl_core::StepError;
use swirl_propagators::Obstacle;

use crate::effect::{DensityEffect, Effect, Gravity, VelocityEffect};
use crate::fluid::Fluid;

/// Everything outside the fluid that influences a step.
#[derive(Clone)]
pub struct Environment {
    /// Solid bodies, applied in order.
    pub obstacles: Vec<Obstacle>,
    /// Global gravity.
    pub gravity: Gravity,
    /// Effects folded over the density, in order.
    pub density_effects: Vec<DensityEffect>,
    /// Effects folded over the velocity, in order.
    pub velocity_effects: Vec<VelocityEffect>,
}

impl Environment {
    /// An empty environment without gravity for a domain of `rank`.
    pub fn new(rank: usize) -> Self {
        Self {
            obstacles: Vec::new(),
            gravity: Gravity::none(rank),
            density_effects: Vec::new(),
            velocity_effects: Vec::new(),
        }
    }

    /// Add an obstacle.
    pub fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    /// Replace the gravity.
    pub fn with_gravity(mut self, gravity: Gravity) -> Self {
        self.gravity = gravity;
        self
    }

    /// Append a density effect.
    pub fn with_density_effect(mut self, effect: DensityEffect) -> Self {
        self.density_effects.push(effect);
        self
    }

    /// Append a velocity effect.
    pub fn with_velocity_effect(mut self, effect: VelocityEffect) -> Self {
        self.velocity_effects.push(effect);
        self
    }

    /// Move every obstacle by its linear velocity for `dt`.
    pub fn advance_obstacles(&mut self, dt: f64) {
        for obstacle in &mut self.obstacles {
            *obstacle = obstacle.advanced(dt);
        }
    }
}

fn effect_names<F: 'static>(effects: &[Arc<dyn Effect<F>>]) -> Vec<&str> {
    effects.iter().map(|e| e.name()).collect()
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("obstacles", &self.obstacles)
            .field("gravity", &self.gravity)
            .field("density_effects", &effect_names(&self.density_effects))
            .field("velocity_effects", &effect_names(&self.velocity_effects))
            .finish()
    }
}

/// A rule advancing a [`Fluid`] in time.
///
/// # Contract
///
/// `step` must not mutate shared state: the same inputs give the same
/// output, and a failed step leaves nothing behind.
pub trait Physics: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Advance `fluid` by `dt` in `environment`.
    fn step(&self, fluid: &Fluid, dt: f64, environment: &Environment) -> Result<Fluid, StepError>;
}
