//! Per-tick metrics for the fluid world.
//!
//! [`StepMetrics`] captures timing and solver health for a single tick.
//! Non-finite values are reported as they are; callers decide whether a
//! blown-up state is fatal.

/// Timing and solver metrics collected during a single tick.
///
/// Durations are in microseconds. The world populates these after each
/// successful [`step_sync()`](crate::FluidWorld::step_sync).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire tick, in microseconds.
    pub total_us: u64,
    /// Time spent inside the physics step, in microseconds.
    pub physics_us: u64,
    /// CG iterations of the tick's last pressure solve.
    pub solve_iterations: usize,
    /// Largest absolute divergence of the new velocity.
    pub max_divergence: f64,
    /// Sum of the new density over all cells.
    pub density_total: f64,
}

impl StepMetrics {
    /// Returns `true` if every recorded quantity is finite.
    pub fn is_finite(&self) -> bool {
        self.max_divergence.is_finite() && self.density_total.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.physics_us, 0);
        assert_eq!(m.solve_iterations, 0);
        assert_eq!(m.max_divergence, 0.0);
        assert!(m.is_finite());
    }

    #[test]
    fn nan_density_is_flagged() {
        let m = StepMetrics {
            density_total: f64::NAN,
            ..StepMetrics::default()
        };
        assert!(!m.is_finite());
    }
}
