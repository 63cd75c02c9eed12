//! Lockstep (synchronous) fluid world.
//!
//! [`FluidWorld`] owns the current [`Fluid`] and its [`Environment`]. Each
//! call to [`step_sync()`](FluidWorld::step_sync) runs one tick of the
//! physics and replaces the state only if the tick succeeds: a failed tick
//! leaves the world exactly as it was.
//!
//! # Ownership model
//!
//! `FluidWorld` is [`Send`]. All mutating methods take `&mut self` and
//! `step_sync()` returns a reference into the world, so the borrow checker
//! prevents stepping while a previous state is still borrowed.

use std::time::Instant;

use swirl_core::{StepError, TickId};
use swirl_space::ops::divergence;
use tracing::{debug, info};

use crate::config::{ConfigError, WorldConfig};
use crate::fluid::Fluid;
use crate::metrics::StepMetrics;
use crate::physics::{Environment, Physics};

// Compile-time assertion: FluidWorld is Send.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<FluidWorld>();
    }
};

/// Single-threaded fluid world for lockstep execution.
///
/// # Example
///
/// ```
/// use smallvec::smallvec;
/// use swirl_engine::{Environment, Fluid, FluidWorld, IncompressibleFlow, WorldConfig};
/// use swirl_space::{Boundaries, Bounds, Domain, Material};
///
/// let domain = Domain::new(
///     Bounds::from_size(&[8.0, 8.0]).unwrap(),
///     smallvec![8, 8],
///     Boundaries::uniform(2, Material::Closed).unwrap(),
/// )
/// .unwrap();
/// let mut world = FluidWorld::new(WorldConfig {
///     fluid: Fluid::at_rest(domain).unwrap(),
///     physics: Box::new(IncompressibleFlow::default()),
///     environment: Environment::new(2),
///     dt: 0.5,
///     move_obstacles: false,
/// })
/// .unwrap();
/// world.run(3).unwrap();
/// assert_eq!(world.current_tick().0, 3);
/// assert_eq!(world.fluid().age(), 1.5);
/// ```
pub struct FluidWorld {
    fluid: Fluid,
    physics: Box<dyn Physics>,
    environment: Environment,
    dt: f64,
    move_obstacles: bool,
    tick: TickId,
    last_metrics: StepMetrics,
}

impl FluidWorld {
    /// Validate `config` and build a world at tick 0.
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            physics = config.physics.name(),
            rank = config.fluid.rank(),
            cells = config.fluid.domain().geometry().cell_count(),
            dt = config.dt,
            obstacles = config.environment.obstacles.len(),
            "fluid world created"
        );
        Ok(Self {
            fluid: config.fluid,
            physics: config.physics,
            environment: config.environment,
            dt: config.dt,
            move_obstacles: config.move_obstacles,
            tick: TickId::default(),
            last_metrics: StepMetrics::default(),
        })
    }

    /// Execute one tick.
    ///
    /// # Errors
    ///
    /// Returns the physics' [`StepError`]. The fluid, obstacles, tick
    /// counter and metrics are unchanged in that case.
    pub fn step_sync(&mut self) -> Result<&Fluid, StepError> {
        let tick_start = Instant::now();

        let physics_start = Instant::now();
        let next = self.physics.step(&self.fluid, self.dt, &self.environment)?;
        let physics_us = physics_start.elapsed().as_micros() as u64;

        let max_divergence = divergence(next.velocity())?.max_abs();
        let density_total = next.total_density();
        let solve_iterations = next.solve_info().iterations;

        self.fluid = next;
        if self.move_obstacles {
            self.environment.advance_obstacles(self.dt);
        }
        self.tick = self.tick.next();
        self.last_metrics = StepMetrics {
            total_us: tick_start.elapsed().as_micros() as u64,
            physics_us,
            solve_iterations,
            max_divergence,
            density_total,
        };
        debug!(
            tick = %self.tick,
            total_us = self.last_metrics.total_us,
            iterations = solve_iterations,
            max_divergence,
            density_total,
            "tick complete"
        );
        Ok(&self.fluid)
    }

    /// Execute `ticks` ticks, stopping at the first failure.
    pub fn run(&mut self, ticks: u64) -> Result<&Fluid, StepError> {
        for _ in 0..ticks {
            self.step_sync()?;
        }
        Ok(&self.fluid)
    }

    /// Replace the fluid and rewind to tick 0.
    ///
    /// The new fluid must have the same rank as the environment.
    pub fn reset(&mut self, fluid: Fluid) -> Result<&Fluid, ConfigError> {
        let rank = fluid.rank();
        if self.environment.gravity.rank() != rank {
            return Err(ConfigError::GravityRank {
                expected: rank,
                actual: self.environment.gravity.rank(),
            });
        }
        self.fluid = fluid;
        self.tick = TickId::default();
        self.last_metrics = StepMetrics::default();
        Ok(&self.fluid)
    }

    /// The current state.
    pub fn fluid(&self) -> &Fluid {
        &self.fluid
    }

    /// The environment, including obstacles at their current position.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Current tick (0 after construction or reset).
    pub fn current_tick(&self) -> TickId {
        self.tick
    }

    /// Metrics from the most recent successful tick.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// Time increment per tick.
    pub fn dt(&self) -> f64 {
        self.dt
    }
}

impl std::fmt::Debug for FluidWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FluidWorld")
            .field("current_tick", &self.tick)
            .field("physics", &self.physics.name())
            .field("age", &self.fluid.age())
            .field("dt", &self.dt)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;
    use swirl_propagators::{Obstacle, SolveConfig};
    use swirl_space::{Boundaries, Bounds, Domain, Geometry, Material};

    use crate::effect::Gravity;
    use crate::flow::IncompressibleFlow;

    struct FailingPhysics;

    impl Physics for FailingPhysics {
        fn name(&self) -> &str {
            "failing"
        }

        fn step(&self, _: &Fluid, dt: f64, _: &Environment) -> Result<Fluid, StepError> {
            Err(StepError::InvalidDt { dt })
        }
    }

    fn domain() -> Domain {
        Domain::new(
            Bounds::from_size(&[6.0, 6.0]).unwrap(),
            smallvec![6, 6],
            Boundaries::uniform(2, Material::Closed).unwrap(),
        )
        .unwrap()
    }

    fn config(physics: Box<dyn Physics>) -> WorldConfig {
        WorldConfig {
            fluid: Fluid::builder(domain())
                .uniform_density(1.0)
                .buoyancy_factor(0.1)
                .build()
                .unwrap(),
            physics,
            environment: Environment::new(2).with_gravity(Gravity::standard(2)),
            dt: 0.25,
            move_obstacles: false,
        }
    }

    #[test]
    fn step_advances_tick_and_age() {
        let mut world = FluidWorld::new(config(Box::new(IncompressibleFlow::default()))).unwrap();
        assert_eq!(world.current_tick(), TickId(0));
        world.step_sync().unwrap();
        assert_eq!(world.current_tick(), TickId(1));
        assert_eq!(world.fluid().age(), 0.25);
        let m = world.last_metrics();
        assert!(m.is_finite());
        assert!((m.density_total - 36.0).abs() < 1e-9);
    }

    #[test]
    fn failed_tick_leaves_world_unchanged() {
        let mut world = FluidWorld::new(config(Box::new(FailingPhysics))).unwrap();
        let before = world.fluid().clone();
        assert!(world.step_sync().is_err());
        assert_eq!(world.current_tick(), TickId(0));
        assert_eq!(world.fluid(), &before);
        assert_eq!(world.last_metrics(), &StepMetrics::default());
    }

    #[test]
    fn solver_failure_surfaces_as_step_error() {
        let flow = IncompressibleFlow::builder()
            .solve(SolveConfig {
                max_iterations: 0,
                ..SolveConfig::default()
            })
            .build()
            .unwrap();
        let mut cfg = config(Box::new(flow));
        cfg.fluid = Fluid::builder(domain())
            .velocity(domain().staggered_grid(|axis, p| p[axis] * 0.3).unwrap())
            .build()
            .unwrap();
        let mut world = FluidWorld::new(cfg).unwrap();
        assert!(matches!(world.step_sync(), Err(StepError::Solve(_))));
        assert_eq!(world.current_tick(), TickId(0));
    }

    #[test]
    fn moving_obstacles_advance_each_tick() {
        let mut cfg = config(Box::new(IncompressibleFlow::default()));
        cfg.environment = cfg.environment.with_obstacle(
            Obstacle::new(Geometry::sphere(smallvec![2.0, 3.0], 1.0)).with_velocity(smallvec![1.0, 0.0]),
        );
        cfg.move_obstacles = true;
        let mut world = FluidWorld::new(cfg).unwrap();
        world.run(2).unwrap();
        let center = world.environment().obstacles[0].geometry().center().unwrap();
        assert_eq!(center.as_slice(), &[2.5, 3.0]);
    }

    #[test]
    fn obstacles_stay_put_unless_moving_is_enabled() {
        let mut cfg = config(Box::new(IncompressibleFlow::default()));
        cfg.environment = cfg.environment.with_obstacle(
            Obstacle::new(Geometry::sphere(smallvec![2.0, 3.0], 1.0)).with_velocity(smallvec![1.0, 0.0]),
        );
        let mut world = FluidWorld::new(cfg).unwrap();
        world.run(2).unwrap();
        let center = world.environment().obstacles[0].geometry().center().unwrap();
        assert_eq!(center.as_slice(), &[2.0, 3.0]);
    }

    #[test]
    fn failed_tick_does_not_move_obstacles() {
        let mut cfg = config(Box::new(FailingPhysics));
        cfg.environment = cfg.environment.with_obstacle(
            Obstacle::new(Geometry::sphere(smallvec![2.0, 3.0], 1.0)).with_velocity(smallvec![1.0, 0.0]),
        );
        cfg.move_obstacles = true;
        let mut world = FluidWorld::new(cfg).unwrap();
        assert!(world.step_sync().is_err());
        let center = world.environment().obstacles[0].geometry().center().unwrap();
        assert_eq!(center.as_slice(), &[2.0, 3.0]);
    }

    #[test]
    fn reset_rewinds() {
        let mut world = FluidWorld::new(config(Box::new(IncompressibleFlow::default()))).unwrap();
        world.run(2).unwrap();
        world.reset(Fluid::at_rest(domain()).unwrap()).unwrap();
        assert_eq!(world.current_tick(), TickId(0));
        assert_eq!(world.fluid().age(), 0.0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = config(Box::new(IncompressibleFlow::default()));
        cfg.dt = 0.0;
        assert!(FluidWorld::new(cfg).is_err());
    }
}
