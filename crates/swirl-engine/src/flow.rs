//! Incompressible flow: the per-step orchestration of advection, effects,
//! buoyancy and projection.

use swirl_core::{FieldError, StepError};
use swirl_propagators::{make_incompressible, GridScheme, Obstacle, Projection, SolveConfig};
use swirl_space::ops::{normalize, resample_to_staggered};
use swirl_space::{CenteredGrid, StaggeredGrid};
use tracing::trace;

use crate::effect::{DensityEffect, Gravity, VelocityEffect};
use crate::fluid::{Fluid, SolveInfo};
use crate::physics::{Environment, Physics};

/// Physics of an inviscid incompressible fluid carrying a marker density.
///
/// One [`step`](Self::step):
///
/// 1. optionally projects the input velocity
/// 2. advects density and velocity by the pre-step velocity
/// 3. rescales density to its previous total if every wall is closed
/// 4. applies density effects, then velocity effects, in list order
/// 5. adds Boussinesq buoyancy `dt * b * density * (-gravity)` on the faces
/// 6. optionally projects the result, recording solver diagnostics
///
/// # Examples
///
/// ```
/// use swirl_engine::IncompressibleFlow;
/// use swirl_propagators::GridScheme;
///
/// let flow = IncompressibleFlow::builder()
///     .grid_scheme(GridScheme::MacCormack { correction_strength: 1.0 })
///     .build()
///     .unwrap();
/// assert!(flow.make_output_divfree());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct IncompressibleFlow {
    make_input_divfree: bool,
    make_output_divfree: bool,
    conserve_density: bool,
    grid_scheme: GridScheme,
    solve: SolveConfig,
}

/// Builder for [`IncompressibleFlow`].
#[derive(Clone, Debug)]
pub struct IncompressibleFlowBuilder {
    make_input_divfree: bool,
    make_output_divfree: bool,
    conserve_density: bool,
    grid_scheme: GridScheme,
    solve: SolveConfig,
}

impl Default for IncompressibleFlow {
    fn default() -> Self {
        Self {
            make_input_divfree: false,
            make_output_divfree: true,
            conserve_density: true,
            grid_scheme: GridScheme::SemiLagrangian,
            solve: SolveConfig::default(),
        }
    }
}

impl IncompressibleFlow {
    /// Start building a flow with default settings.
    pub fn builder() -> IncompressibleFlowBuilder {
        let defaults = Self::default();
        IncompressibleFlowBuilder {
            make_input_divfree: defaults.make_input_divfree,
            make_output_divfree: defaults.make_output_divfree,
            conserve_density: defaults.conserve_density,
            grid_scheme: defaults.grid_scheme,
            solve: defaults.solve,
        }
    }

    /// Whether the input velocity is projected before advection.
    pub fn make_input_divfree(&self) -> bool {
        self.make_input_divfree
    }

    /// Whether the output velocity is projected.
    pub fn make_output_divfree(&self) -> bool {
        self.make_output_divfree
    }

    /// Whether density is renormalized in closed domains.
    pub fn conserve_density(&self) -> bool {
        self.conserve_density
    }

    /// Advection scheme for density and velocity.
    pub fn grid_scheme(&self) -> GridScheme {
        self.grid_scheme
    }

    /// Pressure solve settings.
    pub fn solve_config(&self) -> &SolveConfig {
        &self.solve
    }

    /// Advance `fluid` by `dt`.
    ///
    /// `gravity` must match the domain rank. The input fluid is left
    /// untouched; on error no partial state escapes.
    pub fn step(
        &self,
        fluid: &Fluid,
        dt: f64,
        obstacles: &[Obstacle],
        gravity: &Gravity,
        density_effects: &[DensityEffect],
        velocity_effects: &[VelocityEffect],
    ) -> Result<Fluid, StepError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(StepError::InvalidDt { dt });
        }
        let rank = fluid.rank();
        if gravity.rank() != rank {
            return Err(FieldError::RankMismatch {
                expected: rank,
                actual: gravity.rank(),
            }
            .into());
        }

        let mut info = SolveInfo::default();
        let mut velocity = fluid.velocity().clone();
        if self.make_input_divfree {
            trace!("projecting input velocity");
            let projection = self.project(&velocity, fluid, obstacles)?;
            velocity = record(&mut info, projection);
        }

        trace!(scheme = ?self.grid_scheme, "advecting density and velocity");
        let mut density = self.grid_scheme.apply(fluid.density(), &velocity, dt)?;
        velocity = self.grid_scheme.apply(&velocity, &velocity, dt)?;
        let advected_velocity = velocity.clone();

        if self.conserve_density && fluid.domain().boundaries().all_solid() {
            density = normalize(&density, fluid.density())?;
        }

        for effect in density_effects {
            trace!(effect = effect.name(), "density effect");
            density = effect.apply(&density, dt)?;
        }
        for effect in velocity_effects {
            trace!(effect = effect.name(), "velocity effect");
            velocity = effect.apply(&velocity, dt)?;
        }

        velocity = buoyancy(&velocity, &density, gravity, fluid.buoyancy_factor(), dt)?;
        let divergent_velocity = velocity.clone();

        if self.make_output_divfree {
            trace!("projecting output velocity");
            let projection = self.project(&velocity, fluid, obstacles)?;
            velocity = record(&mut info, projection);
        }
        info.advected_velocity = Some(advected_velocity);
        info.divergent_velocity = Some(divergent_velocity);

        Ok(fluid.advanced(density, velocity, dt, info))
    }

    fn project(
        &self,
        velocity: &StaggeredGrid,
        fluid: &Fluid,
        obstacles: &[Obstacle],
    ) -> Result<Projection, StepError> {
        Ok(make_incompressible(velocity, fluid.domain(), obstacles, &self.solve)?)
    }
}

fn record(info: &mut SolveInfo, projection: Projection) -> StaggeredGrid {
    info.iterations = projection.iterations;
    info.converged = true;
    info.residual = projection.residual;
    info.pressure = Some(projection.pressure);
    info.divergence = Some(projection.divergence);
    projection.velocity
}

/// `velocity + dt * factor * density * (-gravity)`, with the density
/// sampled at the face centers.
fn buoyancy(
    velocity: &StaggeredGrid,
    density: &CenteredGrid,
    gravity: &Gravity,
    factor: f64,
    dt: f64,
) -> Result<StaggeredGrid, FieldError> {
    if factor == 0.0 || dt == 0.0 || gravity.is_zero() {
        return Ok(velocity.clone());
    }
    let g = gravity.vector();
    let force = resample_to_staggered(density, velocity)?.map(|d, rho| -g[d] * factor * dt * rho);
    velocity.add(&force)
}

impl IncompressibleFlowBuilder {
    /// Project the velocity before advecting. Default: `false`.
    pub fn make_input_divfree(mut self, enabled: bool) -> Self {
        self.make_input_divfree = enabled;
        self
    }

    /// Project the velocity at the end of the step. Default: `true`.
    pub fn make_output_divfree(mut self, enabled: bool) -> Self {
        self.make_output_divfree = enabled;
        self
    }

    /// Renormalize density in fully closed domains. Default: `true`.
    pub fn conserve_density(mut self, enabled: bool) -> Self {
        self.conserve_density = enabled;
        self
    }

    /// Grid advection scheme. Default: semi-Lagrangian.
    pub fn grid_scheme(mut self, scheme: GridScheme) -> Self {
        self.grid_scheme = scheme;
        self
    }

    /// Pressure solve settings.
    pub fn solve(mut self, solve: SolveConfig) -> Self {
        self.solve = solve;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<IncompressibleFlow, String> {
        self.grid_scheme.validate().map_err(|e| e.to_string())?;
        self.solve.validate()?;
        Ok(IncompressibleFlow {
            make_input_divfree: self.make_input_divfree,
            make_output_divfree: self.make_output_divfree,
            conserve_density: self.conserve_density,
            grid_scheme: self.grid_scheme,
            solve: self.solve,
        })
    }
}

impl Physics for IncompressibleFlow {
    fn name(&self) -> &str {
        "IncompressibleFlow"
    }

    fn step(&self, fluid: &Fluid, dt: f64, environment: &Environment) -> Result<Fluid, StepError> {
        IncompressibleFlow::step(
            self,
            fluid,
            dt,
            &environment.obstacles,
            &environment.gravity,
            &environment.density_effects,
            &environment.velocity_effects,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;
    use swirl_space::{Boundaries, Bounds, Domain, Material};

    fn domain(material: Material) -> Domain {
        Domain::new(
            Bounds::from_size(&[6.0, 6.0]).unwrap(),
            smallvec![6, 6],
            Boundaries::uniform(2, material).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn builder_defaults() {
        let flow = IncompressibleFlow::builder().build().unwrap();
        assert_eq!(flow, IncompressibleFlow::default());
        assert!(!flow.make_input_divfree());
        assert!(flow.conserve_density());
        assert_eq!(flow.grid_scheme(), GridScheme::SemiLagrangian);
    }

    #[test]
    fn builder_rejects_bad_scheme_and_tolerance() {
        let err = IncompressibleFlow::builder()
            .grid_scheme(GridScheme::MacCormack {
                correction_strength: 2.0,
            })
            .build()
            .unwrap_err();
        assert!(err.contains("correction_strength"));
        let err = IncompressibleFlow::builder()
            .solve(SolveConfig {
                relative_tolerance: f64::NAN,
                ..SolveConfig::default()
            })
            .build()
            .unwrap_err();
        assert!(err.contains("relative_tolerance"));
    }

    #[test]
    fn invalid_dt_is_rejected() {
        let fluid = Fluid::at_rest(domain(Material::Closed)).unwrap();
        let flow = IncompressibleFlow::default();
        for dt in [-1.0, f64::NAN, f64::INFINITY] {
            let err = flow
                .step(&fluid, dt, &[], &Gravity::none(2), &[], &[])
                .unwrap_err();
            assert!(matches!(err, StepError::InvalidDt { .. }));
        }
    }

    #[test]
    fn gravity_rank_is_checked() {
        let fluid = Fluid::at_rest(domain(Material::Closed)).unwrap();
        let err = IncompressibleFlow::default()
            .step(&fluid, 1.0, &[], &Gravity::standard(3), &[], &[])
            .unwrap_err();
        assert!(matches!(err, StepError::Field(FieldError::RankMismatch { .. })));
    }

    #[test]
    fn step_records_diagnostics_and_age() {
        let d = domain(Material::Closed);
        let rho = d
            .centered_grid(1, d.boundaries().scalar_extrapolation(), |p| {
                smallvec![if p[1] < 2.0 { 1.0 } else { 0.0 }]
            })
            .unwrap();
        let fluid = Fluid::builder(d).density(rho).buoyancy_factor(0.5).build().unwrap();
        let next = IncompressibleFlow::default()
            .step(&fluid, 0.5, &[], &Gravity::standard(2), &[], &[])
            .unwrap();
        assert_eq!(next.age(), 0.5);
        let info = next.solve_info();
        assert!(info.converged);
        assert!(info.pressure.is_some());
        assert!(info.divergent_velocity.is_some());
        // The input is untouched.
        assert_eq!(fluid.age(), 0.0);
        assert_eq!(fluid.solve_info(), &SolveInfo::default());
    }

    #[test]
    fn input_projection_alone_records_its_diagnostics() {
        let d = domain(Material::Closed);
        let fluid = Fluid::builder(d.clone())
            .velocity(d.staggered_grid(|axis, p| p[axis] * 0.3).unwrap())
            .build()
            .unwrap();
        let expected =
            make_incompressible(fluid.velocity(), &d, &[], &SolveConfig::default()).unwrap();
        assert!(expected.iterations > 0);

        let flow = IncompressibleFlow::builder()
            .make_input_divfree(true)
            .make_output_divfree(false)
            .build()
            .unwrap();
        let next = flow.step(&fluid, 0.0, &[], &Gravity::none(2), &[], &[]).unwrap();
        assert!(next.velocity().sub(&expected.velocity).unwrap().max_abs() < 1e-12);

        let info = next.solve_info();
        assert!(info.converged);
        assert_eq!(info.iterations, expected.iterations);
        assert_eq!(info.pressure.as_ref(), Some(&expected.pressure));
        assert_eq!(info.divergence.as_ref(), Some(&expected.divergence));
        // Advection starts from the projected velocity.
        let advected = info.advected_velocity.as_ref().unwrap();
        assert!(advected.sub(&expected.velocity).unwrap().max_abs() < 1e-12);
        assert_eq!(info.divergent_velocity.as_ref(), Some(advected));
    }

    #[test]
    fn buoyancy_pushes_dense_fluid_up() {
        let d = domain(Material::Closed);
        let rho = d.scalar_grid(2.0).unwrap();
        let v = buoyancy(&d.zero_velocity(), &rho, &Gravity::standard(2), 0.1, 1.0).unwrap();
        assert!(v.component(0).iter().all(|x| *x == 0.0));
        let expected = 2.0 * 0.1 * 9.81;
        assert!(v.component(1).iter().all(|y| (y - expected).abs() < 1e-12));
    }

    #[test]
    fn zero_dt_keeps_state() {
        let d = domain(Material::Periodic);
        let fluid = Fluid::builder(d.clone())
            .velocity(d.staggered_grid(|axis, p| (p[1 - axis] * 0.5).sin()).unwrap())
            .uniform_density(1.0)
            .build()
            .unwrap();
        let flow = IncompressibleFlow::builder().make_output_divfree(false).build().unwrap();
        let next = flow.step(&fluid, 0.0, &[], &Gravity::none(2), &[], &[]).unwrap();
        assert!(next.velocity().sub(fluid.velocity()).unwrap().max_abs() < 1e-12);
        assert!(next.density().sub(fluid.density()).unwrap().max_abs() < 1e-12);
        assert!(!next.solve_info().converged);
    }
}
