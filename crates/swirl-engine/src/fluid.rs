//! The fluid state: density and velocity on a shared domain.

use swirl_space::{CenteredGrid, Domain, SampledField, StaggeredGrid};

/// Diagnostics of the most recent pressure solve.
///
/// Overwritten by every step. Fields are `None` until a step has projected
/// the velocity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolveInfo {
    /// CG iterations of the last projection.
    pub iterations: usize,
    /// Whether a projection ran and converged.
    pub converged: bool,
    /// Final residual norm of the last projection.
    pub residual: f64,
    /// The solved pressure.
    pub pressure: Option<CenteredGrid>,
    /// Mean-free divergence of the velocity handed to the solver.
    pub divergence: Option<CenteredGrid>,
    /// Velocity right after self-advection.
    pub advected_velocity: Option<StaggeredGrid>,
    /// Velocity after effects and buoyancy, before projection.
    pub divergent_velocity: Option<StaggeredGrid>,
}

/// A marker density (scalar, cell-centered) and a velocity (staggered) on
/// a [`Domain`].
///
/// Density always carries the domain's scalar extrapolation and velocity
/// the domain's vector extrapolation. A step never mutates a `Fluid`; it
/// produces a new one.
#[derive(Clone, Debug, PartialEq)]
pub struct Fluid {
    domain: Domain,
    density: CenteredGrid,
    velocity: StaggeredGrid,
    buoyancy_factor: f64,
    age: f64,
    solve_info: SolveInfo,
}

impl Fluid {
    /// Start building a fluid on `domain`.
    pub fn builder(domain: Domain) -> FluidBuilder {
        FluidBuilder::new(domain)
    }

    /// A fluid at rest with zero density.
    pub fn at_rest(domain: Domain) -> Result<Self, String> {
        FluidBuilder::new(domain).build()
    }

    /// The simulation domain.
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Marker density.
    pub fn density(&self) -> &CenteredGrid {
        &self.density
    }

    /// Velocity.
    pub fn velocity(&self) -> &StaggeredGrid {
        &self.velocity
    }

    /// Strength of the Boussinesq buoyancy force per unit density.
    pub fn buoyancy_factor(&self) -> f64 {
        self.buoyancy_factor
    }

    /// Simulated time.
    pub fn age(&self) -> f64 {
        self.age
    }

    /// Diagnostics of the last step.
    pub fn solve_info(&self) -> &SolveInfo {
        &self.solve_info
    }

    /// Spatial rank of the domain.
    pub fn rank(&self) -> usize {
        self.domain.rank()
    }

    /// Sum of the density over all cells.
    pub fn total_density(&self) -> f64 {
        self.density.sum()[0]
    }

    /// The successor state after a step of `dt`.
    pub(crate) fn advanced(
        &self,
        density: CenteredGrid,
        velocity: StaggeredGrid,
        dt: f64,
        solve_info: SolveInfo,
    ) -> Self {
        Self {
            domain: self.domain.clone(),
            density,
            velocity,
            buoyancy_factor: self.buoyancy_factor,
            age: self.age + dt,
            solve_info,
        }
    }
}

/// Builder for [`Fluid`].
///
/// Density defaults to zero and velocity to rest. Supplied grids must match
/// the domain's cells; their extrapolation is replaced by the domain's.
#[derive(Clone, Debug)]
pub struct FluidBuilder {
    domain: Domain,
    density: Option<CenteredGrid>,
    density_value: f64,
    velocity: Option<StaggeredGrid>,
    buoyancy_factor: f64,
    age: f64,
}

impl FluidBuilder {
    fn new(domain: Domain) -> Self {
        Self {
            domain,
            density: None,
            density_value: 0.0,
            velocity: None,
            buoyancy_factor: 0.0,
            age: 0.0,
        }
    }

    /// Initial density grid.
    pub fn density(mut self, density: CenteredGrid) -> Self {
        self.density = Some(density);
        self
    }

    /// Uniform initial density.
    pub fn uniform_density(mut self, value: f64) -> Self {
        self.density = None;
        self.density_value = value;
        self
    }

    /// Initial velocity grid.
    pub fn velocity(mut self, velocity: StaggeredGrid) -> Self {
        self.velocity = Some(velocity);
        self
    }

    /// Boussinesq buoyancy factor. Default: 0.
    pub fn buoyancy_factor(mut self, factor: f64) -> Self {
        self.buoyancy_factor = factor;
        self
    }

    /// Initial simulated time. Default: 0.
    pub fn age(mut self, age: f64) -> Self {
        self.age = age;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<Fluid, String> {
        if !self.buoyancy_factor.is_finite() {
            return Err(format!(
                "buoyancy_factor must be finite, got {}",
                self.buoyancy_factor
            ));
        }
        if !self.age.is_finite() {
            return Err(format!("age must be finite, got {}", self.age));
        }
        let boundaries = self.domain.boundaries();

        let density = match self.density {
            Some(grid) => {
                if grid.geometry() != self.domain.geometry() {
                    return Err("density grid does not match the domain".into());
                }
                if grid.channels() != 1 {
                    return Err(format!(
                        "density must be scalar, got {} channels",
                        grid.channels()
                    ));
                }
                grid.with_extrapolation(boundaries.scalar_extrapolation())
            }
            None => {
                if !self.density_value.is_finite() {
                    return Err(format!(
                        "density must be finite, got {}",
                        self.density_value
                    ));
                }
                self.domain
                    .scalar_grid(self.density_value)
                    .map_err(|e| e.to_string())?
            }
        };

        let velocity = match self.velocity {
            Some(grid) => {
                if grid.geometry() != self.domain.geometry() {
                    return Err("velocity grid does not match the domain".into());
                }
                grid.with_extrapolation(boundaries.vector_extrapolation())
                    .map_err(|e| e.to_string())?
            }
            None => self.domain.zero_velocity(),
        };

        Ok(Fluid {
            domain: self.domain,
            density,
            velocity,
            buoyancy_factor: self.buoyancy_factor,
            age: self.age,
            solve_info: SolveInfo::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;
    use swirl_space::{Boundaries, Bounds, Extrapolation, Material};

    fn domain(material: Material) -> Domain {
        Domain::new(
            Bounds::from_size(&[4.0, 4.0]).unwrap(),
            smallvec![4, 4],
            Boundaries::uniform(2, material).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn defaults_to_rest() {
        let fluid = Fluid::at_rest(domain(Material::Closed)).unwrap();
        assert_eq!(fluid.total_density(), 0.0);
        assert_eq!(fluid.velocity().max_abs(), 0.0);
        assert_eq!(fluid.age(), 0.0);
        assert_eq!(fluid.solve_info(), &SolveInfo::default());
    }

    #[test]
    fn grids_take_the_domain_extrapolation() {
        let d = domain(Material::Open);
        let rho = d.centered_grid(1, Extrapolation::Periodic, |_| smallvec![1.0]).unwrap();
        let fluid = Fluid::builder(d.clone()).density(rho).build().unwrap();
        assert_eq!(fluid.density().extrapolation(), &Extrapolation::ZERO);
        assert_eq!(fluid.velocity().extrapolation(), &Extrapolation::Boundary);
        assert_eq!(fluid.total_density(), 16.0);
    }

    #[test]
    fn mismatched_grids_are_rejected() {
        let d = domain(Material::Closed);
        let other = Domain::new(
            Bounds::from_size(&[4.0, 4.0]).unwrap(),
            smallvec![8, 8],
            Boundaries::uniform(2, Material::Closed).unwrap(),
        )
        .unwrap();
        let err = Fluid::builder(d.clone())
            .velocity(other.zero_velocity())
            .build()
            .unwrap_err();
        assert!(err.contains("velocity"));
        let vector_density = d.centered_grid(2, Extrapolation::ZERO, |_| smallvec![0.0, 0.0]).unwrap();
        assert!(Fluid::builder(d).density(vector_density).build().is_err());
    }

    #[test]
    fn non_finite_parameters_are_rejected() {
        let d = domain(Material::Closed);
        assert!(Fluid::builder(d.clone()).buoyancy_factor(f64::NAN).build().is_err());
        assert!(Fluid::builder(d.clone()).age(f64::INFINITY).build().is_err());
        assert!(Fluid::builder(d).uniform_density(f64::NAN).build().is_err());
    }
}
