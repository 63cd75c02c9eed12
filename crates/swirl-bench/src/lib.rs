//! Benchmark profiles and utilities for the Swirl fluid framework.
//!
//! Provides pre-built [`WorldConfig`] profiles for benchmarking and examples:
//!
//! - [`reference_profile`]: 64x64 smoke plume (4K cells) with the full step
//! - [`stress_profile`]: 256x256 smoke plume (~65K cells) for stress testing
//! - [`plume_profile`]: the plume at any square resolution

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use smallvec::smallvec;
use swirl_core::FieldError;
use swirl_engine::{Environment, FieldEffect, Fluid, Gravity, IncompressibleFlow, WorldConfig};
use swirl_propagators::{GridScheme, Obstacle};
use swirl_space::{Boundaries, Bounds, Domain, Geometry, Material};

/// A square plume domain of `n x n` unit cells: solid walls, open top.
pub fn plume_domain(n: usize) -> Result<Domain, FieldError> {
    let boundaries = Boundaries::uniform(2, Material::Closed)?.with_face(1, true, Material::Open)?;
    Domain::new(
        Bounds::from_size(&[n as f64, n as f64])?,
        smallvec![n, n],
        boundaries,
    )
}

/// Build a smoke plume profile on an `n x n` grid.
///
/// Inflow near the floor, a cylinder in the plume's path, standard
/// gravity, buoyancy 0.1 and MacCormack advection. dt = 0.5.
pub fn plume_profile(n: usize) -> Result<WorldConfig, String> {
    let domain = plume_domain(n).map_err(|e| e.to_string())?;
    let s = n as f64 / 32.0;
    let fluid = Fluid::builder(domain).buoyancy_factor(0.1).build()?;
    let environment = Environment::new(2)
        .with_gravity(Gravity::standard(2))
        .with_density_effect(Arc::new(FieldEffect::inflow(
            Geometry::sphere(smallvec![16.0 * s, 4.0 * s], 2.0 * s),
            smallvec![0.2],
        )))
        .with_obstacle(Obstacle::new(Geometry::sphere(
            smallvec![16.0 * s, 18.0 * s],
            3.0 * s,
        )));
    let physics = IncompressibleFlow::builder()
        .grid_scheme(GridScheme::MacCormack {
            correction_strength: 1.0,
        })
        .build()?;
    Ok(WorldConfig {
        fluid,
        physics: Box::new(physics),
        environment,
        dt: 0.5,
        move_obstacles: false,
    })
}

/// Build a reference benchmark profile: 64x64 grid (4K cells).
pub fn reference_profile() -> Result<WorldConfig, String> {
    plume_profile(64)
}

/// Build a stress benchmark profile: 256x256 grid (~65K cells).
///
/// Same setup as [`reference_profile`] at 16x the cell count.
pub fn stress_profile() -> Result<WorldConfig, String> {
    plume_profile(256)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swirl_engine::FluidWorld;

    #[test]
    fn reference_profile_validates() {
        reference_profile().unwrap().validate().unwrap();
    }

    #[test]
    fn stress_profile_validates() {
        let config = stress_profile().unwrap();
        config.validate().unwrap();
        assert_eq!(config.fluid.domain().geometry().cell_count(), 256 * 256);
    }

    #[test]
    fn small_plume_runs() {
        let mut world = FluidWorld::new(plume_profile(16).unwrap()).unwrap();
        world.run(3).unwrap();
        assert!(world.last_metrics().is_finite());
        assert!(world.fluid().total_density() > 0.0);
    }

    #[test]
    fn zero_resolution_is_rejected() {
        assert!(plume_profile(0).is_err());
    }
}
