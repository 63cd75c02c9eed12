//! Swirl: grid-based incompressible fluid simulation.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Swirl sub-crates. For most users, adding `swirl` as a single dependency is
//! sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use smallvec::smallvec;
//! use swirl::prelude::*;
//!
//! // A 16x16 box with solid walls and an open top.
//! let boundaries = Boundaries::uniform(2, Material::Closed)
//!     .unwrap()
//!     .with_face(1, true, Material::Open)
//!     .unwrap();
//! let domain = Domain::new(
//!     Bounds::from_size(&[16.0, 16.0]).unwrap(),
//!     smallvec![16, 16],
//!     boundaries,
//! )
//! .unwrap();
//!
//! let environment = Environment::new(2)
//!     .with_gravity(Gravity::standard(2))
//!     .with_density_effect(Arc::new(FieldEffect::inflow(
//!         Geometry::sphere(smallvec![8.0, 3.0], 1.5),
//!         smallvec![0.2],
//!     )));
//! let config = WorldConfig {
//!     fluid: Fluid::builder(domain).buoyancy_factor(0.1).build().unwrap(),
//!     physics: Box::new(IncompressibleFlow::default()),
//!     environment,
//!     dt: 1.0,
//!     move_obstacles: false,
//! };
//! let mut world = FluidWorld::new(config).unwrap();
//! let fluid = world.run(3).unwrap();
//! assert!(fluid.total_density() > 0.0);
//! assert_eq!(world.current_tick(), swirl::types::TickId(3));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `swirl-core` | Errors, tick IDs, field kinds |
//! | [`space`] | `swirl-space` | Grids, point clouds, domains, geometry, operators |
//! | [`propagators`] | `swirl-propagators` | Advection, conjugate gradient, pressure projection |
//! | [`engine`] | `swirl-engine` | Fluid state, incompressible flow, effects, world |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and errors (`swirl-core`).
pub use swirl_core as types;

/// Fields, domains and finite-difference operators (`swirl-space`).
///
/// Provides the [`space::SampledField`] trait and the concrete fields
/// [`space::CenteredGrid`], [`space::StaggeredGrid`], [`space::PointCloud`]
/// and [`space::ConstantField`].
pub use swirl_space as space;

/// Advection schemes and the pressure solve (`swirl-propagators`).
pub use swirl_propagators as propagators;

/// Fluid state, physics and the lockstep world (`swirl-engine`).
pub use swirl_engine as engine;

/// Common imports for typical Swirl usage.
///
/// ```rust
/// use swirl::prelude::*;
/// ```
pub mod prelude {
    // Core types and errors
    pub use swirl_core::{AdvectError, FieldError, FieldKind, SolveError, StepError, TickId};

    // Fields and domains
    pub use swirl_space::{
        Boundaries, Bounds, CenteredGrid, ConstantField, Domain, Extrapolation, Field, Geometry,
        Material, PointCloud, SampledField, StaggeredGrid,
    };

    // Advection and projection
    pub use swirl_propagators::{
        advect, make_incompressible, GridScheme, Obstacle, Projection, SolveConfig,
    };

    // Engine
    pub use swirl_engine::{
        EffectMode, Environment, FieldEffect, Fluid, FluidWorld, FnEffect, Gravity,
        IncompressibleFlow, Physics, StepMetrics, WorldConfig,
    };
}
