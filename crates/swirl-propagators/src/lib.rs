//! Numerical core of Swirl: advection and incompressibility.
//!
//! # Pipeline
//!
//! A fluid step transports density and velocity with [`advect`] and then
//! restores incompressibility with [`make_incompressible`]:
//!
//! 1. [`Advector`] picks a scheme per field kind (semi-Lagrangian or
//!    MacCormack for grids, Euler or RK4 for point clouds)
//! 2. [`layer_obstacle_velocities`] imprints moving [`Obstacle`]s
//! 3. the pressure is solved from the [`MaskedLaplace`] operator with
//!    [`conjugate_gradient`](cg::conjugate_gradient)
//! 4. the pressure gradient is subtracted on fluid faces

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod advect;
pub mod cg;
pub mod obstacle;
pub mod projection;

pub use advect::{
    advect, mac_cormack, points, runge_kutta_4, semi_lagrangian, Advector, GridScheme, Scheme,
};
pub use cg::{conjugate_gradient, CgResult, LinearOperator, Tolerance};
pub use obstacle::Obstacle;
pub use projection::{
    fluid_masks, layer_obstacle_velocities, make_incompressible, masked_laplace, MaskedLaplace,
    Projection, SolveConfig,
};
