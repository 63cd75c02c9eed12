//! Field substrate for Swirl simulations.
//!
//! This crate defines the discretized fields the fluid solver operates on,
//! together with the [`SampledField`] trait through which every consumer
//! reads them.
//!
//! # Fields
//!
//! - [`CenteredGrid`]: values at cell centers (density, pressure, masks)
//! - [`StaggeredGrid`]: vector components on cell faces (velocity)
//! - [`PointCloud`]: particles with per-point values
//! - [`ConstantField`]: a uniform value
//!
//! # Domains
//!
//! A [`Domain`] pairs a [`GridGeometry`] with per-face [`Boundaries`]. Each
//! boundary [`Material`] implies the [`Extrapolation`] used for scalars,
//! velocities, and the projection masks.
//!
//! # Operators
//!
//! [`ops`] holds the finite-difference operators (divergence, staggered
//! gradient, min-staggering) and resampling/normalization helpers.
//! [`Geometry`] describes obstacle and inflow shapes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boundary;
pub mod centered;
pub mod constant;
pub mod domain;
pub mod extrapolation;
pub mod field;
pub mod geom;
pub mod grid;
pub mod ops;
pub mod par;
pub mod points;
pub mod staggered;

mod lattice;

#[cfg(test)]
pub(crate) mod compliance;

pub use boundary::{Boundaries, Material};
pub use centered::CenteredGrid;
pub use constant::ConstantField;
pub use domain::Domain;
pub use extrapolation::Extrapolation;
pub use field::{Field, GridField, SampledField};
pub use geom::{AngularVelocity, Geometry};
pub use grid::{Bounds, GridGeometry, MAX_RANK};
pub use points::PointCloud;
pub use staggered::StaggeredGrid;
