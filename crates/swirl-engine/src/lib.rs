//! Fluid simulation engine for Swirl.
//!
//! Holds the [`Fluid`] state, the [`IncompressibleFlow`] physics that
//! advances it, the [`Effect`]s and [`Gravity`] acting on it, and the
//! lockstep [`FluidWorld`] driver that owns a running simulation.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod effect;
pub mod flow;
pub mod fluid;
pub mod metrics;
pub mod physics;
pub mod world;

pub use config::{ConfigError, WorldConfig};
pub use effect::{
    up_axis, DensityEffect, Effect, EffectMode, FieldEffect, FnEffect, Gravity, VelocityEffect,
    STANDARD_GRAVITY,
};
pub use flow::{IncompressibleFlow, IncompressibleFlowBuilder};
pub use fluid::{Fluid, FluidBuilder, SolveInfo};
pub use metrics::StepMetrics;
pub use physics::{Environment, Physics};
pub use world::FluidWorld;
