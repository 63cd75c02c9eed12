//! Core types and error enums for the Swirl fluid engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the rest of the workspace: field kinds, identifiers,
//! the `Vector`/`Index` aliases, and the layered error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod id;

pub use error::{AdvectError, FieldError, SolveError, StepError};
pub use field::FieldKind;
pub use id::{Index, TickId, Vector};
