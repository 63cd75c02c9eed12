//! Error types for the Swirl fluid engine.
//!
//! Organized by subsystem: field substrate, advection, pressure solve, and
//! the time-step orchestrator. Each layer wraps the one below it so that
//! `source()` walks back to the root cause.

use std::error::Error;
use std::fmt;

use crate::field::FieldKind;

/// Errors from field construction, arithmetic, and sampling.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldError {
    /// Two fields (or a field and a value buffer) disagree in size.
    ShapeMismatch {
        /// What was being combined.
        context: String,
        /// The expected number of values.
        expected: usize,
        /// The number of values actually supplied.
        actual: usize,
    },
    /// A point or vector has the wrong number of spatial components.
    RankMismatch {
        /// The spatial rank of the field.
        expected: usize,
        /// The rank of the offending point or vector.
        actual: usize,
    },
    /// A grid was requested with a zero-sized resolution axis.
    EmptyGrid,
    /// A bounding box has a non-positive or non-finite extent.
    InvalidBounds {
        /// Description of the offending axis.
        reason: String,
    },
    /// A boundary specification is inconsistent.
    InvalidBoundaries {
        /// Description of the inconsistency.
        reason: String,
    },
    /// The field cannot be sampled at arbitrary points.
    SamplingUnsupported {
        /// The kind of field that was sampled.
        kind: FieldKind,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch {
                context,
                expected,
                actual,
            } => write!(
                f,
                "shape mismatch in {context}: expected {expected} values, got {actual}"
            ),
            Self::RankMismatch { expected, actual } => {
                write!(f, "expected a rank-{expected} vector, got rank {actual}")
            }
            Self::EmptyGrid => write!(f, "grid resolution must be at least 1 on every axis"),
            Self::InvalidBounds { reason } => write!(f, "invalid bounds: {reason}"),
            Self::InvalidBoundaries { reason } => write!(f, "invalid boundaries: {reason}"),
            Self::SamplingUnsupported { kind } => {
                write!(f, "{kind} cannot be sampled at arbitrary points")
            }
        }
    }
}

impl Error for FieldError {}

/// Errors from the advection engine.
#[derive(Clone, Debug, PartialEq)]
pub enum AdvectError {
    /// No advection scheme is registered for this field kind.
    UnsupportedField {
        /// The kind of the field that could not be advected.
        kind: FieldKind,
    },
    /// Euler point advection requires the velocity to be sampled at
    /// exactly the advected cloud's points.
    MismatchedElements {
        /// Number of points in the advected cloud.
        field_points: usize,
        /// Number of points in the velocity cloud.
        velocity_points: usize,
    },
    /// A scheme was configured with an invalid parameter.
    InvalidScheme {
        /// Description of the invalid parameter.
        reason: String,
    },
    /// Sampling the field or the velocity failed.
    Field(FieldError),
}

impl fmt::Display for AdvectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedField { kind } => write!(f, "advection not supported for {kind}"),
            Self::MismatchedElements {
                field_points,
                velocity_points,
            } => write!(
                f,
                "point advection requires matching elements: field has {field_points} points, \
                 velocity has {velocity_points} points at different positions"
            ),
            Self::InvalidScheme { reason } => write!(f, "invalid advection scheme: {reason}"),
            Self::Field(e) => write!(f, "field: {e}"),
        }
    }
}

impl Error for AdvectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Field(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FieldError> for AdvectError {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}

/// Errors from the pressure projection.
#[derive(Clone, Debug, PartialEq)]
pub enum SolveError {
    /// The linear solve did not reach the requested tolerance.
    ///
    /// A non-converged pressure silently corrupts the velocity, so this is
    /// always fatal for the step that produced it.
    NotConverged {
        /// Iterations performed before giving up.
        iterations: usize,
        /// Euclidean norm of the final residual.
        residual: f64,
    },
    /// A field operation inside the projection failed.
    Field(FieldError),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConverged {
                iterations,
                residual,
            } => write!(
                f,
                "pressure solve did not converge after {iterations} iterations \
                 (residual {residual:e})"
            ),
            Self::Field(e) => write!(f, "field: {e}"),
        }
    }
}

impl Error for SolveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Field(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FieldError> for SolveError {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}

/// Errors from a full physics step.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// Advecting density or velocity failed.
    Advect(AdvectError),
    /// The pressure projection failed.
    Solve(SolveError),
    /// A field operation between stages failed.
    Field(FieldError),
    /// The requested time increment is negative or not finite.
    InvalidDt {
        /// The rejected value.
        dt: f64,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advect(e) => write!(f, "advection: {e}"),
            Self::Solve(e) => write!(f, "projection: {e}"),
            Self::Field(e) => write!(f, "field: {e}"),
            Self::InvalidDt { dt } => write!(f, "dt must be finite and >= 0, got {dt}"),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Advect(e) => Some(e),
            Self::Solve(e) => Some(e),
            Self::Field(e) => Some(e),
            Self::InvalidDt { .. } => None,
        }
    }
}

impl From<AdvectError> for StepError {
    fn from(e: AdvectError) -> Self {
        Self::Advect(e)
    }
}

impl From<SolveError> for StepError {
    fn from(e: SolveError) -> Self {
        Self::Solve(e)
    }
}

impl From<FieldError> for StepError {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}
