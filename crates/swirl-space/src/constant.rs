//! Spatially uniform fields.

use swirl_core::{FieldError, FieldKind, Vector};

use crate::extrapolation::Extrapolation;
use crate::field::SampledField;

/// A field with the same value everywhere. Advection leaves it unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantField {
    value: Vector,
    extrapolation: Extrapolation,
}

impl ConstantField {
    /// A constant field whose extrapolation is `Boundary`.
    pub fn new(value: Vector) -> Self {
        Self {
            value,
            extrapolation: Extrapolation::Boundary,
        }
    }

    /// The uniform value.
    pub fn value(&self) -> &Vector {
        &self.value
    }
}

impl SampledField for ConstantField {
    fn kind(&self) -> FieldKind {
        FieldKind::Constant
    }

    fn rank(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> usize {
        self.value.len()
    }

    fn extrapolation(&self) -> &Extrapolation {
        &self.extrapolation
    }

    fn sample(&self, _point: &[f64]) -> Result<Vector, FieldError> {
        Ok(self.value.clone())
    }
}
