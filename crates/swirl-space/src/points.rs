//! Point clouds: discrete sample positions carrying values.

use swirl_core::{FieldError, FieldKind, Vector};

use crate::extrapolation::Extrapolation;
use crate::field::SampledField;

/// A set of positions with one value vector per position.
///
/// Point clouds are the representation for particles and markers. They can
/// be moved by advection but cannot themselves be interpolated at arbitrary
/// points.
#[derive(Clone, Debug, PartialEq)]
pub struct PointCloud {
    points: Vec<Vector>,
    values: Vec<Vector>,
    extrapolation: Extrapolation,
    add_overlapping: bool,
}

impl PointCloud {
    /// Create a cloud.
    ///
    /// Returns `Err` if `values` and `points` differ in length, if points
    /// differ in rank, or if values differ in channel count.
    pub fn new(
        points: Vec<Vector>,
        values: Vec<Vector>,
        extrapolation: Extrapolation,
    ) -> Result<Self, FieldError> {
        if points.len() != values.len() {
            return Err(FieldError::ShapeMismatch {
                context: "PointCloud values".into(),
                expected: points.len(),
                actual: values.len(),
            });
        }
        if let Some(first) = points.first() {
            if let Some(bad) = points.iter().find(|p| p.len() != first.len()) {
                return Err(FieldError::RankMismatch {
                    expected: first.len(),
                    actual: bad.len(),
                });
            }
        }
        if let Some(first) = values.first() {
            if let Some(bad) = values.iter().find(|v| v.len() != first.len()) {
                return Err(FieldError::ShapeMismatch {
                    context: "PointCloud channels".into(),
                    expected: first.len(),
                    actual: bad.len(),
                });
            }
        }
        Ok(Self {
            points,
            values,
            extrapolation,
            add_overlapping: false,
        })
    }

    /// Set whether values of coinciding points add up when the cloud is
    /// later resampled.
    pub fn with_add_overlapping(mut self, add_overlapping: bool) -> Self {
        self.add_overlapping = add_overlapping;
        self
    }

    /// Sample positions.
    pub fn points(&self) -> &[Vector] {
        &self.points
    }

    /// Per-point values.
    pub fn values(&self) -> &[Vector] {
        &self.values
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the cloud holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The `add_overlapping` flag.
    pub fn add_overlapping(&self) -> bool {
        self.add_overlapping
    }

    /// Returns `true` if both clouds have identical positions.
    pub fn same_elements(&self, other: &PointCloud) -> bool {
        self.points == other.points
    }

    /// The same cloud with each point moved to a new position.
    ///
    /// Values, extrapolation, and the overlap flag are carried over.
    pub fn with_points(&self, points: Vec<Vector>) -> Result<Self, FieldError> {
        if points.len() != self.points.len() {
            return Err(FieldError::ShapeMismatch {
                context: "PointCloud::with_points".into(),
                expected: self.points.len(),
                actual: points.len(),
            });
        }
        Ok(Self {
            points,
            values: self.values.clone(),
            extrapolation: self.extrapolation.clone(),
            add_overlapping: self.add_overlapping,
        })
    }
}

impl SampledField for PointCloud {
    fn kind(&self) -> FieldKind {
        FieldKind::PointCloud
    }

    fn rank(&self) -> Option<usize> {
        self.points.first().map(|p| p.len())
    }

    fn channels(&self) -> usize {
        self.values.first().map_or(0, |v| v.len())
    }

    fn extrapolation(&self) -> &Extrapolation {
        &self.extrapolation
    }

    fn sample(&self, _point: &[f64]) -> Result<Vector, FieldError> {
        Err(FieldError::SamplingUnsupported {
            kind: FieldKind::PointCloud,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn length_mismatch_rejected() {
        let err = PointCloud::new(
            vec![smallvec![0.0, 0.0], smallvec![1.0, 1.0]],
            vec![smallvec![1.0]],
            Extrapolation::ZERO,
        );
        assert!(matches!(
            err,
            Err(FieldError::ShapeMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn mixed_rank_rejected() {
        let err = PointCloud::new(
            vec![smallvec![0.0, 0.0], smallvec![1.0]],
            vec![smallvec![1.0], smallvec![1.0]],
            Extrapolation::ZERO,
        );
        assert!(matches!(err, Err(FieldError::RankMismatch { .. })));
    }

    #[test]
    fn with_points_keeps_metadata() {
        let cloud = PointCloud::new(vec![smallvec![0.0]], vec![smallvec![7.0]], Extrapolation::ONE)
            .unwrap()
            .with_add_overlapping(true);
        let moved = cloud.with_points(vec![smallvec![2.0]]).unwrap();
        assert_eq!(moved.points()[0].as_slice(), &[2.0]);
        assert_eq!(moved.values(), cloud.values());
        assert!(moved.add_overlapping());
        assert_eq!(moved.extrapolation(), &Extrapolation::ONE);
        assert!(!moved.same_elements(&cloud));
    }
}
