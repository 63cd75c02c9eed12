//! Cell-centered grids.

use smallvec::SmallVec;
use swirl_core::{FieldError, FieldKind, Index, Vector};

use crate::extrapolation::Extrapolation;
use crate::field::{GridField, SampledField};
use crate::grid::GridGeometry;
use crate::lattice::Lattice;
use crate::par::map_indexed;

/// Values stored at the centers of a uniform grid's cells.
///
/// Each cell holds `channels` values: 1 for a scalar such as density or
/// pressure, `rank` for a cell-centered vector. Storage is row-major (last
/// axis fastest) with channels interleaved.
///
/// # Examples
///
/// ```
/// use smallvec::smallvec;
/// use swirl_space::{Bounds, CenteredGrid, Extrapolation, GridGeometry, SampledField};
///
/// let geometry = GridGeometry::new(Bounds::from_size(&[4.0]).unwrap(), smallvec![4]).unwrap();
/// let ramp = CenteredGrid::from_fn(geometry, 1, Extrapolation::Boundary, |p| smallvec![p[0]]).unwrap();
/// assert_eq!(ramp.values(), &[0.5, 1.5, 2.5, 3.5]);
/// assert!((ramp.sample(&[1.0]).unwrap()[0] - 1.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CenteredGrid {
    geometry: GridGeometry,
    lattice: Lattice,
    channels: usize,
    values: Vec<f64>,
    extrapolation: Extrapolation,
}

impl CenteredGrid {
    /// Wrap a value buffer of `cell_count * channels` entries.
    pub fn new(
        geometry: GridGeometry,
        channels: usize,
        values: Vec<f64>,
        extrapolation: Extrapolation,
    ) -> Result<Self, FieldError> {
        let expected = geometry.cell_count() * channels;
        if channels == 0 || values.len() != expected {
            return Err(FieldError::ShapeMismatch {
                context: "CenteredGrid::new".into(),
                expected,
                actual: values.len(),
            });
        }
        let lattice = geometry.cell_lattice();
        Ok(Self {
            geometry,
            lattice,
            channels,
            values,
            extrapolation,
        })
    }

    /// A grid with every channel of every cell set to `value`.
    pub fn uniform(
        geometry: GridGeometry,
        channels: usize,
        value: f64,
        extrapolation: Extrapolation,
    ) -> Result<Self, FieldError> {
        let n = geometry.cell_count() * channels;
        Self::new(geometry, channels, vec![value; n], extrapolation)
    }

    /// Evaluate `f` at every cell center.
    ///
    /// Returns `Err` if `f` returns a vector with other than `channels`
    /// entries.
    pub fn from_fn<F>(
        geometry: GridGeometry,
        channels: usize,
        extrapolation: Extrapolation,
        f: F,
    ) -> Result<Self, FieldError>
    where
        F: Fn(&[f64]) -> Vector + Sync + Send,
    {
        let lattice = geometry.cell_lattice();
        let per_cell = map_indexed(lattice.len(), |i| f(&lattice.point(i)));
        let mut values = Vec::with_capacity(per_cell.len() * channels);
        for v in per_cell {
            if v.len() != channels {
                return Err(FieldError::ShapeMismatch {
                    context: "CenteredGrid::from_fn".into(),
                    expected: channels,
                    actual: v.len(),
                });
            }
            values.extend_from_slice(&v);
        }
        Self::new(geometry, channels, values, extrapolation)
    }

    /// The grid geometry.
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Cells per axis.
    pub fn resolution(&self) -> &Index {
        self.geometry.resolution()
    }

    /// Cell spacing per axis.
    pub fn dx(&self) -> &Vector {
        self.geometry.dx()
    }

    /// The raw value buffer.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Consume the grid, returning the value buffer.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.lattice.len()
    }

    /// Same geometry and extrapolation with a new value buffer.
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self, FieldError> {
        if values.len() != self.values.len() {
            return Err(FieldError::ShapeMismatch {
                context: "CenteredGrid::with_values".into(),
                expected: self.values.len(),
                actual: values.len(),
            });
        }
        Ok(self.with_buffer(values))
    }

    /// Same values with a different extrapolation.
    pub fn with_extrapolation(&self, extrapolation: Extrapolation) -> Self {
        let mut grid = self.clone();
        grid.extrapolation = extrapolation;
        grid
    }

    /// Cell center positions in storage order.
    pub fn points(&self) -> Vec<Vector> {
        self.lattice.points()
    }

    /// Multi-index of the cell stored at `flat`.
    pub fn cell_index(&self, flat: usize) -> Index {
        self.lattice.unflat(flat)
    }

    /// Value of channel `ch` at a cell index that may lie outside the grid,
    /// resolved through the extrapolation.
    pub fn value_at(&self, index: &[i64], ch: usize) -> f64 {
        self.lattice
            .value(&self.values, self.channels, &self.extrapolation, index, ch)
    }

    /// Storage index of the cell an out-of-range index refers to, or
    /// `None` where the extrapolation supplies a constant instead.
    pub fn stored_index(&self, index: &[i64]) -> Option<usize> {
        self.lattice.resolve(&self.extrapolation, index)
    }

    /// The `2^rank` cell values surrounding `point`.
    pub fn closest_values(&self, point: &[f64]) -> Result<Vec<Vector>, FieldError> {
        self.check_rank(point)?;
        Ok(self
            .lattice
            .corners(&self.values, self.channels, &self.extrapolation, point))
    }

    /// Apply `f` to every stored value.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64 + Sync + Send,
    {
        let values = map_indexed(self.values.len(), |i| f(self.values[i]));
        self.with_buffer(values)
    }

    /// Combine two same-shaped grids value by value.
    pub fn zip_with<F>(&self, other: &Self, context: &str, f: F) -> Result<Self, FieldError>
    where
        F: Fn(f64, f64) -> f64 + Sync + Send,
    {
        if self.geometry != other.geometry || self.channels != other.channels {
            return Err(FieldError::ShapeMismatch {
                context: context.into(),
                expected: self.values.len(),
                actual: other.values.len(),
            });
        }
        let values = map_indexed(self.values.len(), |i| f(self.values[i], other.values[i]));
        Ok(self.with_buffer(values))
    }

    /// `self + other`.
    pub fn add(&self, other: &Self) -> Result<Self, FieldError> {
        self.zip_with(other, "CenteredGrid::add", |a, b| a + b)
    }

    /// `self - other`.
    pub fn sub(&self, other: &Self) -> Result<Self, FieldError> {
        self.zip_with(other, "CenteredGrid::sub", |a, b| a - b)
    }

    /// `self * other`, value by value.
    pub fn mul(&self, other: &Self) -> Result<Self, FieldError> {
        self.zip_with(other, "CenteredGrid::mul", |a, b| a * b)
    }

    /// `self * factor`.
    pub fn scale(&self, factor: f64) -> Self {
        self.map(|v| v * factor)
    }

    /// Sum of each channel over all cells.
    pub fn sum(&self) -> Vector {
        let mut out: Vector = SmallVec::from_elem(0.0, self.channels);
        for cell in self.values.chunks_exact(self.channels) {
            for (o, v) in out.iter_mut().zip(cell) {
                *o += v;
            }
        }
        out
    }

    /// Mean of each channel over all cells.
    pub fn mean(&self) -> Vector {
        let n = self.cell_count() as f64;
        self.sum().into_iter().map(|s| s / n).collect()
    }

    /// Sum of each channel times the cell volume.
    pub fn integral(&self) -> Vector {
        let vol = self.geometry.cell_volume();
        self.sum().into_iter().map(|s| s * vol).collect()
    }

    /// Largest absolute stored value.
    pub fn max_abs(&self) -> f64 {
        self.values.iter().fold(0.0, |m, v| m.max(v.abs()))
    }

    fn with_buffer(&self, values: Vec<f64>) -> Self {
        Self {
            geometry: self.geometry.clone(),
            lattice: self.lattice.clone(),
            channels: self.channels,
            values,
            extrapolation: self.extrapolation.clone(),
        }
    }

    fn check_rank(&self, point: &[f64]) -> Result<(), FieldError> {
        if point.len() != self.geometry.rank() {
            return Err(FieldError::RankMismatch {
                expected: self.geometry.rank(),
                actual: point.len(),
            });
        }
        Ok(())
    }
}

impl SampledField for CenteredGrid {
    fn kind(&self) -> FieldKind {
        FieldKind::Centered
    }

    fn rank(&self) -> Option<usize> {
        Some(self.geometry.rank())
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn extrapolation(&self) -> &Extrapolation {
        &self.extrapolation
    }

    fn sample(&self, point: &[f64]) -> Result<Vector, FieldError> {
        self.check_rank(point)?;
        Ok(self
            .lattice
            .interpolate(&self.values, self.channels, &self.extrapolation, point))
    }
}

impl GridField for CenteredGrid {
    fn lattice_count(&self) -> usize {
        1
    }

    fn lattice_points(&self, _l: usize) -> Vec<Vector> {
        self.points()
    }

    fn lattice_values(&self, _l: usize) -> Vec<Vector> {
        self.values
            .chunks_exact(self.channels)
            .map(SmallVec::from_slice)
            .collect()
    }

    fn sample_lattice(&self, _l: usize, point: &[f64]) -> Result<Vector, FieldError> {
        self.sample(point)
    }

    fn closest_lattice_values(&self, _l: usize, point: &[f64]) -> Result<Vec<Vector>, FieldError> {
        self.closest_values(point)
    }

    fn with_lattice_values(&self, values: Vec<Vec<Vector>>) -> Result<Self, FieldError> {
        if values.len() != 1 {
            return Err(FieldError::ShapeMismatch {
                context: "CenteredGrid lattices".into(),
                expected: 1,
                actual: values.len(),
            });
        }
        let flat: Vec<f64> = values.into_iter().flatten().flatten().collect();
        self.with_values(flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Bounds;
    use smallvec::smallvec;

    fn geometry_2d() -> GridGeometry {
        GridGeometry::new(Bounds::from_size(&[2.0, 3.0]).unwrap(), smallvec![2, 3]).unwrap()
    }

    #[test]
    fn new_rejects_wrong_length() {
        let err = CenteredGrid::new(geometry_2d(), 1, vec![0.0; 5], Extrapolation::ZERO);
        assert!(matches!(
            err,
            Err(FieldError::ShapeMismatch {
                expected: 6,
                actual: 5,
                ..
            })
        ));
    }

    #[test]
    fn from_fn_row_major() {
        let g = CenteredGrid::from_fn(geometry_2d(), 1, Extrapolation::ZERO, |p| {
            smallvec![10.0 * p[0] + p[1]]
        })
        .unwrap();
        // (0.5, 0.5) (0.5, 1.5) (0.5, 2.5) (1.5, 0.5) ...
        assert_eq!(g.values(), &[5.5, 6.5, 7.5, 15.5, 16.5, 17.5]);
    }

    #[test]
    fn value_at_honours_extrapolation() {
        let g = CenteredGrid::uniform(geometry_2d(), 1, 3.0, Extrapolation::ONE).unwrap();
        assert_eq!(g.value_at(&[0, 0], 0), 3.0);
        assert_eq!(g.value_at(&[-1, 0], 0), 1.0);
        assert_eq!(g.value_at(&[0, 3], 0), 1.0);
        assert_eq!(g.stored_index(&[1, 2]), Some(5));
        assert_eq!(g.stored_index(&[2, 0]), None);
    }

    #[test]
    fn sample_rejects_wrong_rank() {
        let g = CenteredGrid::uniform(geometry_2d(), 1, 3.0, Extrapolation::ZERO).unwrap();
        assert_eq!(
            g.sample(&[0.5]).unwrap_err(),
            FieldError::RankMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn arithmetic_and_reductions() {
        let a = CenteredGrid::uniform(geometry_2d(), 1, 2.0, Extrapolation::ZERO).unwrap();
        let b = CenteredGrid::uniform(geometry_2d(), 1, 0.5, Extrapolation::ZERO).unwrap();
        assert_eq!(a.add(&b).unwrap().sum()[0], 15.0);
        assert_eq!(a.sub(&b).unwrap().mean()[0], 1.5);
        assert_eq!(a.mul(&b).unwrap().max_abs(), 1.0);
        assert_eq!(a.scale(-2.0).max_abs(), 4.0);
        assert_eq!(a.integral()[0], 12.0);
    }

    #[test]
    fn mismatched_shapes_fail() {
        let a = CenteredGrid::uniform(geometry_2d(), 1, 2.0, Extrapolation::ZERO).unwrap();
        let b = CenteredGrid::uniform(geometry_2d(), 2, 2.0, Extrapolation::ZERO).unwrap();
        assert!(a.add(&b).is_err());
    }

    #[test]
    fn multichannel_sampling() {
        let g = CenteredGrid::from_fn(geometry_2d(), 2, Extrapolation::Boundary, |p| {
            smallvec![p[0], -p[1]]
        })
        .unwrap();
        let v = g.sample(&[1.0, 1.0]).unwrap();
        assert!((v[0] - 1.0).abs() < 1e-12);
        assert!((v[1] + 1.0).abs() < 1e-12);
        assert_eq!(g.closest_values(&[1.0, 1.0]).unwrap().len(), 4);
    }

    #[test]
    fn sampling_compliance() {
        let g = CenteredGrid::from_fn(geometry_2d(), 2, Extrapolation::ZERO, |p| {
            smallvec![p[0] * p[1], 1.0]
        })
        .unwrap();
        let points = g.points();
        crate::compliance::run_full_compliance(&g, &points);
        let stored: Vec<f64> = g.values().iter().step_by(2).copied().collect();
        crate::compliance::assert_interpolates_stored(&g, &points, &stored, 0);
    }
}
