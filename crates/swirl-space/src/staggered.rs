//! Face-staggered vector grids (MAC layout).

use smallvec::{smallvec, SmallVec};
use swirl_core::{FieldError, FieldKind, Index, Vector};

use crate::extrapolation::Extrapolation;
use crate::field::{GridField, SampledField};
use crate::grid::GridGeometry;
use crate::lattice::Lattice;
use crate::par::map_indexed;

/// A vector field whose component `d` is stored on the cell faces normal to
/// axis `d`.
///
/// Along axis `d` there are `res[d] + 1` faces, or `res[d]` when the
/// extrapolation wraps that axis. Every other axis of component `d` is
/// sampled at cell centers.
#[derive(Clone, Debug, PartialEq)]
pub struct StaggeredGrid {
    geometry: GridGeometry,
    lattices: Vec<Lattice>,
    components: Vec<Vec<f64>>,
    extrapolation: Extrapolation,
}

fn face_lattices(geometry: &GridGeometry, extrapolation: &Extrapolation) -> Vec<Lattice> {
    (0..geometry.rank())
        .map(|d| geometry.face_lattice(d, extrapolation.is_periodic(d)))
        .collect()
}

impl StaggeredGrid {
    /// Wrap one value buffer per axis.
    ///
    /// Returns `Err` if there are not exactly `rank` buffers or any buffer
    /// has the wrong face count.
    pub fn new(
        geometry: GridGeometry,
        components: Vec<Vec<f64>>,
        extrapolation: Extrapolation,
    ) -> Result<Self, FieldError> {
        if components.len() != geometry.rank() {
            return Err(FieldError::RankMismatch {
                expected: geometry.rank(),
                actual: components.len(),
            });
        }
        let lattices = face_lattices(&geometry, &extrapolation);
        for (d, (lattice, values)) in lattices.iter().zip(components.iter()).enumerate() {
            if values.len() != lattice.len() {
                return Err(FieldError::ShapeMismatch {
                    context: format!("StaggeredGrid component {d}"),
                    expected: lattice.len(),
                    actual: values.len(),
                });
            }
        }
        Ok(Self {
            geometry,
            lattices,
            components,
            extrapolation,
        })
    }

    /// Evaluate `f(axis, face_center)` on every face.
    pub fn from_fn<F>(
        geometry: GridGeometry,
        extrapolation: Extrapolation,
        f: F,
    ) -> Result<Self, FieldError>
    where
        F: Fn(usize, &[f64]) -> f64 + Sync + Send,
    {
        let components = face_lattices(&geometry, &extrapolation)
            .iter()
            .enumerate()
            .map(|(d, lattice)| map_indexed(lattice.len(), |i| f(d, &lattice.point(i))))
            .collect();
        Self::new(geometry, components, extrapolation)
    }

    /// A grid with component `d` set to `value[d]` on every face.
    pub fn uniform(
        geometry: GridGeometry,
        value: &[f64],
        extrapolation: Extrapolation,
    ) -> Result<Self, FieldError> {
        if value.len() != geometry.rank() {
            return Err(FieldError::RankMismatch {
                expected: geometry.rank(),
                actual: value.len(),
            });
        }
        let components = face_lattices(&geometry, &extrapolation)
            .iter()
            .zip(value)
            .map(|(lattice, v)| vec![*v; lattice.len()])
            .collect();
        Self::new(geometry, components, extrapolation)
    }

    /// The all-zero field.
    pub fn zeros(geometry: GridGeometry, extrapolation: Extrapolation) -> Self {
        let lattices = face_lattices(&geometry, &extrapolation);
        let components = lattices.iter().map(|l| vec![0.0; l.len()]).collect();
        Self {
            geometry,
            lattices,
            components,
            extrapolation,
        }
    }

    /// The grid geometry.
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Face values of component `d`.
    pub fn component(&self, d: usize) -> &[f64] {
        &self.components[d]
    }

    /// All component buffers.
    pub fn components(&self) -> &[Vec<f64>] {
        &self.components
    }

    /// Faces per axis of component `d`.
    pub fn face_counts(&self, d: usize) -> &Index {
        &self.lattices[d].counts
    }

    /// Face-center positions of component `d` in storage order.
    pub fn face_points(&self, d: usize) -> Vec<Vector> {
        self.lattices[d].points()
    }

    /// Multi-index of face `flat` of component `d`.
    pub fn face_index(&self, d: usize, flat: usize) -> Index {
        self.lattices[d].unflat(flat)
    }

    /// Value of component `d` at a face index that may lie outside the
    /// stored faces, resolved through the extrapolation.
    pub fn component_value_at(&self, d: usize, index: &[i64]) -> f64 {
        self.lattices[d].value(&self.components[d], 1, &self.extrapolation, index, 0)
    }

    /// Interpolate component `d` at `point`.
    pub fn sample_component(&self, d: usize, point: &[f64]) -> Result<f64, FieldError> {
        self.check_rank(point)?;
        Ok(self.lattices[d].interpolate(&self.components[d], 1, &self.extrapolation, point)[0])
    }

    /// The `2^rank` face values of component `d` surrounding `point`.
    pub fn closest_component_values(&self, d: usize, point: &[f64]) -> Result<Vec<f64>, FieldError> {
        self.check_rank(point)?;
        Ok(self.lattices[d]
            .corners(&self.components[d], 1, &self.extrapolation, point)
            .into_iter()
            .map(|v| v[0])
            .collect())
    }

    /// Same layout with new component buffers.
    pub fn with_components(&self, components: Vec<Vec<f64>>) -> Result<Self, FieldError> {
        Self::new(self.geometry.clone(), components, self.extrapolation.clone())
    }

    /// Resample onto the face layout implied by `extrapolation`.
    ///
    /// When the periodicity of an axis is unchanged the values are kept as
    /// they are.
    pub fn with_extrapolation(&self, extrapolation: Extrapolation) -> Result<Self, FieldError> {
        let same_layout =
            (0..self.rank()).all(|d| self.extrapolation.is_periodic(d) == extrapolation.is_periodic(d));
        if same_layout {
            let mut grid = self.clone();
            grid.extrapolation = extrapolation;
            return Ok(grid);
        }
        Self::from_fn(self.geometry.clone(), extrapolation, |d, p| {
            self.lattices[d].interpolate(&self.components[d], 1, &self.extrapolation, p)[0]
        })
    }

    /// Apply `f(axis, value)` to every face value.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(usize, f64) -> f64 + Sync + Send,
    {
        let components = self
            .components
            .iter()
            .enumerate()
            .map(|(d, c)| map_indexed(c.len(), |i| f(d, c[i])))
            .collect();
        self.with_buffers(components)
    }

    /// Combine two same-shaped grids face by face.
    pub fn zip_with<F>(&self, other: &Self, context: &str, f: F) -> Result<Self, FieldError>
    where
        F: Fn(f64, f64) -> f64 + Sync + Send,
    {
        if self.geometry != other.geometry || self.lattices != other.lattices {
            return Err(FieldError::ShapeMismatch {
                context: context.into(),
                expected: self.face_total(),
                actual: other.face_total(),
            });
        }
        let components = self
            .components
            .iter()
            .zip(other.components.iter())
            .map(|(a, b)| map_indexed(a.len(), |i| f(a[i], b[i])))
            .collect();
        Ok(self.with_buffers(components))
    }

    /// `self + other`.
    pub fn add(&self, other: &Self) -> Result<Self, FieldError> {
        self.zip_with(other, "StaggeredGrid::add", |a, b| a + b)
    }

    /// `self - other`.
    pub fn sub(&self, other: &Self) -> Result<Self, FieldError> {
        self.zip_with(other, "StaggeredGrid::sub", |a, b| a - b)
    }

    /// `self * other`, face by face.
    pub fn mul(&self, other: &Self) -> Result<Self, FieldError> {
        self.zip_with(other, "StaggeredGrid::mul", |a, b| a * b)
    }

    /// `self * factor`.
    pub fn scale(&self, factor: f64) -> Self {
        self.map(|_, v| v * factor)
    }

    /// Largest absolute face value over all components.
    pub fn max_abs(&self) -> f64 {
        self.components
            .iter()
            .flatten()
            .fold(0.0, |m, v| m.max(v.abs()))
    }

    /// Total number of stored faces.
    pub fn face_total(&self) -> usize {
        self.components.iter().map(Vec::len).sum()
    }

    fn rank(&self) -> usize {
        self.geometry.rank()
    }

    fn with_buffers(&self, components: Vec<Vec<f64>>) -> Self {
        Self {
            geometry: self.geometry.clone(),
            lattices: self.lattices.clone(),
            components,
            extrapolation: self.extrapolation.clone(),
        }
    }

    fn check_rank(&self, point: &[f64]) -> Result<(), FieldError> {
        if point.len() != self.rank() {
            return Err(FieldError::RankMismatch {
                expected: self.rank(),
                actual: point.len(),
            });
        }
        Ok(())
    }
}

impl SampledField for StaggeredGrid {
    fn kind(&self) -> FieldKind {
        FieldKind::Staggered
    }

    fn rank(&self) -> Option<usize> {
        Some(self.geometry.rank())
    }

    fn channels(&self) -> usize {
        self.geometry.rank()
    }

    fn extrapolation(&self) -> &Extrapolation {
        &self.extrapolation
    }

    fn sample(&self, point: &[f64]) -> Result<Vector, FieldError> {
        self.check_rank(point)?;
        let mut out: Vector = SmallVec::with_capacity(self.rank());
        for (lattice, values) in self.lattices.iter().zip(self.components.iter()) {
            out.push(lattice.interpolate(values, 1, &self.extrapolation, point)[0]);
        }
        Ok(out)
    }
}

impl GridField for StaggeredGrid {
    fn lattice_count(&self) -> usize {
        self.rank()
    }

    fn lattice_points(&self, l: usize) -> Vec<Vector> {
        self.face_points(l)
    }

    fn lattice_values(&self, l: usize) -> Vec<Vector> {
        self.components[l].iter().map(|v| smallvec![*v]).collect()
    }

    fn sample_lattice(&self, l: usize, point: &[f64]) -> Result<Vector, FieldError> {
        Ok(smallvec![self.sample_component(l, point)?])
    }

    fn closest_lattice_values(&self, l: usize, point: &[f64]) -> Result<Vec<Vector>, FieldError> {
        Ok(self
            .closest_component_values(l, point)?
            .into_iter()
            .map(|v| smallvec![v])
            .collect())
    }

    fn with_lattice_values(&self, values: Vec<Vec<Vector>>) -> Result<Self, FieldError> {
        let components = values
            .into_iter()
            .map(|lattice| lattice.into_iter().flatten().collect())
            .collect();
        self.with_components(components)
    }
}
