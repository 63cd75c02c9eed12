//! Regular sample lattices: index arithmetic, extrapolated lookup, and
//! multilinear interpolation.
//!
//! Every grid in the crate is one or more lattices. A centered grid is the
//! lattice of cell centers; a staggered grid has one face lattice per axis.

use smallvec::SmallVec;
use swirl_core::{Index, Vector};

use crate::extrapolation::{AxisLookup, Extrapolation};

/// Largest lattice coordinate magnitude used for lookups (2^40 samples).
/// Anything beyond it is outside every grid.
const COORD_LIMIT: f64 = 1_099_511_627_776.0;

/// A regular lattice of sample points `origin + i * spacing`.
///
/// Values stored against a lattice are row-major (last axis fastest) with
/// `channels` interleaved values per point.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Lattice {
    pub(crate) origin: Vector,
    pub(crate) spacing: Vector,
    pub(crate) counts: Index,
}

impl Lattice {
    pub(crate) fn new(origin: Vector, spacing: Vector, counts: Index) -> Self {
        debug_assert_eq!(origin.len(), spacing.len());
        debug_assert_eq!(origin.len(), counts.len());
        Self {
            origin,
            spacing,
            counts,
        }
    }

    pub(crate) fn rank(&self) -> usize {
        self.counts.len()
    }

    /// Number of sample points.
    pub(crate) fn len(&self) -> usize {
        self.counts.iter().product()
    }

    /// Flat index of an in-range multi-index.
    #[cfg(test)]
    pub(crate) fn flat(&self, index: &[usize]) -> usize {
        index
            .iter()
            .zip(self.counts.iter())
            .fold(0, |acc, (&i, &n)| acc * n + i)
    }

    /// Multi-index of a flat index.
    pub(crate) fn unflat(&self, mut flat: usize) -> Index {
        let mut index: Index = SmallVec::from_elem(0, self.rank());
        for axis in (0..self.rank()).rev() {
            let n = self.counts[axis];
            index[axis] = flat % n;
            flat /= n;
        }
        index
    }

    /// Position of the sample at `flat`.
    pub(crate) fn point(&self, flat: usize) -> Vector {
        let index = self.unflat(flat);
        index
            .iter()
            .zip(self.origin.iter().zip(self.spacing.iter()))
            .map(|(&i, (o, s))| o + i as f64 * s)
            .collect()
    }

    /// Positions of all samples in storage order.
    pub(crate) fn points(&self) -> Vec<Vector> {
        (0..self.len()).map(|i| self.point(i)).collect()
    }

    /// Fractional lattice coordinates of a point, limited to
    /// `±COORD_LIMIT` so that corner indices never overflow. NaN passes
    /// through.
    fn continuous(&self, point: &[f64]) -> Vector {
        point
            .iter()
            .zip(self.origin.iter().zip(self.spacing.iter()))
            .map(|(p, (o, s))| ((p - o) / s).clamp(-COORD_LIMIT, COORD_LIMIT))
            .collect()
    }

    /// Flat index an out-of-range index maps to, or `None` where the
    /// extrapolation supplies a constant.
    pub(crate) fn resolve(&self, ext: &Extrapolation, index: &[i64]) -> Option<usize> {
        let mut flat = 0usize;
        for (axis, (&i, &n)) in index.iter().zip(self.counts.iter()).enumerate() {
            match ext.resolve_axis(axis, i, n) {
                AxisLookup::Index(r) => flat = flat * n + r,
                AxisLookup::Value(_) => return None,
            }
        }
        Some(flat)
    }

    /// Value of channel `ch` at a possibly out-of-range index.
    pub(crate) fn value(
        &self,
        values: &[f64],
        channels: usize,
        ext: &Extrapolation,
        index: &[i64],
        ch: usize,
    ) -> f64 {
        let mut flat = 0usize;
        for (axis, (&i, &n)) in index.iter().zip(self.counts.iter()).enumerate() {
            match ext.resolve_axis(axis, i, n) {
                AxisLookup::Index(r) => flat = flat * n + r,
                AxisLookup::Value(c) => return c,
            }
        }
        values[flat * channels + ch]
    }

    /// Multilinear interpolation of all channels at `point`.
    ///
    /// Far-outside and infinite coordinates resolve like any other outside
    /// index under `ext`.
    pub(crate) fn interpolate(
        &self,
        values: &[f64],
        channels: usize,
        ext: &Extrapolation,
        point: &[f64],
    ) -> Vector {
        let g = self.continuous(point);
        let base: SmallVec<[i64; 3]> = g.iter().map(|x| x.floor() as i64).collect();
        let frac: Vector = g.iter().zip(base.iter()).map(|(x, &b)| x - b as f64).collect();

        let mut out: Vector = SmallVec::from_elem(0.0, channels);
        let mut corner: SmallVec<[i64; 3]> = base.clone();
        for mask in 0..(1usize << self.rank()) {
            let mut weight = 1.0;
            for axis in 0..self.rank() {
                let upper = (mask >> axis) & 1 == 1;
                corner[axis] = base[axis] + upper as i64;
                weight *= if upper { frac[axis] } else { 1.0 - frac[axis] };
            }
            if weight == 0.0 {
                continue;
            }
            for (ch, o) in out.iter_mut().enumerate() {
                *o += weight * self.value(values, channels, ext, &corner, ch);
            }
        }
        out
    }

    /// The `2^rank` lattice values surrounding `point`, one `Vector` of
    /// channels per corner.
    pub(crate) fn corners(
        &self,
        values: &[f64],
        channels: usize,
        ext: &Extrapolation,
        point: &[f64],
    ) -> Vec<Vector> {
        let g = self.continuous(point);
        let base: SmallVec<[i64; 3]> = g.iter().map(|x| x.floor() as i64).collect();
        let mut corner = base.clone();
        (0..(1usize << self.rank()))
            .map(|mask| {
                for axis in 0..self.rank() {
                    corner[axis] = base[axis] + ((mask >> axis) & 1) as i64;
                }
                (0..channels)
                    .map(|ch| self.value(values, channels, ext, &corner, ch))
                    .collect()
            })
            .collect()
    }
}
