//! Finite-difference operators between centered and staggered grids.
//!
//! Face `j` of component `d` sits between cells `j - 1` and `j` along axis
//! `d`. Cells outside the grid are resolved through the source field's
//! extrapolation, so boundary faces see the boundary condition.

use smallvec::SmallVec;
use swirl_core::FieldError;

use crate::centered::CenteredGrid;
use crate::extrapolation::Extrapolation;
use crate::field::SampledField;
use crate::par::map_indexed;
use crate::staggered::StaggeredGrid;

/// Denominator floor used by [`normalize`].
pub const NORMALIZE_EPSILON: f64 = 1e-5;

fn require_scalar(grid: &CenteredGrid, context: &str) -> Result<(), FieldError> {
    if grid.channels() != 1 {
        return Err(FieldError::ShapeMismatch {
            context: context.into(),
            expected: 1,
            actual: grid.channels(),
        });
    }
    Ok(())
}

/// Build a staggered grid whose face value is `f(axis, lower_cell,
/// upper_cell)`.
fn stagger_with<F>(
    grid: &CenteredGrid,
    extrapolation: Extrapolation,
    f: F,
) -> Result<StaggeredGrid, FieldError>
where
    F: Fn(usize, f64, f64) -> f64 + Sync + Send,
{
    let layout = StaggeredGrid::zeros(grid.geometry().clone(), extrapolation);
    let components = (0..grid.geometry().rank())
        .map(|d| {
            map_indexed(layout.component(d).len(), |flat| {
                let upper: SmallVec<[i64; 3]> =
                    layout.face_index(d, flat).iter().map(|&i| i as i64).collect();
                let mut lower = upper.clone();
                lower[d] -= 1;
                f(d, grid.value_at(&lower, 0), grid.value_at(&upper, 0))
            })
        })
        .collect();
    layout.with_components(components)
}

/// Central-difference divergence of a staggered field, at cell centers.
///
/// The result extrapolation is the gradient of the velocity's.
pub fn divergence(velocity: &StaggeredGrid) -> Result<CenteredGrid, FieldError> {
    let geometry = velocity.geometry().clone();
    let dx = geometry.dx().clone();
    let cells = geometry.cell_lattice();
    let values = map_indexed(cells.len(), |flat| {
        let cell = cells.unflat(flat);
        let mut index: SmallVec<[i64; 3]> = cell.iter().map(|&i| i as i64).collect();
        let mut div = 0.0;
        for (d, h) in dx.iter().enumerate() {
            let lo = velocity.component_value_at(d, &index);
            index[d] += 1;
            let hi = velocity.component_value_at(d, &index);
            index[d] -= 1;
            div += (hi - lo) / h;
        }
        div
    });
    CenteredGrid::new(geometry, 1, values, velocity.extrapolation().gradient())
}

/// Gradient of a scalar grid, evaluated on the faces.
pub fn staggered_gradient(grid: &CenteredGrid) -> Result<StaggeredGrid, FieldError> {
    require_scalar(grid, "staggered_gradient")?;
    let dx = grid.dx().clone();
    stagger_with(grid, grid.extrapolation().gradient(), |d, lo, hi| {
        (hi - lo) / dx[d]
    })
}

/// Face value = the smaller of the two adjacent cells.
///
/// Applied to the accessible mask this closes every face that touches a
/// solid cell.
pub fn stagger_min(grid: &CenteredGrid) -> Result<StaggeredGrid, FieldError> {
    require_scalar(grid, "stagger_min")?;
    stagger_with(grid, grid.extrapolation().clone(), |_, lo, hi| lo.min(hi))
}

/// Sample `field` at the face centers of `layout`.
///
/// Component `d` takes channel `d` of a vector field, or the only channel
/// of a scalar field.
pub fn resample_to_staggered(
    field: &dyn SampledField,
    layout: &StaggeredGrid,
) -> Result<StaggeredGrid, FieldError> {
    let rank = layout.geometry().rank();
    let channels = field.channels();
    if channels != 1 && channels != rank {
        return Err(FieldError::ShapeMismatch {
            context: "resample_to_staggered".into(),
            expected: rank,
            actual: channels,
        });
    }
    let mut components = Vec::with_capacity(rank);
    for d in 0..rank {
        let ch = if channels == 1 { 0 } else { d };
        let samples = field.sample_at(&layout.face_points(d))?;
        components.push(samples.into_iter().map(|v| v[ch]).collect());
    }
    layout.with_components(components)
}

/// Rescale `field` so each channel's total matches `reference`.
///
/// The current total is floored at [`NORMALIZE_EPSILON`] to avoid blowing
/// up an (almost) empty field.
pub fn normalize(field: &CenteredGrid, reference: &CenteredGrid) -> Result<CenteredGrid, FieldError> {
    if field.channels() != reference.channels() {
        return Err(FieldError::ShapeMismatch {
            context: "normalize".into(),
            expected: field.channels(),
            actual: reference.channels(),
        });
    }
    let factors: SmallVec<[f64; 3]> = reference
        .sum()
        .iter()
        .zip(field.sum().iter())
        .map(|(r, s)| r / s.max(NORMALIZE_EPSILON))
        .collect();
    let channels = field.channels();
    let values = field
        .values()
        .iter()
        .enumerate()
        .map(|(i, v)| v * factors[i % channels])
        .collect();
    field.with_values(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Bounds, GridGeometry};
    use smallvec::smallvec;

    fn geometry() -> GridGeometry {
        GridGeometry::new(Bounds::from_size(&[4.0, 2.0]).unwrap(), smallvec![4, 2]).unwrap()
    }

    #[test]
    fn divergence_of_linear_field() {
        // v = (x, 2y) has divergence 3 everywhere.
        let v = StaggeredGrid::from_fn(geometry(), Extrapolation::ZERO, |d, p| {
            if d == 0 { p[0] } else { 2.0 * p[1] }
        })
        .unwrap();
        let div = divergence(&v).unwrap();
        assert!(div.values().iter().all(|x| (x - 3.0).abs() < 1e-12));
    }

    #[test]
    fn divergence_of_uniform_periodic_field_is_zero() {
        let v = StaggeredGrid::uniform(geometry(), &[1.0, -1.0], Extrapolation::Periodic).unwrap();
        let div = divergence(&v).unwrap();
        assert_eq!(div.max_abs(), 0.0);
        assert_eq!(div.extrapolation(), &Extrapolation::Periodic);
    }

    #[test]
    fn gradient_of_linear_field() {
        let p = CenteredGrid::from_fn(geometry(), 1, Extrapolation::Boundary, |p| {
            smallvec![3.0 * p[0] - p[1]]
        })
        .unwrap();
        let g = staggered_gradient(&p).unwrap();
        // Interior x-faces see slope 3, boundary faces are zero-gradient.
        let points = g.face_points(0);
        for (i, pt) in points.iter().enumerate() {
            let expected = if pt[0] == 0.0 || pt[0] == 4.0 { 0.0 } else { 3.0 };
            assert!((g.component(0)[i] - expected).abs() < 1e-12);
        }
        let interior_y = g
            .face_points(1)
            .iter()
            .position(|pt| pt[1] == 1.0)
            .unwrap();
        assert!((g.component(1)[interior_y] + 1.0).abs() < 1e-12);
        assert_eq!(g.extrapolation(), &Extrapolation::ZERO);
    }

    #[test]
    fn stagger_min_closes_faces_next_to_solid() {
        let mut values = vec![1.0; 8];
        values[2] = 0.0; // cell (1, 0)
        let acc = CenteredGrid::new(geometry(), 1, values, Extrapolation::ONE).unwrap();
        let h = stagger_min(&acc).unwrap();
        let closed = h.component(0).iter().filter(|v| **v == 0.0).count();
        assert_eq!(closed, 2);
        // Boundary faces of an open box stay open.
        assert_eq!(h.component(0)[0], 1.0);
    }

    #[test]
    fn stagger_min_uses_extrapolation_at_walls() {
        let acc = CenteredGrid::uniform(geometry(), 1, 1.0, Extrapolation::ZERO).unwrap();
        let h = stagger_min(&acc).unwrap();
        let zeros = h.component(1).iter().filter(|v| **v == 0.0).count();
        // Bottom and top rows of y-faces (4 each).
        assert_eq!(zeros, 8);
    }

    #[test]
    fn gradient_requires_scalar() {
        let v = CenteredGrid::uniform(geometry(), 2, 1.0, Extrapolation::ZERO).unwrap();
        assert!(staggered_gradient(&v).is_err());
    }

    #[test]
    fn resample_scalar_onto_faces() {
        let layout = StaggeredGrid::zeros(geometry(), Extrapolation::ZERO);
        let rho = CenteredGrid::uniform(geometry(), 1, 2.0, Extrapolation::Boundary).unwrap();
        let faces = resample_to_staggered(&rho, &layout).unwrap();
        assert!(faces.components().iter().flatten().all(|v| (*v - 2.0).abs() < 1e-12));
    }

    #[test]
    fn normalize_matches_reference_total() {
        let a = CenteredGrid::uniform(geometry(), 1, 1.0, Extrapolation::ZERO).unwrap();
        let b = CenteredGrid::uniform(geometry(), 1, 0.25, Extrapolation::ZERO).unwrap();
        let n = normalize(&b, &a).unwrap();
        assert!((n.sum()[0] - a.sum()[0]).abs() < 1e-12);
    }

    #[test]
    fn normalize_floors_denominator() {
        let zero = CenteredGrid::uniform(geometry(), 1, 0.0, Extrapolation::ZERO).unwrap();
        let a = CenteredGrid::uniform(geometry(), 1, 1.0, Extrapolation::ZERO).unwrap();
        let n = normalize(&zero, &a).unwrap();
        assert!(n.values().iter().all(|v| v.is_finite() && *v == 0.0));
    }
}
