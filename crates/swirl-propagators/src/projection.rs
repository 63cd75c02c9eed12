//! Pressure projection onto the divergence-free subspace.
//!
//! [`make_incompressible`] masks the velocity with the domain walls and
//! obstacles, imprints moving obstacles, solves a masked Poisson problem
//! for the pressure with [`conjugate_gradient`], and subtracts the pressure
//! gradient.
//!
//! Two binary masks drive the solve. Both hold 1 in fluid cells and 0 in
//! cells covered by an obstacle; they differ only in how they extend past
//! the domain edge:
//!
//! | Side     | active | accessible |
//! |----------|--------|------------|
//! | open     | 0      | 1          |
//! | closed   | 0      | 0          |
//! | periodic | wrap   | wrap       |
//!
//! An open side therefore acts as a zero-pressure reservoir and a closed
//! side as a zero-flux wall.

use smallvec::SmallVec;
use swirl_core::{FieldError, SolveError};
use swirl_space::ops::{divergence, stagger_min, staggered_gradient};
use swirl_space::par::{fill_indexed, map_indexed};
use swirl_space::{CenteredGrid, Domain, Geometry, SampledField, StaggeredGrid};
use tracing::{debug, warn};

use crate::cg::{conjugate_gradient, LinearOperator, Tolerance};
use crate::obstacle::Obstacle;

/// Stopping criteria of the pressure solve.
#[derive(Clone, Debug, PartialEq)]
pub struct SolveConfig {
    /// Residual norm relative to the divergence norm. Default: `1e-5`.
    pub relative_tolerance: f64,
    /// Absolute residual norm. Default: `0`.
    pub absolute_tolerance: f64,
    /// Iteration cap. Default: `1000`.
    pub max_iterations: usize,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            relative_tolerance: 1e-5,
            absolute_tolerance: 0.0,
            max_iterations: 1000,
        }
    }
}

impl SolveConfig {
    /// Check that both tolerances are finite and non-negative.
    pub fn validate(&self) -> Result<(), String> {
        if !self.relative_tolerance.is_finite() || self.relative_tolerance < 0.0 {
            return Err(format!(
                "relative_tolerance must be finite and non-negative, got {}",
                self.relative_tolerance
            ));
        }
        if !self.absolute_tolerance.is_finite() || self.absolute_tolerance < 0.0 {
            return Err(format!(
                "absolute_tolerance must be finite and non-negative, got {}",
                self.absolute_tolerance
            ));
        }
        Ok(())
    }

    fn tolerance(&self) -> Tolerance {
        Tolerance {
            relative: self.relative_tolerance,
            absolute: self.absolute_tolerance,
        }
    }
}

/// Result of a successful [`make_incompressible`].
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    /// The divergence-free velocity.
    pub velocity: StaggeredGrid,
    /// The solved pressure, with the domain's scalar extrapolation.
    pub pressure: CenteredGrid,
    /// CG iterations used.
    pub iterations: usize,
    /// Final residual norm of the pressure solve.
    pub residual: f64,
    /// Divergence of the masked input velocity minus its mean over the
    /// fluid cells.
    pub divergence: CenteredGrid,
}

// ── Masked Laplacian ────────────────────────────────────────────

/// The masked pressure Laplacian as a matrix-free operator.
///
/// Along each axis and for each cell `i` with neighbours `l` and `r`:
///
/// ```text
/// (a[i] (a[l] p[l] + a[r] p[r]) - (acc[l] + acc[r]) p[i]) / dx²
/// ```
///
/// where `a` is the active mask and `acc` the accessible mask. Neighbours
/// outside the grid are resolved through each mask's extrapolation; where
/// the active mask extrapolates to a constant the neighbour term vanishes.
/// The stencil is precomputed, so applying the operator costs one pass
/// over the cells.
#[derive(Clone, Debug)]
pub struct MaskedLaplace {
    diagonal: Vec<f64>,
    neighbors: Vec<SmallVec<[(usize, f64); 6]>>,
}

impl MaskedLaplace {
    /// Precompute the stencil for the given masks.
    ///
    /// Both masks must be scalar grids of the same resolution.
    pub fn new(active: &CenteredGrid, accessible: &CenteredGrid) -> Result<Self, FieldError> {
        check_scalar(active, "MaskedLaplace active mask")?;
        check_scalar(accessible, "MaskedLaplace accessible mask")?;
        check_same_cells(active, accessible, "MaskedLaplace masks")?;

        let inv_dx2: SmallVec<[f64; 3]> = active.dx().iter().map(|h| 1.0 / (h * h)).collect();
        let n = active.cell_count();
        let stencils = map_indexed(n, |flat| {
            let mut index: SmallVec<[i64; 3]> =
                active.cell_index(flat).iter().map(|&i| i as i64).collect();
            let a_center = active.values()[flat];
            let mut diagonal = 0.0;
            let mut neighbors: SmallVec<[(usize, f64); 6]> = SmallVec::new();
            for (axis, w) in inv_dx2.iter().enumerate() {
                for offset in [-1i64, 1] {
                    index[axis] += offset;
                    diagonal -= accessible.value_at(&index, 0) * w;
                    if a_center != 0.0 {
                        if let Some(j) = active.stored_index(&index) {
                            let coefficient = a_center * active.values()[j] * w;
                            if coefficient != 0.0 {
                                neighbors.push((j, coefficient));
                            }
                        }
                    }
                    index[axis] -= offset;
                }
            }
            (diagonal, neighbors)
        });
        let (diagonal, neighbors) = stencils.into_iter().unzip();
        Ok(Self {
            diagonal,
            neighbors,
        })
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.diagonal.len()
    }

    /// Returns `true` for an operator over zero cells.
    pub fn is_empty(&self) -> bool {
        self.diagonal.is_empty()
    }
}

impl LinearOperator for MaskedLaplace {
    fn apply(&self, x: &[f64], out: &mut [f64]) {
        fill_indexed(out, |i| {
            self.neighbors[i]
                .iter()
                .fold(self.diagonal[i] * x[i], |acc, &(j, w)| acc + w * x[j])
        });
    }
}

fn check_scalar(grid: &CenteredGrid, context: &str) -> Result<(), FieldError> {
    if grid.channels() != 1 {
        return Err(FieldError::ShapeMismatch {
            context: context.into(),
            expected: 1,
            actual: grid.channels(),
        });
    }
    Ok(())
}

fn check_same_cells(a: &CenteredGrid, b: &CenteredGrid, context: &str) -> Result<(), FieldError> {
    if a.geometry() != b.geometry() {
        return Err(FieldError::ShapeMismatch {
            context: context.into(),
            expected: a.cell_count(),
            actual: b.cell_count(),
        });
    }
    Ok(())
}

/// Apply the masked Laplacian to `pressure`.
///
/// The result carries `pressure.extrapolation().gradient().gradient()`.
pub fn masked_laplace(
    pressure: &CenteredGrid,
    active: &CenteredGrid,
    accessible: &CenteredGrid,
) -> Result<CenteredGrid, FieldError> {
    check_scalar(pressure, "masked_laplace pressure")?;
    check_same_cells(active, pressure, "masked_laplace")?;
    let op = MaskedLaplace::new(active, accessible)?;
    let mut out = vec![0.0; op.len()];
    op.apply(pressure.values(), &mut out);
    CenteredGrid::new(
        pressure.geometry().clone(),
        1,
        out,
        pressure.extrapolation().gradient().gradient(),
    )
}

// ── Obstacle coupling ───────────────────────────────────────────

/// Blend the rigid-body velocity of every moving obstacle into `velocity`.
///
/// Each face takes `(1 - m) v + m v_obstacle`, with `m` the fraction of a
/// cell-sized box around the face center covered by the obstacle. Obstacles
/// are applied in order, so later ones win where they overlap. Stationary
/// obstacles are skipped.
pub fn layer_obstacle_velocities(
    velocity: &StaggeredGrid,
    obstacles: &[Obstacle],
) -> Result<StaggeredGrid, FieldError> {
    let rank = velocity.geometry().rank();
    let half: SmallVec<[f64; 3]> = velocity.geometry().dx().iter().map(|h| 0.5 * h).collect();
    let mut current = velocity.clone();
    for obstacle in obstacles.iter().filter(|o| !o.is_stationary()) {
        if !obstacle.fits_rank(rank) {
            return Err(FieldError::RankMismatch {
                expected: rank,
                actual: obstacle.velocity().len().max(obstacle.angular_velocity().len()),
            });
        }
        let components = (0..rank)
            .map(|d| {
                let faces = current.face_points(d);
                let values = current.component(d);
                map_indexed(faces.len(), |i| {
                    let m = obstacle.geometry().fraction_inside(&faces[i], &half);
                    if m == 0.0 {
                        values[i]
                    } else {
                        (1.0 - m) * values[i] + m * obstacle.velocity_at(&faces[i])[d]
                    }
                })
            })
            .collect();
        current = current.with_components(components)?;
    }
    Ok(current)
}

// ── Projection ──────────────────────────────────────────────────

/// Binary fluid masks `(active, accessible)` for `domain` with `obstacles`
/// carved out.
pub fn fluid_masks(
    domain: &Domain,
    obstacles: &[Obstacle],
) -> Result<(CenteredGrid, CenteredGrid), FieldError> {
    let solid = Geometry::union(obstacles.iter().map(|o| o.geometry().clone()));
    let active = domain.scalar_grid_from_geometry(
        &solid.inverted(),
        domain.boundaries().active_extrapolation(),
    )?;
    let accessible = active.with_extrapolation(domain.boundaries().accessible_extrapolation());
    Ok((active, accessible))
}

/// Mean of `div` over the cells where `active` is nonzero.
///
/// Without obstacles this is the plain mean. With obstacles it keeps the
/// right-hand side consistent on a fluid region enclosed by walls, where the
/// masked Laplacian is singular.
fn fluid_mean(div: &CenteredGrid, active: &CenteredGrid) -> f64 {
    let (total, cells) = div
        .values()
        .iter()
        .zip(active.values())
        .filter(|(_, a)| **a != 0.0)
        .fold((0.0, 0usize), |(t, n), (d, _)| (t + d, n + 1));
    if cells == 0 {
        0.0
    } else {
        total / cells as f64
    }
}

/// Project `velocity` onto the divergence-free fields compatible with the
/// domain boundaries and `obstacles`.
///
/// Fails with [`SolveError::NotConverged`] if the pressure solve does not
/// reach the tolerance within `config.max_iterations`. There is no
/// internal retry.
///
/// After a successful projection the divergence in every fluid cell equals
/// the mean input divergence over the fluid cells (zero for closed and
/// periodic domains without moving obstacles) up to the solver tolerance.
pub fn make_incompressible(
    velocity: &StaggeredGrid,
    domain: &Domain,
    obstacles: &[Obstacle],
    config: &SolveConfig,
) -> Result<Projection, SolveError> {
    if velocity.geometry() != domain.geometry() {
        return Err(FieldError::ShapeMismatch {
            context: "make_incompressible velocity".into(),
            expected: domain.geometry().cell_count(),
            actual: velocity.geometry().cell_count(),
        }
        .into());
    }

    let (active, accessible) = fluid_masks(domain, obstacles)?;
    let hard_bcs = stagger_min(&accessible)?;
    let velocity = velocity.mul(&hard_bcs)?;
    let velocity = layer_obstacle_velocities(&velocity, obstacles)?;

    let div = divergence(&velocity)?;
    let mean = fluid_mean(&div, &active);
    let div = div.map(|v| v - mean);
    let rhs: Vec<f64> = div
        .values()
        .iter()
        .zip(active.values())
        .map(|(d, a)| d * a)
        .collect();

    let laplace = MaskedLaplace::new(&active, &accessible)?;
    let initial = domain.scalar_grid(0.0)?;
    let result = conjugate_gradient(
        &laplace,
        &rhs,
        initial.values(),
        config.tolerance(),
        config.max_iterations,
    );
    if !result.converged {
        warn!(
            iterations = result.iterations,
            residual = result.residual,
            "pressure solve did not converge"
        );
        return Err(SolveError::NotConverged {
            iterations: result.iterations,
            residual: result.residual,
        });
    }
    debug!(
        iterations = result.iterations,
        residual = result.residual,
        max_divergence = div.max_abs(),
        "pressure solve converged"
    );

    let pressure = initial.with_values(result.x)?;
    let gradient = staggered_gradient(&pressure)?.mul(&hard_bcs)?;
    let velocity = velocity.sub(&gradient)?;
    Ok(Projection {
        velocity,
        pressure,
        iterations: result.iterations,
        residual: result.residual,
        divergence: div,
    })
}
