//! Matrix-free conjugate gradient.
//!
//! The solver only ever sees the operator through [`LinearOperator`], so the
//! pressure Laplacian is never assembled. It works for symmetric definite
//! and semi-definite operators of either sign, provided the right-hand side
//! is consistent.

/// A linear map `x -> A x` over flat `f64` buffers.
pub trait LinearOperator {
    /// Write `A x` into `out`. Both slices have the operator's dimension.
    fn apply(&self, x: &[f64], out: &mut [f64]);
}

impl<F> LinearOperator for F
where
    F: Fn(&[f64], &mut [f64]),
{
    fn apply(&self, x: &[f64], out: &mut [f64]) {
        self(x, out)
    }
}

/// Stopping criterion: converged once
/// `‖r‖² <= max(relative² ‖b‖², absolute²)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerance {
    /// Residual norm relative to the right-hand side norm.
    pub relative: f64,
    /// Absolute residual norm.
    pub absolute: f64,
}

/// Outcome of a [`conjugate_gradient`] solve.
#[derive(Clone, Debug, PartialEq)]
pub struct CgResult {
    /// Whether the tolerance was met.
    pub converged: bool,
    /// The final iterate.
    pub x: Vec<f64>,
    /// Iterations performed.
    pub iterations: usize,
    /// Euclidean norm of the final residual `b - A x`.
    pub residual: f64,
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Solve `A x = rhs` starting from `x0`.
///
/// Stops when the tolerance is met, after `max_iterations`, or when the
/// search direction degenerates (`p·Ap == 0`). Never panics on
/// non-convergence; callers inspect [`CgResult::converged`].
///
/// # Examples
///
/// ```
/// use swirl_propagators::cg::{conjugate_gradient, Tolerance};
///
/// // A = diag(2, 4)
/// let op = |x: &[f64], out: &mut [f64]| {
///     out[0] = 2.0 * x[0];
///     out[1] = 4.0 * x[1];
/// };
/// let tol = Tolerance { relative: 1e-12, absolute: 0.0 };
/// let result = conjugate_gradient(&op, &[2.0, 8.0], &[0.0, 0.0], tol, 10);
/// assert!(result.converged);
/// assert!((result.x[0] - 1.0).abs() < 1e-10);
/// assert!((result.x[1] - 2.0).abs() < 1e-10);
/// ```
pub fn conjugate_gradient<A: LinearOperator + ?Sized>(
    op: &A,
    rhs: &[f64],
    x0: &[f64],
    tolerance: Tolerance,
    max_iterations: usize,
) -> CgResult {
    let n = rhs.len();
    let mut x = x0.to_vec();
    let mut ap = vec![0.0; n];

    op.apply(&x, &mut ap);
    let mut r: Vec<f64> = rhs.iter().zip(&ap).map(|(b, a)| b - a).collect();
    let threshold = (tolerance.relative * tolerance.relative * dot(rhs, rhs))
        .max(tolerance.absolute * tolerance.absolute);

    let mut rr = dot(&r, &r);
    if rr <= threshold {
        return CgResult {
            converged: true,
            x,
            iterations: 0,
            residual: rr.sqrt(),
        };
    }

    let mut p = r.clone();
    let mut iterations = 0;
    let mut converged = false;
    while iterations < max_iterations {
        op.apply(&p, &mut ap);
        let pap = dot(&p, &ap);
        if pap == 0.0 || !pap.is_finite() {
            break;
        }
        let alpha = rr / pap;
        for i in 0..n {
            x[i] += alpha * p[i];
            r[i] -= alpha * ap[i];
        }
        iterations += 1;

        let rr_new = dot(&r, &r);
        if rr_new <= threshold {
            rr = rr_new;
            converged = true;
            break;
        }
        let beta = rr_new / rr;
        for i in 0..n {
            p[i] = r[i] + beta * p[i];
        }
        rr = rr_new;
    }

    CgResult {
        converged,
        x,
        iterations,
        residual: rr.sqrt(),
    }
}
