//! Data-parallel helpers for per-sample work.
//!
//! Per-cell and per-point computations are independent, so large fields
//! are processed with `rayon`. Results are always collected in index
//! order: the parallel and sequential paths produce identical output.

use rayon::prelude::*;

/// Below this many items the sequential path is used.
pub const PAR_THRESHOLD: usize = 16_384;

/// Returns `true` if `len` items are worth splitting across threads.
pub fn should_parallel(len: usize) -> bool {
    len >= PAR_THRESHOLD && rayon::current_num_threads() > 1
}

/// Evaluate `f(i)` for `i in 0..len`, in parallel for large `len`.
pub fn map_indexed<T, F>(len: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if should_parallel(len) {
        (0..len).into_par_iter().map(f).collect()
    } else {
        (0..len).map(f).collect()
    }
}

/// Overwrite `out[i]` with `f(i)`, in parallel for long slices.
pub fn fill_indexed<T, F>(out: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    if should_parallel(out.len()) {
        out.par_iter_mut().enumerate().for_each(|(i, o)| *o = f(i));
    } else {
        for (i, o) in out.iter_mut().enumerate() {
            *o = f(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_and_large_paths_agree() {
        let small = map_indexed(10, |i| i * 2);
        assert_eq!(small, (0..10).map(|i| i * 2).collect::<Vec<_>>());

        let n = PAR_THRESHOLD * 2 + 7;
        let large = map_indexed(n, |i| (i as f64).sqrt());
        assert_eq!(large.len(), n);
        assert!(large.iter().enumerate().all(|(i, v)| *v == (i as f64).sqrt()));
    }

    #[test]
    fn fill_writes_every_slot() {
        let mut out = vec![0usize; PAR_THRESHOLD + 3];
        fill_indexed(&mut out, |i| i + 1);
        assert!(out.iter().enumerate().all(|(i, v)| *v == i + 1));
    }
}
