//! Execution backends for the data-parallel parts of an SMO iteration
//!
//! [`Sequential`] walks the examples in order on the calling thread and is
//! the reference for tests. [`Parallel`] spreads the same work across the
//! rayon thread pool.

use crate::core::{Bounds, ExecutionBackend};
use rayon::prelude::*;

/// Minimum number of elements handed to a single rayon task
const MIN_CHUNK: usize = 256;

/// Single-threaded backend
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl ExecutionBackend for Sequential {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn for_each_mut<F>(&self, out: &mut [f64], op: F)
    where
        F: Fn(usize, &mut f64) + Send + Sync,
    {
        for (k, value) in out.iter_mut().enumerate() {
            op(k, value);
        }
    }

    fn reduce_bounds(&self, f: &[f64], alpha: &[f64], labels: &[f64], c: f64) -> Bounds {
        (0..f.len()).fold(Bounds::empty(), |acc, k| {
            acc.observe(k, f[k], alpha[k], labels[k], c)
        })
    }
}

/// Multi-threaded backend on the global rayon pool
#[derive(Debug, Clone, Copy, Default)]
pub struct Parallel;

impl Parallel {
    /// Size the global pool; only the first call in a process takes effect
    pub fn init_global_pool(threads: usize) -> bool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .is_ok()
    }

    /// Number of worker threads available
    pub fn threads(&self) -> usize {
        rayon::current_num_threads()
    }
}

impl ExecutionBackend for Parallel {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn for_each_mut<F>(&self, out: &mut [f64], op: F)
    where
        F: Fn(usize, &mut f64) + Send + Sync,
    {
        out.par_iter_mut()
            .with_min_len(MIN_CHUNK)
            .enumerate()
            .for_each(|(k, value)| op(k, value));
    }

    fn reduce_bounds(&self, f: &[f64], alpha: &[f64], labels: &[f64], c: f64) -> Bounds {
        (0..f.len())
            .into_par_iter()
            .with_min_len(MIN_CHUNK)
            .fold(Bounds::empty, |acc, k| {
                acc.observe(k, f[k], alpha[k], labels[k], c)
            })
            .reduce(Bounds::empty, Bounds::merge)
    }
}
