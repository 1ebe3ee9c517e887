//! Kernel cache implementation
//!
//! Provides a row-granular LRU cache of kernel matrix rows. One line holds the
//! kernel values of one example against every example in the training set,
//! so capacity is counted in lines rather than bytes. The full matrix is
//! `O(n²)` and is never materialized.

use crate::core::{ExecutionBackend, Result, SVMError, TrainingSet};
use crate::kernel::Kernel;
use log::trace;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// A cached kernel row, shared with the solver without copying
pub type KernelRow = Arc<[f64]>;

/// LRU cache for kernel matrix rows
pub struct KernelCache {
    rows: LruCache<usize, KernelRow>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl KernelCache {
    /// Create a new kernel cache holding at most `lines` rows (minimum one)
    pub fn new(lines: usize) -> Self {
        let capacity = NonZeroUsize::new(lines).unwrap_or(NonZeroUsize::MIN);
        Self {
            rows: LruCache::new(capacity),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Return the kernel row of example `i`, computing and storing it on a miss
    ///
    /// The row is filled through `backend`, one kernel evaluation per example.
    /// Rows are deterministic for a fixed kernel, so a refetch after eviction
    /// is bit-identical to the evicted copy.
    pub fn lookup_row<K, B>(
        &mut self,
        i: usize,
        kernel: &K,
        data: &TrainingSet,
        backend: &B,
    ) -> Result<KernelRow>
    where
        K: Kernel,
        B: ExecutionBackend,
    {
        if let Some(row) = self.rows.get(&i) {
            self.hits += 1;
            return Ok(Arc::clone(row));
        }
        self.misses += 1;

        let row: KernelRow = compute_row(i, kernel, data, backend)?.into();
        if let Some((evicted, _)) = self.rows.push(i, Arc::clone(&row)) {
            if evicted != i {
                self.evictions += 1;
                trace!("kernel cache evicted row {evicted} for row {i}");
            }
        }
        Ok(row)
    }

    /// Cached row of example `i` without touching recency or statistics
    pub fn peek_row(&self, i: usize) -> Option<KernelRow> {
        self.rows.peek(&i).cloned()
    }

    /// Drop every cached row; only needed if the kernel parameter changes
    pub fn invalidate(&mut self) {
        self.rows.clear();
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            capacity: self.rows.cap().get(),
            size: self.rows.len(),
        }
    }
}

/// Compute one full kernel row, failing instead of aborting on allocation failure
pub fn compute_row<K, B>(i: usize, kernel: &K, data: &TrainingSet, backend: &B) -> Result<Vec<f64>>
where
    K: Kernel,
    B: ExecutionBackend,
{
    let n = data.len();
    let mut row = Vec::new();
    row.try_reserve_exact(n).map_err(|e| {
        SVMError::ResourceExhausted(format!("kernel row of {n} values: {e}"))
    })?;
    row.resize(n, 0.0);

    let x_i = data.example(i);
    backend.for_each_mut(&mut row, |k, value| {
        *value = kernel.compute(x_i, data.example(k));
    });
    Ok(row)
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub capacity: usize,
    pub size: usize,
}
