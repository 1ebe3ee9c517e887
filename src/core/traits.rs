//! Core traits for SVM training

use crate::core::{Bounds, Prediction};

/// Execution strategy for the per-example work inside one SMO iteration
///
/// The solver only ever touches per-example data through this trait, so the
/// same optimizer logic runs single-threaded or across a thread pool.
/// Implementations must produce identical results: `for_each_mut` applies an
/// independent operation per element and `reduce_bounds` resolves ties by index.
pub trait ExecutionBackend: Send + Sync {
    /// Short name used in logs and summaries
    fn name(&self) -> &'static str;

    /// Apply `op(k, &mut out[k])` to every element
    fn for_each_mut<F>(&self, out: &mut [f64], op: F)
    where
        F: Fn(usize, &mut f64) + Send + Sync;

    /// Reduce the gradient vector to `(b_lo, i_lo, b_hi, i_hi)`
    fn reduce_bounds(&self, f: &[f64], alpha: &[f64], labels: &[f64], c: f64) -> Bounds;
}

/// Trained SVM model
pub trait SVMModel: Send + Sync {
    /// Raw decision value for a dense feature vector
    fn decision_value(&self, features: &[f64]) -> f64;

    /// Predict a single example
    fn predict(&self, features: &[f64]) -> Prediction {
        Prediction::from_decision(self.decision_value(features))
    }

    /// Get the number of support vectors
    fn n_support_vectors(&self) -> usize;

    /// Get the bias term
    fn bias(&self) -> f64;
}
