//! Kernel trait definition

/// Kernel function trait
///
/// A kernel function K(x, y) must satisfy Mercer's condition to be valid for SVM.
/// Implementations are pure and are called concurrently from backend workers.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y) for two dense vectors of equal length
    fn compute(&self, x: &[f64], y: &[f64]) -> f64;

    /// K(x, x); constant for translation-invariant kernels
    fn self_similarity(&self, x: &[f64]) -> f64 {
        self.compute(x, x)
    }
}
