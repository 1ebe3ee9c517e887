//! RBF (Radial Basis Function) kernel implementation
//!
//! The RBF kernel is defined as: K(x, y) = exp(-γ * ||x - y||²)
//! where γ (gamma) is a hyperparameter that controls the kernel width.

use crate::core::{Result, SVMError};
use crate::kernel::Kernel;

/// RBF (Radial Basis Function) kernel: K(x, y) = exp(-γ * ||x - y||²)
///
/// The gamma parameter controls the "reach" of each training example:
/// - High gamma: close points have high influence (potential overfitting)
/// - Low gamma: distant points have influence (potential underfitting)
///
/// `1.0 / n_features` is the default starting point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RBFKernel {
    gamma: f64,
}

impl RBFKernel {
    /// Create a new RBF kernel with specified gamma parameter
    ///
    /// # Panics
    /// Panics if gamma is not positive
    pub fn new(gamma: f64) -> Self {
        assert!(gamma > 0.0, "Gamma must be positive, got: {}", gamma);
        Self { gamma }
    }

    /// Fallible constructor for values coming from user input
    pub fn try_new(gamma: f64) -> Result<Self> {
        if gamma.is_finite() && gamma > 0.0 {
            Ok(Self { gamma })
        } else {
            Err(SVMError::InvalidParameter(format!(
                "gamma must be positive and finite, got {}",
                gamma
            )))
        }
    }

    /// Create RBF kernel with gamma = 1.0 / n_features
    ///
    /// # Panics
    /// Panics if `n_features` is zero
    pub fn with_auto_gamma(n_features: usize) -> Self {
        assert!(n_features > 0, "Number of features must be positive");
        Self::new(1.0 / n_features as f64)
    }

    /// Get the gamma parameter
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Kernel for RBFKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        (-self.gamma * squared_euclidean_distance(x, y)).exp()
    }

    fn self_similarity(&self, _x: &[f64]) -> f64 {
        1.0
    }
}

/// Compute squared Euclidean distance between two dense vectors
///
/// Summed per attribute; no `|x|² + |y|² - 2x·y` expansion.
pub fn squared_euclidean_distance(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter()
        .zip(y)
        .map(|(a, b)| {
            let diff = a - b;
            diff * diff
        })
        .sum()
}
