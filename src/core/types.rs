//! Core type definitions for SVM training

use crate::core::{Result, SVMError};
use serde::{Deserialize, Serialize};

/// Prediction result containing label and decision value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label (+1 or -1)
    pub label: f64,
    /// Raw decision function value
    pub decision_value: f64,
}

impl Prediction {
    /// Create a prediction from a raw decision value (`>= 0` maps to +1)
    pub fn from_decision(decision_value: f64) -> Self {
        let label = if decision_value >= 0.0 { 1.0 } else { -1.0 };
        Self {
            label,
            decision_value,
        }
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }
}

/// Dense, row-major training set with binary labels
///
/// Immutable once constructed. Features are stored as a flat buffer of
/// `num_examples * num_attributes` values so kernel rows can be computed
/// from contiguous slices.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    features: Vec<f64>,
    labels: Vec<f64>,
    num_attributes: usize,
}

impl TrainingSet {
    /// Build a training set from a flat feature buffer and a label buffer
    pub fn new(features: Vec<f64>, labels: Vec<f64>, num_attributes: usize) -> Result<Self> {
        if labels.is_empty() {
            return Err(SVMError::EmptyDataset);
        }
        if num_attributes == 0 {
            return Err(SVMError::InvalidDataset(
                "number of attributes must be positive".to_string(),
            ));
        }
        let expected = labels.len() * num_attributes;
        if features.len() != expected {
            return Err(SVMError::DimensionMismatch {
                expected,
                actual: features.len(),
            });
        }
        if let Some(&bad) = labels.iter().find(|&&y| y != 1.0 && y != -1.0) {
            return Err(SVMError::InvalidLabel(bad));
        }
        if features.iter().any(|v| !v.is_finite()) {
            return Err(SVMError::InvalidDataset(
                "features must be finite".to_string(),
            ));
        }

        Ok(Self {
            features,
            labels,
            num_attributes,
        })
    }

    /// Number of examples
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false; construction rejects empty sets
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of attributes per example
    pub fn num_attributes(&self) -> usize {
        self.num_attributes
    }

    /// Feature vector of example `i`
    ///
    /// # Panics
    /// Panics if `i >= len()`
    pub fn example(&self, i: usize) -> &[f64] {
        let start = i * self.num_attributes;
        &self.features[start..start + self.num_attributes]
    }

    /// Label of example `i`
    pub fn label(&self, i: usize) -> f64 {
        self.labels[i]
    }

    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    /// Count of (positive, negative) examples
    pub fn class_counts(&self) -> (usize, usize) {
        let positive = self.labels.iter().filter(|&&y| y > 0.0).count();
        (positive, self.labels.len() - positive)
    }
}

/// Training parameters, constructed once and passed by reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Regularization parameter (upper bound for alpha)
    pub c: f64,
    /// RBF kernel width
    pub gamma: f64,
    /// Tolerance of the termination criterion
    pub epsilon: f64,
    /// Maximum number of SMO iterations
    pub max_iterations: usize,
    /// Kernel cache capacity in rows
    pub cache_size: usize,
}

impl TrainingConfig {
    pub const DEFAULT_C: f64 = 1.0;
    pub const DEFAULT_EPSILON: f64 = 0.001;
    pub const DEFAULT_MAX_ITERATIONS: usize = 150_000;
    pub const DEFAULT_CACHE_SIZE: usize = 10;

    /// Default configuration with `gamma = 1 / num_attributes`
    pub fn for_attributes(num_attributes: usize) -> Self {
        Self {
            gamma: 1.0 / num_attributes.max(1) as f64,
            ..Self::default()
        }
    }

    /// Reject parameters the solver cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "C must be positive and finite, got {}",
                self.c
            )));
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "gamma must be positive and finite, got {}",
                self.gamma
            )));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(SVMError::InvalidParameter(format!(
                "epsilon must be positive and finite, got {}",
                self.epsilon
            )));
        }
        if self.max_iterations == 0 {
            return Err(SVMError::InvalidParameter(
                "max_iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            c: Self::DEFAULT_C,
            gamma: 1.0,
            epsilon: Self::DEFAULT_EPSILON,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            cache_size: Self::DEFAULT_CACHE_SIZE,
        }
    }
}

/// Lifecycle of the SMO state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    Initialized,
    Iterating,
    Converged,
    MaxIterReached,
}

impl TrainingStatus {
    /// Whether the solver has stopped iterating
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Converged | Self::MaxIterReached)
    }
}

/// Membership in the index set whose gradient bounds `b_hi` (minimum over it)
pub fn in_high_set(alpha: f64, label: f64, c: f64) -> bool {
    (label > 0.0 && alpha < c) || (label < 0.0 && alpha > 0.0)
}

/// Membership in the index set whose gradient bounds `b_lo` (maximum over it)
pub fn in_low_set(alpha: f64, label: f64, c: f64) -> bool {
    (label > 0.0 && alpha > 0.0) || (label < 0.0 && alpha < c)
}

/// Result of the bound reduction over the gradient vector
///
/// `b_lo` is the maximum gradient over the low set and `b_hi` the minimum over
/// the high set; an empty set leaves its bound at the identity (`-inf`/`+inf`)
/// with no index. Ties resolve to the smallest index so that any reduction
/// order yields the same pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub b_lo: f64,
    pub i_lo: Option<usize>,
    pub b_hi: f64,
    pub i_hi: Option<usize>,
}

impl Bounds {
    /// Identity element of the reduction
    pub fn empty() -> Self {
        Self {
            b_lo: f64::NEG_INFINITY,
            i_lo: None,
            b_hi: f64::INFINITY,
            i_hi: None,
        }
    }

    /// Fold one example into the running reduction
    pub fn observe(mut self, index: usize, f: f64, alpha: f64, label: f64, c: f64) -> Self {
        if in_low_set(alpha, label, c) && Self::prefer(f, index, self.b_lo, self.i_lo, true) {
            self.b_lo = f;
            self.i_lo = Some(index);
        }
        if in_high_set(alpha, label, c) && Self::prefer(f, index, self.b_hi, self.i_hi, false) {
            self.b_hi = f;
            self.i_hi = Some(index);
        }
        self
    }

    /// Combine two partial reductions
    pub fn merge(self, other: Self) -> Self {
        let mut out = self;
        if let Some(i) = other.i_lo {
            if Self::prefer(other.b_lo, i, out.b_lo, out.i_lo, true) {
                out.b_lo = other.b_lo;
                out.i_lo = other.i_lo;
            }
        }
        if let Some(i) = other.i_hi {
            if Self::prefer(other.b_hi, i, out.b_hi, out.i_hi, false) {
                out.b_hi = other.b_hi;
                out.i_hi = other.i_hi;
            }
        }
        out
    }

    fn prefer(value: f64, index: usize, best: f64, best_index: Option<usize>, max: bool) -> bool {
        match best_index {
            None => true,
            Some(b) if value == best => index < b,
            Some(_) if max => value > best,
            Some(_) => value < best,
        }
    }

    /// `b_lo - b_hi`; positive while the KKT conditions are violated
    pub fn gap(&self) -> f64 {
        self.b_lo - self.b_hi
    }

    /// Termination predicate `b_lo <= b_hi + 2 * epsilon`
    pub fn converged(&self, epsilon: f64) -> bool {
        self.b_lo <= self.b_hi + 2.0 * epsilon
    }

    /// Bias estimate `(b_lo + b_hi) / 2`, falling back to whichever bound is finite
    pub fn bias(&self) -> f64 {
        match (self.b_lo.is_finite(), self.b_hi.is_finite()) {
            (true, true) => (self.b_lo + self.b_hi) / 2.0,
            (true, false) => self.b_lo,
            (false, true) => self.b_hi,
            (false, false) => 0.0,
        }
    }
}

/// Result of optimization process
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Dense dual coefficients, one per training example
    pub alpha: Vec<f64>,
    /// Bias term (b), subtracted from the kernel expansion
    pub b: f64,
    /// Terminal state of the solver
    pub status: TrainingStatus,
    /// Number of iterations performed
    pub iterations: usize,
    /// Bounds at termination
    pub bounds: Bounds,
    /// Indices of support vectors (where alpha != 0)
    pub support_vectors: Vec<usize>,
    /// Final dual objective value
    pub objective_value: f64,
    /// Kernel cache statistics at termination
    pub cache_stats: crate::cache::CacheStats,
}

impl OptimizationResult {
    pub fn converged(&self) -> bool {
        self.status == TrainingStatus::Converged
    }
}
