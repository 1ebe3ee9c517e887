//! Gradient vector and optimality bounds
//!
//! The tracker holds `f_i = Σ_j α_j y_j K(i, j) - y_i` for every example and
//! the two thresholds derived from it:
//!
//! - `b_lo = max { f_i : i ∈ I_low }`
//! - `b_hi = min { f_i : i ∈ I_high }`
//!
//! The dual is optimal exactly when `b_lo <= b_hi`. `f` is built once from
//! `α = 0` and afterwards only updated incrementally from two kernel rows.

use crate::core::{Bounds, ExecutionBackend};

/// One applied two-variable update, as seen by the gradient
pub struct GradientStep<'a> {
    /// `Δα_i * y_i`
    pub scaled_delta_i: f64,
    /// `Δα_j * y_j`
    pub scaled_delta_j: f64,
    pub row_i: &'a [f64],
    pub row_j: &'a [f64],
}

/// Gradient/bound tracker
#[derive(Debug, Clone)]
pub struct GradientTracker {
    f: Vec<f64>,
    bounds: Bounds,
}

impl GradientTracker {
    /// Gradient for `α = 0`: `f_i = -y_i`
    pub fn initialize(labels: &[f64]) -> Self {
        Self {
            f: labels.iter().map(|&y| -y).collect(),
            bounds: Bounds::empty(),
        }
    }

    /// Recompute `b_lo`, `b_hi` and their indices with a backend reduction
    pub fn refresh_bounds<B: ExecutionBackend>(
        &mut self,
        alpha: &[f64],
        labels: &[f64],
        c: f64,
        backend: &B,
    ) -> Bounds {
        self.bounds = backend.reduce_bounds(&self.f, alpha, labels, c);
        self.bounds
    }

    /// Apply `f_k += Δα_i y_i K(i,k) + Δα_j y_j K(j,k)` to every example
    pub fn update<B: ExecutionBackend>(&mut self, step: &GradientStep<'_>, backend: &B) {
        let (di, dj) = (step.scaled_delta_i, step.scaled_delta_j);
        let (row_i, row_j) = (step.row_i, step.row_j);
        backend.for_each_mut(&mut self.f, |k, fk| {
            *fk += di * row_i[k] + dj * row_j[k];
        });
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn gradient(&self) -> &[f64] {
        &self.f
    }
}
