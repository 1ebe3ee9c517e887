//! Sequential Minimal Optimization (SMO) solver implementation
//!
//! First-order working-set selection on the maximal violating pair, the
//! closed-form two-variable update, and incremental gradient maintenance.
//! All per-example work goes through an [`ExecutionBackend`].

use crate::cache::{CacheStats, KernelCache};
use crate::core::{
    Bounds, ExecutionBackend, OptimizationResult, Result, SVMError, TrainingConfig,
    TrainingSet, TrainingStatus,
};
use crate::kernel::Kernel;
use crate::solver::gradient::{GradientStep, GradientTracker};
use log::{debug, info, warn};

/// Floor for the curvature `η`; duplicate examples give `η = 0`
pub const MIN_ETA: f64 = 1e-12;

/// Relative distance from a box edge at which alpha snaps onto it
const BOX_TOLERANCE: f64 = 1e-12;

/// Iterations between progress log lines
const LOG_INTERVAL: usize = 1000;

/// SMO solver for the RBF SVM dual
///
/// A state machine: [`TrainingStatus::Initialized`] after construction,
/// [`TrainingStatus::Iterating`] after [`setup`](Self::setup), and one of the
/// terminal states once [`solve`](Self::solve) returns.
pub struct SMOSolver<'a, K: Kernel, B: ExecutionBackend> {
    data: &'a TrainingSet,
    config: &'a TrainingConfig,
    kernel: K,
    backend: B,
    cache: KernelCache,
    alpha: Vec<f64>,
    tracker: GradientTracker,
    status: TrainingStatus,
    iterations: usize,
}

impl<'a, K: Kernel, B: ExecutionBackend> SMOSolver<'a, K, B> {
    /// Create a solver over `data`; rejects an invalid configuration
    pub fn new(
        data: &'a TrainingSet,
        config: &'a TrainingConfig,
        kernel: K,
        backend: B,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            data,
            config,
            kernel,
            backend,
            cache: KernelCache::new(config.cache_size),
            alpha: Vec::new(),
            tracker: GradientTracker::initialize(&[]),
            status: TrainingStatus::Initialized,
            iterations: 0,
        })
    }

    /// Start from `α = 0`, build the gradient and the first bounds
    pub fn setup(&mut self) -> Result<()> {
        let n = self.data.len();
        let labels = self.data.labels();

        self.alpha = vec![0.0; n];
        self.tracker = GradientTracker::initialize(labels);
        let bounds = self
            .tracker
            .refresh_bounds(&self.alpha, labels, self.config.c, &self.backend);
        self.iterations = 0;
        self.status = TrainingStatus::Iterating;

        debug!(
            "SMO setup: {} examples, {} attributes, backend={}, b_lo={}, b_hi={}",
            n,
            self.data.num_attributes(),
            self.backend.name(),
            bounds.b_lo,
            bounds.b_hi
        );
        Ok(())
    }

    /// One SMO step on the current maximal violating pair
    ///
    /// Returns whether any alpha moved. Only valid while iterating.
    pub fn train_step(&mut self) -> Result<bool> {
        if self.status != TrainingStatus::Iterating {
            return Err(SVMError::OptimizationError(format!(
                "train_step called in state {:?}",
                self.status
            )));
        }

        let bounds = self.tracker.bounds();
        let (i, j) = match (bounds.i_lo, bounds.i_hi) {
            (Some(i), Some(j)) if i != j => (i, j),
            _ => return Ok(false),
        };

        let row_i = self
            .cache
            .lookup_row(i, &self.kernel, self.data, &self.backend)?;
        let row_j = self
            .cache
            .lookup_row(j, &self.kernel, self.data, &self.backend)?;

        let c = self.config.c;
        let (y_i, y_j) = (self.data.label(i), self.data.label(j));
        let (a_i, a_j) = (self.alpha[i], self.alpha[j]);

        let eta = (row_i[i] + row_j[j] - 2.0 * row_i[j]).max(MIN_ETA);

        let (low, high) = if y_i != y_j {
            ((a_i - a_j).max(0.0), c.min(c + a_i - a_j))
        } else {
            ((a_i + a_j - c).max(0.0), c.min(a_i + a_j))
        };

        let unclipped = a_i + y_i * (bounds.b_hi - bounds.b_lo) / eta;
        let a_i_new = snap_to_box(unclipped.max(low).min(high), c);
        let a_j_new = snap_to_box(a_j + y_i * y_j * (a_i - a_i_new), c);

        let delta_i = a_i_new - a_i;
        let delta_j = a_j_new - a_j;
        if delta_i == 0.0 && delta_j == 0.0 {
            return Ok(false);
        }

        self.alpha[i] = a_i_new;
        self.alpha[j] = a_j_new;

        let step = GradientStep {
            scaled_delta_i: delta_i * y_i,
            scaled_delta_j: delta_j * y_j,
            row_i: &row_i,
            row_j: &row_j,
        };
        self.tracker.update(&step, &self.backend);
        self.tracker
            .refresh_bounds(&self.alpha, self.data.labels(), c, &self.backend);

        Ok(true)
    }

    /// Termination predicate `b_lo <= b_hi + 2ε`; always false before [`setup`](Self::setup)
    pub fn is_converged(&self) -> bool {
        self.status != TrainingStatus::Initialized
            && self.tracker.bounds().converged(self.config.epsilon)
    }

    /// Run from setup until convergence or the iteration budget
    ///
    /// Hitting the budget is not an error: the result carries
    /// [`TrainingStatus::MaxIterReached`] and a bias from the current bounds.
    pub fn solve(&mut self) -> Result<OptimizationResult> {
        if self.status != TrainingStatus::Iterating {
            self.setup()?;
        }

        let status = loop {
            if self.is_converged() {
                break TrainingStatus::Converged;
            }
            if self.iterations >= self.config.max_iterations {
                break TrainingStatus::MaxIterReached;
            }

            self.train_step()?;
            self.iterations += 1;

            if self.iterations % LOG_INTERVAL == 0 {
                let bounds = self.tracker.bounds();
                debug!(
                    "iteration {}: b_lo={:.6}, b_hi={:.6}, gap={:.6}, cache hit rate={:.3}",
                    self.iterations,
                    bounds.b_lo,
                    bounds.b_hi,
                    bounds.gap(),
                    self.cache.hit_rate()
                );
            }
        };
        self.status = status;

        let bounds = self.tracker.bounds();
        match status {
            TrainingStatus::Converged => info!(
                "Converged at iteration number: {} (b_lo={:.6}, b_hi={:.6})",
                self.iterations, bounds.b_lo, bounds.b_hi
            ),
            _ => warn!(
                "Could not converge in {} iterations (gap={:.6}); training stopped",
                self.iterations,
                bounds.gap()
            ),
        }

        Ok(self.result())
    }

    /// Snapshot of the current solution; the bias comes from the current bounds
    pub fn result(&self) -> OptimizationResult {
        let bounds = self.tracker.bounds();
        OptimizationResult {
            alpha: self.alpha.clone(),
            b: bounds.bias(),
            status: self.status,
            iterations: self.iterations,
            bounds,
            support_vectors: self
                .alpha
                .iter()
                .enumerate()
                .filter_map(|(i, &a)| if a != 0.0 { Some(i) } else { None })
                .collect(),
            objective_value: self.dual_objective(),
            cache_stats: self.cache.stats(),
        }
    }

    /// Dual objective `Σα - ½ Σ_i α_i y_i (f_i + y_i)`, read off the gradient
    pub fn dual_objective(&self) -> f64 {
        let f = self.tracker.gradient();
        self.alpha
            .iter()
            .zip(self.data.labels())
            .zip(f)
            .map(|((&a, &y), &fi)| a - 0.5 * a * y * (fi + y))
            .sum()
    }

    pub fn status(&self) -> TrainingStatus {
        self.status
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    pub fn bounds(&self) -> Bounds {
        self.tracker.bounds()
    }

    pub fn gradient(&self) -> &[f64] {
        self.tracker.gradient()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

fn snap_to_box(value: f64, c: f64) -> f64 {
    if value <= c * BOX_TOLERANCE {
        0.0
    } else if value >= c * (1.0 - BOX_TOLERANCE) {
        c
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::RBFKernel;
    use crate::parallel::{Parallel, Sequential};
    use approx::assert_abs_diff_eq;

    fn two_clusters() -> TrainingSet {
        let points = [
            (2.0, 2.0, 1.0),
            (2.5, 2.0, 1.0),
            (2.0, 2.5, 1.0),
            (1.5, 2.0, 1.0),
            (2.0, 1.5, 1.0),
            (-2.0, -2.0, -1.0),
            (-2.5, -2.0, -1.0),
            (-2.0, -2.5, -1.0),
            (-1.5, -2.0, -1.0),
            (-2.0, -1.5, -1.0),
        ];
        let features = points.iter().flat_map(|&(a, b, _)| [a, b]).collect();
        let labels = points.iter().map(|&(_, _, y)| y).collect();
        TrainingSet::new(features, labels, 2).unwrap()
    }

    fn overlapping() -> TrainingSet {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for k in 0..30 {
            let t = k as f64;
            features.push((t * 0.7).sin() * 2.0);
            features.push((t * 1.3).cos() * 2.0);
            labels.push(if (t * 0.37).sin() > 0.0 { 1.0 } else { -1.0 });
        }
        TrainingSet::new(features, labels, 2).unwrap()
    }

    fn config(c: f64, gamma: f64, max_iterations: usize) -> TrainingConfig {
        TrainingConfig {
            c,
            gamma,
            epsilon: 0.001,
            max_iterations,
            cache_size: 10,
        }
    }

    #[test]
    fn test_state_transitions() {
        let data = two_clusters();
        let config = config(1.0, 0.5, 1000);
        let mut solver = SMOSolver::new(&data, &config, RBFKernel::new(0.5), Sequential).unwrap();
        assert_eq!(solver.status(), TrainingStatus::Initialized);

        solver.setup().unwrap();
        assert_eq!(solver.status(), TrainingStatus::Iterating);
        assert!(solver.alpha().iter().all(|&a| a == 0.0));

        let result = solver.solve().unwrap();
        assert_eq!(result.status, TrainingStatus::Converged);
        assert_eq!(solver.status(), TrainingStatus::Converged);
        assert!(solver.train_step().is_err());
    }

    #[test]
    fn test_train_step_before_setup_fails() {
        let data = two_clusters();
        let config = config(1.0, 0.5, 10);
        let mut solver = SMOSolver::new(&data, &config, RBFKernel::new(0.5), Sequential).unwrap();
        assert!(matches!(
            solver.train_step(),
            Err(SVMError::OptimizationError(_))
        ));
    }

    #[test]
    fn test_not_converged_before_setup() {
        let data = two_clusters();
        let config = config(1.0, 0.5, 10);
        let solver = SMOSolver::new(&data, &config, RBFKernel::new(0.5), Sequential).unwrap();
        assert!(!solver.is_converged());
    }

    #[test]
    fn test_violation_gap_shrinks() {
        let data = overlapping();
        let config = config(1.0, 0.5, 5000);
        let mut solver = SMOSolver::new(&data, &config, RBFKernel::new(0.5), Sequential).unwrap();
        solver.setup().unwrap();
        let initial_gap = solver.bounds().gap();
        assert_eq!(initial_gap, 2.0);

        let result = solver.solve().unwrap();
        assert_eq!(result.status, TrainingStatus::Converged);
        assert!(result.bounds.gap() <= 2.0 * config.epsilon);
        assert!(result.bounds.gap() < initial_gap);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let data = two_clusters();
        let config = config(-1.0, 0.5, 10);
        assert!(matches!(
            SMOSolver::new(&data, &config, RBFKernel::new(0.5), Sequential),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_initial_pair_is_maximal_violator() {
        let data = two_clusters();
        let config = config(1.0, 0.5, 10);
        let mut solver = SMOSolver::new(&data, &config, RBFKernel::new(0.5), Sequential).unwrap();
        solver.setup().unwrap();

        let bounds = solver.bounds();
        assert_eq!(bounds.b_lo, 1.0);
        assert_eq!(bounds.b_hi, -1.0);
        assert_eq!(data.label(bounds.i_lo.unwrap()), -1.0);
        assert_eq!(data.label(bounds.i_hi.unwrap()), 1.0);
        assert!(!solver.is_converged());
    }

    #[test]
    fn test_box_and_equality_invariants_hold_every_step() {
        let data = overlapping();
        let c = 0.8;
        let config = config(c, 1.0, 500);
        let mut solver = SMOSolver::new(&data, &config, RBFKernel::new(1.0), Sequential).unwrap();
        solver.setup().unwrap();

        for _ in 0..200 {
            if solver.is_converged() {
                break;
            }
            solver.train_step().unwrap();

            assert!(solver.alpha().iter().all(|&a| (0.0..=c).contains(&a)));
            let balance: f64 = solver
                .alpha()
                .iter()
                .zip(data.labels())
                .map(|(a, y)| a * y)
                .sum();
            assert_abs_diff_eq!(balance, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_dual_objective_never_decreases() {
        let data = overlapping();
        let config = config(2.0, 0.5, 500);
        let mut solver = SMOSolver::new(&data, &config, RBFKernel::new(0.5), Sequential).unwrap();
        solver.setup().unwrap();

        let mut previous = solver.dual_objective();
        assert_eq!(previous, 0.0);
        for _ in 0..300 {
            if solver.is_converged() {
                break;
            }
            solver.train_step().unwrap();
            let current = solver.dual_objective();
            assert!(
                current >= previous - 1e-9,
                "objective decreased: {} -> {}",
                previous,
                current
            );
            previous = current;
        }
        assert!(previous > 0.0);
    }

    #[test]
    fn test_gradient_matches_direct_computation() {
        let data = overlapping();
        let config = config(1.0, 0.5, 50);
        let kernel = RBFKernel::new(0.5);
        let mut solver = SMOSolver::new(&data, &config, kernel, Sequential).unwrap();
        solver.solve().unwrap();

        for i in 0..data.len() {
            let direct: f64 = (0..data.len())
                .map(|j| {
                    solver.alpha()[j] * data.label(j) * kernel.compute(data.example(i), data.example(j))
                })
                .sum::<f64>()
                - data.label(i);
            assert_abs_diff_eq!(solver.gradient()[i], direct, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_separable_clusters_converge() {
        let data = two_clusters();
        let config = config(1.0, 0.5, 1000);
        let mut solver = SMOSolver::new(&data, &config, RBFKernel::new(0.5), Parallel).unwrap();
        let result = solver.solve().unwrap();

        assert!(result.converged());
        assert!(result.iterations < 1000);
        assert!(!result.support_vectors.is_empty());
        assert!(result.bounds.converged(config.epsilon));
        assert!(result.b.is_finite());
        assert!(result.objective_value > 0.0);
    }

    #[test]
    fn test_max_iterations_is_reported_not_an_error() {
        let data = overlapping();
        let mut config = config(10.0, 2.0, 1);
        config.epsilon = 1e-9;
        let mut solver = SMOSolver::new(&data, &config, RBFKernel::new(2.0), Sequential).unwrap();
        let result = solver.solve().unwrap();

        assert_eq!(result.status, TrainingStatus::MaxIterReached);
        assert_eq!(result.iterations, 1);
        assert!(result.b.is_finite());
        assert_abs_diff_eq!(result.b, result.bounds.bias());
    }

    #[test]
    fn test_duplicate_zero_vectors_terminate() {
        let data = TrainingSet::new(vec![0.0, 0.0, 0.0, 0.0], vec![1.0, -1.0], 2).unwrap();
        let config = config(1.0, 0.5, 100);
        let mut solver = SMOSolver::new(&data, &config, RBFKernel::new(0.5), Sequential).unwrap();
        let result = solver.solve().unwrap();

        assert!(result.status.is_terminal());
        assert!(result.iterations <= 100);
        assert!(result.alpha.iter().all(|&a| (0.0..=1.0).contains(&a)));
        assert!(result.b.is_finite());
    }

    #[test]
    fn test_single_class_converges_immediately() {
        let data = TrainingSet::new(vec![1.0, 2.0, 3.0], vec![1.0, 1.0, 1.0], 1).unwrap();
        let config = config(1.0, 1.0, 100);
        let mut solver = SMOSolver::new(&data, &config, RBFKernel::new(1.0), Sequential).unwrap();
        let result = solver.solve().unwrap();

        assert_eq!(result.status, TrainingStatus::Converged);
        assert_eq!(result.iterations, 0);
        assert!(result.support_vectors.is_empty());
        assert_eq!(result.b, -1.0);
    }

    #[test]
    fn test_backends_produce_identical_solutions() {
        let data = overlapping();
        let config = config(1.0, 0.5, 2000);
        let kernel = RBFKernel::new(0.5);

        let seq = SMOSolver::new(&data, &config, kernel, Sequential)
            .unwrap()
            .solve()
            .unwrap();
        let par = SMOSolver::new(&data, &config, kernel, Parallel)
            .unwrap()
            .solve()
            .unwrap();

        assert_eq!(seq.iterations, par.iterations);
        assert_eq!(seq.alpha, par.alpha);
        assert_eq!(seq.b, par.b);
    }

    #[test]
    fn test_tiny_cache_gives_same_solution() {
        let data = overlapping();
        let kernel = RBFKernel::new(0.5);
        let mut small = config(1.0, 0.5, 2000);
        small.cache_size = 1;
        let large = config(1.0, 0.5, 2000);

        let a = SMOSolver::new(&data, &small, kernel, Sequential)
            .unwrap()
            .solve()
            .unwrap();
        let b = SMOSolver::new(&data, &large, kernel, Sequential)
            .unwrap()
            .solve()
            .unwrap();

        assert_eq!(a.alpha, b.alpha);
        assert!(a.cache_stats.misses >= b.cache_stats.misses);
        assert_eq!(a.cache_stats.capacity, 1);
    }

    #[test]
    fn test_snap_to_box() {
        assert_eq!(snap_to_box(1e-15, 1.0), 0.0);
        assert_eq!(snap_to_box(1.0 - 1e-15, 1.0), 1.0);
        assert_eq!(snap_to_box(0.5, 1.0), 0.5);
    }
}
