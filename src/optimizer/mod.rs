//! Training driver and trained model
//!
//! [`SVMOptimizer`] ties the RBF kernel, an execution backend and the SMO
//! solver together; [`TrainedSVM`] is the resulting classifier.

use crate::core::{
    ExecutionBackend, OptimizationResult, Result, SVMError, SVMModel, TrainingConfig,
    TrainingSet,
};
use crate::kernel::{Kernel, RBFKernel};
use crate::solver::SMOSolver;
use log::info;

/// High-level optimizer running SMO with an RBF kernel
pub struct SVMOptimizer<B: ExecutionBackend> {
    config: TrainingConfig,
    backend: B,
}

/// Model plus the solver's account of how it was reached
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub model: TrainedSVM,
    pub result: OptimizationResult,
}

impl<B: ExecutionBackend + Clone> SVMOptimizer<B> {
    /// Create a new optimizer with the given configuration and backend
    pub fn new(config: TrainingConfig, backend: B) -> Self {
        Self { config, backend }
    }

    /// Train on `data` until convergence or the iteration budget
    pub fn train(&self, data: &TrainingSet) -> Result<TrainingRun> {
        let kernel = RBFKernel::try_new(self.config.gamma)?;
        let mut solver = SMOSolver::new(data, &self.config, kernel, self.backend.clone())?;
        let result = solver.solve()?;

        let model = TrainedSVM::from_training(data, &result.alpha, result.b, self.config.gamma)?;
        info!(
            "Trained model: {} support vectors, b={:.6}, status={:?}",
            model.n_support_vectors(),
            model.bias(),
            result.status
        );
        Ok(TrainingRun { model, result })
    }

    /// Get the optimizer configuration
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// A trained RBF SVM
///
/// Support vectors are packed row-major so evaluation walks one contiguous
/// block. The decision value is `Σ α_s y_s K(x, x_s) - b`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedSVM {
    kernel: RBFKernel,
    bias: f64,
    num_attributes: usize,
    alpha: Vec<f64>,
    labels: Vec<f64>,
    features: Vec<f64>,
}

impl TrainedSVM {
    /// Assemble a model from explicit support vectors
    pub fn new(
        gamma: f64,
        bias: f64,
        num_attributes: usize,
        alpha: Vec<f64>,
        labels: Vec<f64>,
        features: Vec<f64>,
    ) -> Result<Self> {
        let kernel = RBFKernel::try_new(gamma)?;
        if alpha.len() != labels.len() {
            return Err(SVMError::DimensionMismatch {
                expected: alpha.len(),
                actual: labels.len(),
            });
        }
        if features.len() != alpha.len() * num_attributes {
            return Err(SVMError::DimensionMismatch {
                expected: alpha.len() * num_attributes,
                actual: features.len(),
            });
        }
        if let Some(&bad) = labels.iter().find(|&&y| y != 1.0 && y != -1.0) {
            return Err(SVMError::InvalidLabel(bad));
        }

        Ok(Self {
            kernel,
            bias,
            num_attributes,
            alpha,
            labels,
            features,
        })
    }

    /// Keep every training example whose dense `alpha` entry is nonzero
    pub fn from_training(data: &TrainingSet, alpha: &[f64], bias: f64, gamma: f64) -> Result<Self> {
        if alpha.len() != data.len() {
            return Err(SVMError::DimensionMismatch {
                expected: data.len(),
                actual: alpha.len(),
            });
        }

        let mut sv_alpha = Vec::new();
        let mut sv_labels = Vec::new();
        let mut sv_features = Vec::new();
        for (i, &a) in alpha.iter().enumerate() {
            if a != 0.0 {
                sv_alpha.push(a);
                sv_labels.push(data.label(i));
                sv_features.extend_from_slice(data.example(i));
            }
        }

        Self::new(
            gamma,
            bias,
            data.num_attributes(),
            sv_alpha,
            sv_labels,
            sv_features,
        )
    }

    pub fn gamma(&self) -> f64 {
        self.kernel.gamma()
    }

    pub fn num_attributes(&self) -> usize {
        self.num_attributes
    }

    /// Dual coefficients of the support vectors
    pub fn alpha_values(&self) -> &[f64] {
        &self.alpha
    }

    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    /// Decision value after checking `features` against the model width
    ///
    /// A model without support vectors accepts any width.
    pub fn checked_decision_value(&self, features: &[f64]) -> Result<f64> {
        if !self.alpha.is_empty() && features.len() != self.num_attributes {
            return Err(SVMError::DimensionMismatch {
                expected: self.num_attributes,
                actual: features.len(),
            });
        }
        Ok(self.decision_value(features))
    }

    /// Features of support vector `s`
    pub fn support_vector(&self, s: usize) -> &[f64] {
        let start = s * self.num_attributes;
        &self.features[start..start + self.num_attributes]
    }
}

impl SVMModel for TrainedSVM {
    fn decision_value(&self, features: &[f64]) -> f64 {
        let expansion: f64 = (0..self.alpha.len())
            .map(|s| {
                self.alpha[s] * self.labels[s] * self.kernel.compute(features, self.support_vector(s))
            })
            .sum();
        expansion - self.bias
    }

    fn n_support_vectors(&self) -> usize {
        self.alpha.len()
    }

    fn bias(&self) -> f64 {
        self.bias
    }
}
