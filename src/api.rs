//! High-level API for training and using RBF SVMs
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rbfsvm::api::SVM;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // 200 examples with 8 attributes, label first on every line
//! let model = SVM::new()
//!     .with_c(1.0)
//!     .with_epsilon(0.001)
//!     .train_from_file("train.csv", 200, 8)?;
//!
//! println!("Converged: {}", model.info().converged);
//! model.save("model.txt")?;
//! # Ok(())
//! # }
//! ```

use crate::core::{
    ExecutionBackend, OptimizationResult, Prediction, Result, SVMModel, TrainingConfig,
    TrainingSet, TrainingStatus,
};
use crate::data::CSVLoader;
use crate::evaluation::{AccuracyEvaluator, EvaluationMetrics};
use crate::optimizer::{SVMOptimizer, TrainedSVM};
use crate::parallel::Parallel;
use crate::persistence;
use std::path::Path;

/// SVM trainer with builder pattern
///
/// Unset `gamma` resolves to `1 / num_attributes` of the training set.
pub struct SVM<B: ExecutionBackend = Parallel> {
    c: f64,
    gamma: Option<f64>,
    epsilon: f64,
    max_iterations: usize,
    cache_size: usize,
    backend: B,
}

impl SVM<Parallel> {
    /// Create a new trainer with default parameters on the parallel backend
    pub fn new() -> Self {
        Self::with_backend(Parallel)
    }
}

impl Default for SVM<Parallel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ExecutionBackend + Clone> SVM<B> {
    /// Create a trainer running on `backend`
    pub fn with_backend(backend: B) -> Self {
        Self {
            c: TrainingConfig::DEFAULT_C,
            gamma: None,
            epsilon: TrainingConfig::DEFAULT_EPSILON,
            max_iterations: TrainingConfig::DEFAULT_MAX_ITERATIONS,
            cache_size: TrainingConfig::DEFAULT_CACHE_SIZE,
            backend,
        }
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    /// Set RBF kernel width
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    /// Set convergence tolerance
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set maximum number of iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set kernel cache size in rows
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    /// Resolve the configuration for a data set with `num_attributes` columns
    pub fn config_for(&self, num_attributes: usize) -> TrainingConfig {
        let defaults = TrainingConfig::for_attributes(num_attributes);
        TrainingConfig {
            c: self.c,
            gamma: self.gamma.unwrap_or(defaults.gamma),
            epsilon: self.epsilon,
            max_iterations: self.max_iterations,
            cache_size: self.cache_size,
        }
    }

    /// Train on a data set
    pub fn train(self, data: &TrainingSet) -> Result<TrainedModel<B>> {
        let config = self.config_for(data.num_attributes());
        let optimizer = SVMOptimizer::new(config, self.backend.clone());
        let run = optimizer.train(data)?;
        Ok(TrainedModel {
            model: run.model,
            result: Some(run.result),
            backend: self.backend,
        })
    }

    /// Train from a delimited text file of known shape
    pub fn train_from_file<P: AsRef<Path>>(
        self,
        path: P,
        num_examples: usize,
        num_attributes: usize,
    ) -> Result<TrainedModel<B>> {
        let data = CSVLoader::new(num_examples, num_attributes).load_file(path)?;
        self.train(&data)
    }
}

/// Trained model with evaluation and persistence helpers
pub struct TrainedModel<B: ExecutionBackend = Parallel> {
    model: TrainedSVM,
    result: Option<OptimizationResult>,
    backend: B,
}

impl<B: ExecutionBackend + Clone> TrainedModel<B> {
    /// Wrap an existing model, e.g. one loaded from disk
    pub fn from_model(model: TrainedSVM, backend: B) -> Self {
        Self {
            model,
            result: None,
            backend,
        }
    }

    /// Load a model file
    pub fn load<P: AsRef<Path>>(path: P, backend: B) -> Result<Self> {
        Ok(Self::from_model(persistence::load_model(path)?, backend))
    }

    /// Predict a single example; its length must match the training data
    pub fn predict(&self, features: &[f64]) -> Result<Prediction> {
        self.model
            .checked_decision_value(features)
            .map(Prediction::from_decision)
    }

    /// Predict every example of a data set
    pub fn predict_dataset(&self, data: &TrainingSet) -> Result<Vec<Prediction>> {
        AccuracyEvaluator::new(self.backend.clone()).predict(&self.model, data)
    }

    /// Evaluate accuracy on a data set
    pub fn evaluate(&self, data: &TrainingSet) -> Result<f64> {
        AccuracyEvaluator::new(self.backend.clone()).evaluate(&self.model, data)
    }

    /// Get detailed evaluation metrics
    pub fn evaluate_detailed(&self, data: &TrainingSet) -> Result<EvaluationMetrics> {
        AccuracyEvaluator::new(self.backend.clone()).evaluate_detailed(&self.model, data)
    }

    /// Write the model file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_model(path, &self.model)
    }

    /// Get model information
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            n_support_vectors: self.model.n_support_vectors(),
            bias: self.model.bias(),
            gamma: self.model.gamma(),
            status: self.result.as_ref().map(|r| r.status),
            iterations: self.result.as_ref().map(|r| r.iterations),
            converged: self.result.as_ref().map_or(false, |r| r.converged()),
        }
    }

    /// Solver result, present for models trained in this process
    pub fn result(&self) -> Option<&OptimizationResult> {
        self.result.as_ref()
    }

    /// Get the underlying trained model
    pub fn inner(&self) -> &TrainedSVM {
        &self.model
    }
}

/// Model information
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub n_support_vectors: usize,
    pub bias: f64,
    pub gamma: f64,
    pub status: Option<TrainingStatus>,
    pub iterations: Option<usize>,
    pub converged: bool,
}
