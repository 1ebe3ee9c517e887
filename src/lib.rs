//! Binary RBF-kernel Support Vector Machine training
//!
//! Sequential Minimal Optimization with maximal-violating-pair selection
//! (Keerthi et al., "Improvements to Platt's SMO Algorithm for SVM Classifier
//! Design"), a row-granular LRU kernel cache, and data-parallel bound
//! reductions and gradient updates behind a pluggable execution backend.

pub mod api;
pub mod cache;
pub mod core;
pub mod data;
pub mod evaluation;
pub mod kernel;
pub mod optimizer;
pub mod parallel;
pub mod persistence;
pub mod solver;

// Re-export main types for convenience
pub use crate::api::{ModelInfo, TrainedModel, SVM};
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{Result, SVMError};
pub use crate::data::CSVLoader;
pub use crate::evaluation::{AccuracyEvaluator, EvaluationMetrics};
pub use crate::kernel::{Kernel, RBFKernel};
pub use crate::optimizer::{SVMOptimizer, TrainedSVM, TrainingRun};
pub use crate::parallel::{Parallel, Sequential};
pub use crate::solver::SMOSolver;

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
