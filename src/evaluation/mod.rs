//! Accuracy evaluation of trained models
//!
//! Decision values for every example are computed through an
//! [`ExecutionBackend`] against the model's packed support-vector block,
//! so scoring a large set is one parallel pass.

use crate::core::{ExecutionBackend, Prediction, Result, SVMError, SVMModel, TrainingSet};
use crate::optimizer::TrainedSVM;

/// Scores a model against a labelled data set
pub struct AccuracyEvaluator<B: ExecutionBackend> {
    backend: B,
}

impl<B: ExecutionBackend> AccuracyEvaluator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Decision value of every example in `data`
    pub fn decision_values(&self, model: &TrainedSVM, data: &TrainingSet) -> Result<Vec<f64>> {
        // a model without support vectors carries no attribute count
        if model.n_support_vectors() > 0 && model.num_attributes() != data.num_attributes() {
            return Err(SVMError::DimensionMismatch {
                expected: model.num_attributes(),
                actual: data.num_attributes(),
            });
        }

        let mut values = vec![0.0; data.len()];
        self.backend.for_each_mut(&mut values, |k, value| {
            *value = model.decision_value(data.example(k));
        });
        Ok(values)
    }

    /// Predictions for every example in `data`
    pub fn predict(&self, model: &TrainedSVM, data: &TrainingSet) -> Result<Vec<Prediction>> {
        Ok(self
            .decision_values(model, data)?
            .into_iter()
            .map(Prediction::from_decision)
            .collect())
    }

    /// Fraction of examples whose predicted sign matches the label
    pub fn evaluate(&self, model: &TrainedSVM, data: &TrainingSet) -> Result<f64> {
        Ok(self.evaluate_detailed(model, data)?.accuracy())
    }

    /// Accuracy of the classifier given by a dense `alpha` over `data` itself
    pub fn evaluate_dense(
        &self,
        data: &TrainingSet,
        alpha: &[f64],
        bias: f64,
        gamma: f64,
    ) -> Result<f64> {
        let model = TrainedSVM::from_training(data, alpha, bias, gamma)?;
        self.evaluate(&model, data)
    }

    /// Confusion counts and derived metrics
    pub fn evaluate_detailed(
        &self,
        model: &TrainedSVM,
        data: &TrainingSet,
    ) -> Result<EvaluationMetrics> {
        let predictions = self.predict(model, data)?;
        Ok(EvaluationMetrics::from_predictions(&predictions, data.labels()))
    }
}

/// Detailed evaluation metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationMetrics {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl EvaluationMetrics {
    /// Tally predictions against true labels
    pub fn from_predictions(predictions: &[Prediction], labels: &[f64]) -> Self {
        let mut metrics = Self::default();
        for (pred, &actual) in predictions.iter().zip(labels) {
            match (pred.label > 0.0, actual > 0.0) {
                (true, true) => metrics.true_positives += 1,
                (false, false) => metrics.true_negatives += 1,
                (true, false) => metrics.false_positives += 1,
                (false, true) => metrics.false_negatives += 1,
            }
        }
        metrics
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// Calculate accuracy: (TP + TN) / (TP + TN + FP + FN)
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// Calculate precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Calculate recall (sensitivity): TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Calculate F1 score: 2 * (precision * recall) / (precision + recall)
    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }

    /// Calculate specificity: TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio(self.true_negatives, self.true_negatives + self.false_positives)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
