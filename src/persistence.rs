//! Model serialization and persistence
//!
//! The model file is plain text:
//!
//! ```text
//! <gamma>
//! <b>
//! <alpha>,<label>,<feature_1>,...,<feature_k>   (one line per support vector)
//! ```
//!
//! Floats are written with Rust's shortest round-trip formatting, so a reloaded
//! model makes bit-identical decisions. A JSON run summary can be written next
//! to the model for bookkeeping.

use crate::cache::CacheStats;
use crate::core::{
    OptimizationResult, Result, SVMError, SVMModel, TrainingConfig, TrainingStatus,
};
use crate::optimizer::TrainedSVM;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Write a model in the text format
pub fn write_model<W: Write>(mut writer: W, model: &TrainedSVM) -> Result<()> {
    writeln!(writer, "{}", model.gamma())?;
    writeln!(writer, "{}", model.bias())?;

    for s in 0..model.n_support_vectors() {
        write!(
            writer,
            "{},{}",
            model.alpha_values()[s],
            model.labels()[s]
        )?;
        for value in model.support_vector(s) {
            write!(writer, ",{}", value)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Save model to file
pub fn save_model<P: AsRef<Path>>(path: P, model: &TrainedSVM) -> Result<()> {
    let file = File::create(path).map_err(SVMError::IoError)?;
    write_model(BufWriter::new(file), model)
}

/// Read a model in the text format
pub fn read_model<R: BufRead>(reader: R) -> Result<TrainedSVM> {
    let mut lines = reader
        .lines()
        .enumerate()
        .filter(|(_, line)| line.as_ref().map_or(true, |l| !l.trim().is_empty()));

    let mut header = |name: &str| -> Result<f64> {
        let (line_no, line) = lines
            .next()
            .ok_or_else(|| SVMError::ParseError(format!("missing {name} header")))?;
        parse_field(line?.trim(), line_no + 1)
    };
    let gamma = header("gamma")?;
    let bias = header("bias")?;

    let mut num_attributes = None;
    let mut alpha = Vec::new();
    let mut labels = Vec::new();
    let mut features = Vec::new();

    for (line_no, line) in lines {
        let line = line?;
        let fields = line
            .trim()
            .split(',')
            .map(|field| parse_field(field.trim(), line_no + 1))
            .collect::<Result<Vec<f64>>>()?;
        if fields.len() < 3 {
            return Err(SVMError::ParseError(format!(
                "line {}: expected alpha, label and features",
                line_no + 1
            )));
        }

        let alpha_value = fields[0];
        if !(alpha_value.is_finite() && alpha_value > 0.0) {
            return Err(SVMError::ParseError(format!(
                "line {}: support vector alpha must be positive and finite, got {alpha_value}",
                line_no + 1
            )));
        }

        let width = fields.len() - 2;
        match num_attributes {
            None => num_attributes = Some(width),
            Some(expected) if expected != width => {
                return Err(SVMError::DimensionMismatch {
                    expected,
                    actual: width,
                })
            }
            Some(_) => {}
        }

        alpha.push(alpha_value);
        labels.push(fields[1]);
        features.extend_from_slice(&fields[2..]);
    }

    TrainedSVM::new(
        gamma,
        bias,
        num_attributes.unwrap_or(0),
        alpha,
        labels,
        features,
    )
}

/// Load model from file
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<TrainedSVM> {
    let file = File::open(path).map_err(SVMError::IoError)?;
    read_model(BufReader::new(file))
}

fn parse_field(field: &str, line_no: usize) -> Result<f64> {
    field
        .parse::<f64>()
        .map_err(|_| SVMError::ParseError(format!("line {line_no}: invalid number '{field}'")))
}

/// Machine-readable account of one training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    /// Library version used to create the model
    pub library_version: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    pub backend: String,
    pub num_examples: usize,
    pub num_attributes: usize,
    pub config: TrainingConfig,
    pub status: TrainingStatus,
    pub iterations: usize,
    pub bias: f64,
    pub b_lo: f64,
    pub b_hi: f64,
    pub objective_value: f64,
    pub n_support_vectors: usize,
    pub training_accuracy: Option<f64>,
    pub elapsed_seconds: f64,
    pub cache: CacheStats,
}

impl TrainingSummary {
    /// Summarize a finished run
    pub fn new(
        config: &TrainingConfig,
        backend: &str,
        num_examples: usize,
        num_attributes: usize,
        result: &OptimizationResult,
        elapsed_seconds: f64,
    ) -> Self {
        Self {
            library_version: crate::VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            backend: backend.to_string(),
            num_examples,
            num_attributes,
            config: config.clone(),
            status: result.status,
            iterations: result.iterations,
            bias: result.b,
            b_lo: result.bounds.b_lo,
            b_hi: result.bounds.b_hi,
            objective_value: result.objective_value,
            n_support_vectors: result.support_vectors.len(),
            training_accuracy: None,
            elapsed_seconds,
            cache: result.cache_stats,
        }
    }

    pub fn with_training_accuracy(mut self, accuracy: f64) -> Self {
        self.training_accuracy = Some(accuracy);
        self
    }

    /// Save summary to file as pretty-printed JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(SVMError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(())
    }
}
