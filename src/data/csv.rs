//! Delimited text training files
//!
//! One example per line: the label (`+1` / `-1`) followed by the feature
//! values, separated by commas and/or whitespace:
//!
//! ```text
//! +1,0.25,1.5,3.0
//! -1 0.75 0.0 2.5
//! ```
//!
//! Empty lines and lines starting with `#` are skipped. The caller states the
//! expected shape up front; the loader checks the file against it.

use crate::core::{Result, SVMError, TrainingSet};
use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Loader for a training file of known shape
#[derive(Debug, Clone, Copy)]
pub struct CSVLoader {
    num_examples: usize,
    num_attributes: usize,
}

impl CSVLoader {
    pub fn new(num_examples: usize, num_attributes: usize) -> Self {
        Self {
            num_examples,
            num_attributes,
        }
    }

    /// Load a training set from a file
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<TrainingSet> {
        let file = File::open(path.as_ref()).map_err(SVMError::IoError)?;
        debug!("Reading training data from {:?}", path.as_ref());
        self.load_reader(BufReader::new(file))
    }

    /// Load a training set from a reader
    ///
    /// Reads exactly `num_examples` rows; further rows are ignored.
    pub fn load_reader<R: BufRead>(&self, reader: R) -> Result<TrainingSet> {
        if self.num_examples == 0 || self.num_attributes == 0 {
            return Err(SVMError::InvalidParameter(
                "number of examples and attributes must be positive".to_string(),
            ));
        }

        if self.num_examples.checked_mul(self.num_attributes).is_none() {
            return Err(SVMError::InvalidParameter(format!(
                "{} examples of {} attributes overflow the feature buffer",
                self.num_examples, self.num_attributes
            )));
        }

        // grown from the rows actually read, not the declared shape
        let mut features = Vec::new();
        let mut labels = Vec::new();
        let mut ignored = 0usize;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(SVMError::IoError)?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if labels.len() == self.num_examples {
                ignored += 1;
                continue;
            }

            let (label, values) = self.parse_data_line(line, line_no + 1)?;
            labels.push(label);
            features.extend(values);
        }

        if ignored > 0 {
            warn!(
                "Ignored {} rows beyond the expected {} examples",
                ignored, self.num_examples
            );
        }
        if labels.len() < self.num_examples {
            return Err(SVMError::InvalidDataset(format!(
                "expected {} examples, found {}",
                self.num_examples,
                labels.len()
            )));
        }

        TrainingSet::new(features, labels, self.num_attributes)
    }

    /// Parse one data line into its label and feature values
    fn parse_data_line(&self, line: &str, line_no: usize) -> Result<(f64, Vec<f64>)> {
        let mut fields = line
            .split(|ch: char| ch == ',' || ch.is_whitespace())
            .filter(|field| !field.is_empty());

        let label_str = fields
            .next()
            .ok_or_else(|| SVMError::ParseError(format!("line {line_no}: missing label")))?;
        let label = parse_number(label_str, line_no)?;
        if label != 1.0 && label != -1.0 {
            return Err(SVMError::InvalidLabel(label));
        }

        let values = fields
            .map(|field| parse_number(field, line_no))
            .collect::<Result<Vec<f64>>>()?;
        if values.len() != self.num_attributes {
            return Err(SVMError::DimensionMismatch {
                expected: self.num_attributes,
                actual: values.len(),
            });
        }

        Ok((label, values))
    }
}

fn parse_number(field: &str, line_no: usize) -> Result<f64> {
    field
        .parse::<f64>()
        .map_err(|_| SVMError::ParseError(format!("line {line_no}: invalid number '{field}'")))
}
