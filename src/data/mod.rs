//! Data loading
//!
//! Reads delimited text training files into a dense [`TrainingSet`](crate::core::TrainingSet).

pub mod csv;

pub use self::csv::*;
