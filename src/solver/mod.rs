//! SVM solver implementation
//!
//! This module implements the Sequential Minimal Optimization (SMO) algorithm
//! with the two-threshold (`b_lo` / `b_hi`) optimality conditions of
//! Keerthi et al., selecting the maximal violating pair every iteration.

pub mod gradient;
pub mod smo;

pub use self::gradient::*;
pub use self::smo::*;
