//! Mathematical utilities: least squares, pseudo-inverses and distribution helpers.

pub mod ols;
pub mod stats;

pub use ols::*;
pub use stats::*;
