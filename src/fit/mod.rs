//! Quantile local projection estimation.
//!
//! Responsibilities:
//!
//! - build horizon-shifted responses and per-horizon formulas (`builder`)
//! - solve every (horizon, τ) regression, in parallel (`fitter`)
//! - collect coefficients and inference into a long table (`coefficients`)

pub mod builder;
pub mod coefficients;
pub mod fitter;

pub use builder::*;
pub use coefficients::*;
pub use fitter::*;
