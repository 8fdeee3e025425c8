//! Regression formulas.
//!
//! Formulas are plain values (response + regressors) so that the fit and
//! projection code can build designs for any horizon without caring how the
//! response column was derived.

pub mod formula;

pub use formula::*;
