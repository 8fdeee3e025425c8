//! Quantile regression solver.
//!
//! The fit engine only talks to the [`QuantileSolver`] trait: give it a design
//! (response + regressors), a quantile level and tuning limits, get back a
//! [`QuantRegResults`] handle exposing coefficients, inference statistics and a
//! prediction operation.
//!
//! [`IrlsSolver`] is the stock implementation (iteratively reweighted least
//! squares with a kernel-sandwich covariance).

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

pub mod irls;
pub mod results;

pub use irls::*;
pub use results::*;

/// Tuning limits handed to the solver on every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    pub max_iter: usize,
    /// Convergence tolerance on the largest coefficient change between iterations.
    pub p_tol: f64,
    /// Keep a fit that hits `max_iter` (reporting it as not converged) instead
    /// of failing with [`SolverError::NotConverged`].
    ///
    /// Extreme quantiles on short samples routinely stop at the cap; their
    /// estimates are still usable and show up as wide intervals.
    pub tolerate_non_convergence: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            p_tol: 1e-5,
            tolerate_non_convergence: true,
        }
    }
}

/// Response vector and design matrix of one regression, with column labels.
#[derive(Debug, Clone)]
pub struct Design {
    names: Vec<String>,
    x: DMatrix<f64>,
    y: DVector<f64>,
}

impl Design {
    pub fn new(names: Vec<String>, x: DMatrix<f64>, y: DVector<f64>) -> Result<Self, SolverError> {
        if x.nrows() != y.len() || names.len() != x.ncols() {
            return Err(SolverError::DimensionMismatch {
                expected: x.ncols(),
                got: names.len(),
                rows: x.nrows(),
                targets: y.len(),
            });
        }
        Ok(Self { names, x, y })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn x(&self) -> &DMatrix<f64> {
        &self.x
    }

    pub fn y(&self) -> &DVector<f64> {
        &self.y
    }

    pub fn nobs(&self) -> usize {
        self.x.nrows()
    }
}

/// Fatal numerical failures of a single quantile regression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("no complete observations to fit")]
    NoObservations,

    #[error("{nobs} observations are not enough for {params} parameters")]
    InsufficientObservations { nobs: usize, params: usize },

    #[error("design matrix is singular (rank {rank} < {columns} columns)")]
    SingularDesign { rank: usize, columns: usize },

    #[error("dimension mismatch: {got} labels/columns for {expected} parameters ({rows} rows, {targets} targets)")]
    DimensionMismatch {
        expected: usize,
        got: usize,
        rows: usize,
        targets: usize,
    },

    #[error("non-finite estimate at iteration {iteration}")]
    NonFinite { iteration: usize },

    #[error("sparsity estimate is degenerate (bandwidth {bandwidth}, density {density})")]
    DegenerateSparsity { bandwidth: f64, density: f64 },

    #[error("no convergence after {iterations} iterations (last change {diff:e})")]
    NotConverged { iterations: usize, diff: f64 },
}

/// A quantile regression estimator.
///
/// Implementations must be deterministic: the same design, `tau` and options
/// always produce the same estimates, whatever thread runs them.
pub trait QuantileSolver: Sync {
    fn solve(&self, design: &Design, tau: f64, opts: &SolverOptions) -> Result<QuantRegResults, SolverError>;
}
