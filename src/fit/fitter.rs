//! Batch estimation of a quantile local projection.
//!
//! Given a [`QuantileProj`] (one regression per horizon), we:
//! - validate the quantile levels, the significance level and the solver limits
//! - build one design per horizon (rows with a missing response are left out)
//! - solve every (horizon, τ) pair, in parallel unless asked otherwise
//! - keep the results in (horizon ascending, τ ascending) order
//!
//! The batch is all-or-nothing: if any pair fails, the error of the first
//! failing pair in task order is returned and no partial results survive.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::CoefficientTable;
use crate::error::{QlpError, Result};
use crate::fit::builder::QuantileProj;
use crate::fit::coefficients::coefficient_table;
use crate::solver::{Design, IrlsSolver, QuantRegResults, QuantileSolver, SolverOptions};

/// Options of a batch fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Significance level of the reported intervals (coverage `1 - alpha`).
    pub alpha: f64,
    pub solver: SolverOptions,
    /// Solve the (horizon, τ) pairs on the rayon pool.
    pub parallel: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            alpha: crate::domain::DEFAULT_ALPHA,
            solver: SolverOptions::default(),
            parallel: true,
        }
    }
}

/// One fitted (horizon, τ) regression.
#[derive(Debug, Clone)]
pub struct FitRecord {
    pub depvar: String,
    pub horizon: usize,
    pub tau: f64,
    pub model: QuantRegResults,
}

/// Fitted quantile local projection.
///
/// Borrows the projection it was estimated from, so the cleaned data and
/// formulas stay available for forecasting without copies.
#[derive(Debug, Clone)]
pub struct QuantileFit<'a> {
    proj: &'a QuantileProj,
    quantiles: Vec<f64>,
    alpha: f64,
    records: Vec<FitRecord>,
    coefficients: CoefficientTable,
}

impl QuantileProj {
    /// Fit every horizon at every quantile with the stock IRLS solver.
    pub fn fit(&self, quantiles: &[f64], alpha: f64) -> Result<QuantileFit<'_>> {
        let opts = FitOptions {
            alpha,
            ..FitOptions::default()
        };
        self.fit_with(quantiles, &opts, &IrlsSolver)
    }

    /// Fit every horizon at every quantile with an explicit solver and options.
    pub fn fit_with(
        &self,
        quantiles: &[f64],
        opts: &FitOptions,
        solver: &dyn QuantileSolver,
    ) -> Result<QuantileFit<'_>> {
        validate_options(quantiles, opts)?;

        let mut quantiles = quantiles.to_vec();
        quantiles.sort_by(f64::total_cmp);

        let designs: Vec<(usize, &str, Design)> = self
            .regressions()
            .map(|(h, dv, formula)| formula.design(self.data()).map(|d| (h, dv, d)))
            .collect::<Result<_>>()?;

        let tasks: Vec<(usize, f64)> = (0..designs.len())
            .flat_map(|i| quantiles.iter().map(move |&tau| (i, tau)))
            .collect();

        let solve = |&(i, tau): &(usize, f64)| -> Result<FitRecord> {
            let (horizon, depvar, design) = &designs[i];
            solver
                .solve(design, tau, &opts.solver)
                .map(|model| {
                    debug!(
                        horizon = *horizon,
                        tau,
                        nobs = model.nobs(),
                        iterations = model.iterations(),
                        "fitted quantile regression"
                    );
                    FitRecord {
                        depvar: depvar.to_string(),
                        horizon: *horizon,
                        tau,
                        model,
                    }
                })
                .map_err(|source| QlpError::Fit {
                    horizon: *horizon,
                    tau,
                    source,
                })
        };

        // Results come back in task order either way.
        let outcomes: Vec<Result<FitRecord>> = if opts.parallel {
            tasks.par_iter().map(solve).collect()
        } else {
            tasks.iter().map(solve).collect()
        };
        let records: Vec<FitRecord> = outcomes.into_iter().collect::<Result<_>>()?;

        let not_converged = records.iter().filter(|r| !r.model.converged()).count();
        if not_converged > 0 {
            warn!(
                not_converged,
                max_iter = opts.solver.max_iter,
                "some quantile regressions stopped at the iteration cap"
            );
        }
        info!(
            regressions = records.len(),
            horizons = designs.len(),
            quantiles = quantiles.len(),
            "quantile regressions estimated"
        );

        let coefficients = coefficient_table(&records, opts.alpha);
        Ok(QuantileFit {
            proj: self,
            quantiles,
            alpha: opts.alpha,
            records,
            coefficients,
        })
    }
}

impl<'a> QuantileFit<'a> {
    pub fn proj(&self) -> &'a QuantileProj {
        self.proj
    }

    /// Quantile levels, ascending.
    pub fn quantiles(&self) -> &[f64] {
        &self.quantiles
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Fitted regressions in (horizon, τ) order.
    pub fn records(&self) -> &[FitRecord] {
        &self.records
    }

    pub fn record(&self, horizon: usize, tau: f64) -> Option<&FitRecord> {
        self.records.iter().find(|r| r.horizon == horizon && r.tau == tau)
    }

    pub fn coefficients(&self) -> &CoefficientTable {
        &self.coefficients
    }
}

fn validate_options(quantiles: &[f64], opts: &FitOptions) -> Result<()> {
    if quantiles.is_empty() {
        return Err(QlpError::validation("quantiles", "at least one quantile level is required"));
    }
    if let Some(q) = quantiles.iter().find(|q| !(q.is_finite() && **q > 0.0 && **q < 1.0)) {
        return Err(QlpError::validation(
            "quantiles",
            format!("{q} is outside the open interval (0, 1)"),
        ));
    }
    if !(opts.alpha.is_finite() && opts.alpha > 0.0 && opts.alpha < 1.0) {
        return Err(QlpError::validation(
            "alpha",
            format!("{} is outside the open interval (0, 1)", opts.alpha),
        ));
    }
    if opts.solver.max_iter == 0 {
        return Err(QlpError::validation("max_iter", "must be at least 1"));
    }
    if !(opts.solver.p_tol.is_finite() && opts.solver.p_tol > 0.0) {
        return Err(QlpError::validation("p_tol", "must be a positive number"));
    }
    Ok(())
}
