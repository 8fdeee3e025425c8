//! Quantile regression by iteratively reweighted least squares.
//!
//! Given a design `X` (n×k), a response `y` and a level `τ`, we minimize the
//! check loss `Σ ρ_τ(y_i − x_i'β)` by solving a sequence of weighted least
//! squares problems:
//!
//! - start with a plain OLS pass (unit weights)
//! - `β ← (X*'X)⁺ X*'y` with `X* = X / w` row-wise
//! - recompute residuals `r = y − Xβ`, floor `|r|` at `1e-6`, and set
//!   `w_i = τ|r_i|` for negative residuals, `(1−τ)|r_i|` otherwise
//! - stop when `max|Δβ| ≤ p_tol` or after `max_iter` passes
//!
//! The covariance is the kernel sandwich `(X'X)⁻¹ X'DX (X'X)⁻¹`, with the
//! sparsity estimated by an Epanechnikov kernel on a Hall–Sheather bandwidth.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::math::{
    check_loss, epanechnikov, hall_sheather, matrix_rank, normal_ppf, pinv, sample_quantile,
    solve_least_squares, std_dev,
};
use crate::solver::{Design, QuantRegResults, QuantileSolver, SolverError, SolverOptions};

/// Residuals smaller than this (in absolute value) are pushed out to it so the
/// weights stay finite.
const RESID_FLOOR: f64 = 1e-6;

/// Size of the test behind the Hall–Sheather bandwidth.
const BANDWIDTH_ALPHA: f64 = 0.05;

/// Probability bounds used when widening `τ ± h` on the normal scale.
const PROB_EPS: f64 = 1e-10;

/// IRLS quantile regression with robust kernel-sandwich standard errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct IrlsSolver;

impl QuantileSolver for IrlsSolver {
    fn solve(&self, design: &Design, tau: f64, opts: &SolverOptions) -> Result<QuantRegResults, SolverError> {
        let x = design.x();
        let y = design.y();
        let (n, k) = x.shape();

        if n == 0 {
            return Err(SolverError::NoObservations);
        }
        if n <= k {
            return Err(SolverError::InsufficientObservations { nobs: n, params: k });
        }
        let rank = matrix_rank(x);
        if rank < k {
            return Err(SolverError::SingularDesign { rank, columns: k });
        }

        let (beta, iterations, diff) = irls(x, y, tau, opts)?;
        let converged = diff <= opts.p_tol;
        if !converged {
            if !opts.tolerate_non_convergence {
                return Err(SolverError::NotConverged { iterations, diff });
            }
            debug!(tau, iterations, diff, "quantile regression stopped at the iteration cap");
        }

        let resid: Vec<f64> = (y - x * &beta).iter().copied().collect();
        let cov_params = sandwich_covariance(x, y.as_slice(), &resid, tau)?;

        let df_resid = (n - k) as f64;
        let resid_var = resid.iter().map(|e| e * e).sum::<f64>() / df_resid;
        let prsquared = pseudo_r2(y.as_slice(), &resid, tau);

        Ok(QuantRegResults::new(
            tau,
            design.names().to_vec(),
            beta,
            cov_params,
            n,
            df_resid,
            prsquared,
            resid_var,
            iterations,
            converged,
        ))
    }
}

/// Run the reweighting loop; returns `(β, iterations, last max|Δβ|)`.
fn irls(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    tau: f64,
    opts: &SolverOptions,
) -> Result<(DVector<f64>, usize, f64), SolverError> {
    let (n, k) = x.shape();
    let mut beta = DVector::from_element(k, 1.0);
    let mut inv_w = vec![1.0; n];
    let mut diff = f64::INFINITY;
    let mut iterations = 0usize;

    while iterations < opts.max_iter && diff > opts.p_tol {
        iterations += 1;

        let next = if iterations == 1 {
            solve_least_squares(x, y)
        } else {
            weighted_step(x, y, &inv_w)
        }
        .ok_or(SolverError::NonFinite { iteration: iterations })?;

        diff = (&next - &beta).amax();
        beta = next;

        let resid = y - x * &beta;
        for (w, &r) in inv_w.iter_mut().zip(resid.iter()) {
            let r = if r.abs() < RESID_FLOOR {
                if r >= 0.0 { RESID_FLOOR } else { -RESID_FLOOR }
            } else {
                r
            };
            let scaled = if r < 0.0 { tau * r } else { (1.0 - tau) * r };
            *w = 1.0 / scaled.abs();
        }
    }

    Ok((beta, iterations, diff))
}

/// `(X*'X)⁺ X*'y` with the rows of `X*` scaled by `inv_w`.
fn weighted_step(x: &DMatrix<f64>, y: &DVector<f64>, inv_w: &[f64]) -> Option<DVector<f64>> {
    let mut xstar = x.clone();
    for (i, mut row) in xstar.row_iter_mut().enumerate() {
        row *= inv_w[i];
    }
    let xty = xstar.transpose() * y;
    pinv(&(xstar.transpose() * x))
        .map(|p| p * xty)
        .filter(|b| b.iter().all(|v| v.is_finite()))
}

/// Kernel-sandwich covariance of the coefficients.
fn sandwich_covariance(
    x: &DMatrix<f64>,
    y: &[f64],
    resid: &[f64],
    tau: f64,
) -> Result<DMatrix<f64>, SolverError> {
    let n = resid.len();
    let iqr = match (sample_quantile(resid, 0.75), sample_quantile(resid, 0.25)) {
        (Some(q75), Some(q25)) => q75 - q25,
        _ => return Err(SolverError::NonFinite { iteration: 0 }),
    };

    let h_prob = hall_sheather(n, tau, BANDWIDTH_ALPHA);
    let lo = (tau - h_prob).max(PROB_EPS);
    let hi = (tau + h_prob).min(1.0 - PROB_EPS);
    let spread = normal_ppf(hi) - normal_ppf(lo);

    let sd = std_dev(y);
    let mut bandwidth = sd.min(iqr / 1.34) * spread;
    // An exact fit has a zero residual IQR; fall back to the response scale.
    if !(bandwidth > 0.0 && bandwidth.is_finite()) {
        bandwidth = sd * spread;
    }

    let density = resid.iter().map(|e| epanechnikov(e / bandwidth)).sum::<f64>() / (n as f64 * bandwidth);
    if !(bandwidth > 0.0 && bandwidth.is_finite() && density > 0.0 && density.is_finite()) {
        return Err(SolverError::DegenerateSparsity { bandwidth, density });
    }

    let above = (tau / density).powi(2);
    let below = ((1.0 - tau) / density).powi(2);
    let mut dx = x.clone();
    for (i, mut row) in dx.row_iter_mut().enumerate() {
        row *= if resid[i] > 0.0 { above } else { below };
    }

    let xtx_inv = pinv(&(x.transpose() * x)).ok_or(SolverError::NonFinite { iteration: 0 })?;
    let xtdx = x.transpose() * dx;
    let cov = &xtx_inv * xtdx * &xtx_inv;
    if cov.iter().all(|v| v.is_finite()) {
        Ok(cov)
    } else {
        Err(SolverError::NonFinite { iteration: 0 })
    }
}

/// Koenker–Machado pseudo-R²: one minus the ratio of the fitted check loss to
/// the check loss of the unconditional sample quantile.
fn pseudo_r2(y: &[f64], resid: &[f64], tau: f64) -> f64 {
    let Some(q) = sample_quantile(y, tau) else {
        return f64::NAN;
    };
    let fitted: f64 = resid.iter().map(|&e| check_loss(e, tau)).sum();
    let restricted: f64 = y.iter().map(|&v| check_loss(v - q, tau)).sum();
    if restricted > 0.0 {
        1.0 - fitted / restricted
    } else {
        f64::NAN
    }
}
