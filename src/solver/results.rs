//! Fitted quantile regression handle: coefficients, inference and prediction.

use nalgebra::{DMatrix, DVector};

use crate::math::{row_quadratic_forms, t_critical, t_two_sided_pvalue};
use crate::solver::SolverError;

/// Output of one quantile regression.
///
/// Inference uses Student-t quantiles with `df_resid = nobs − k` degrees of
/// freedom.
#[derive(Debug, Clone)]
pub struct QuantRegResults {
    tau: f64,
    names: Vec<String>,
    params: DVector<f64>,
    cov_params: DMatrix<f64>,
    nobs: usize,
    df_resid: f64,
    prsquared: f64,
    resid_var: f64,
    iterations: usize,
    converged: bool,
}

/// Conditional quantile predictions for a block of exogenous rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub mean: Vec<f64>,
    pub mean_se: Vec<f64>,
    pub mean_ci_lower: Vec<f64>,
    pub mean_ci_upper: Vec<f64>,
    pub obs_ci_lower: Vec<f64>,
    pub obs_ci_upper: Vec<f64>,
}

impl Prediction {
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

impl QuantRegResults {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tau: f64,
        names: Vec<String>,
        params: DVector<f64>,
        cov_params: DMatrix<f64>,
        nobs: usize,
        df_resid: f64,
        prsquared: f64,
        resid_var: f64,
        iterations: usize,
        converged: bool,
    ) -> Self {
        Self {
            tau,
            names,
            params,
            cov_params,
            nobs,
            df_resid,
            prsquared,
            resid_var,
            iterations,
            converged,
        }
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Coefficient labels, `"Intercept"` first.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn params(&self) -> &DVector<f64> {
        &self.params
    }

    pub fn cov_params(&self) -> &DMatrix<f64> {
        &self.cov_params
    }

    pub fn nobs(&self) -> usize {
        self.nobs
    }

    pub fn df_resid(&self) -> f64 {
        self.df_resid
    }

    pub fn prsquared(&self) -> f64 {
        self.prsquared
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Standard errors (square roots of the covariance diagonal).
    pub fn bse(&self) -> Vec<f64> {
        self.cov_params.diagonal().iter().map(|v| v.max(0.0).sqrt()).collect()
    }

    pub fn tvalues(&self) -> Vec<f64> {
        self.params
            .iter()
            .zip(self.bse())
            .map(|(b, se)| b / se)
            .collect()
    }

    pub fn pvalues(&self) -> Vec<f64> {
        self.tvalues()
            .into_iter()
            .map(|t| t_two_sided_pvalue(t, self.df_resid).unwrap_or(f64::NAN))
            .collect()
    }

    /// `(lower, upper)` bounds covering `1 − alpha` for every coefficient.
    pub fn conf_int(&self, alpha: f64) -> Vec<(f64, f64)> {
        let crit = t_critical(alpha, self.df_resid).unwrap_or(f64::NAN);
        self.params
            .iter()
            .zip(self.bse())
            .map(|(b, se)| (b - crit * se, b + crit * se))
            .collect()
    }

    /// Evaluate the fitted quantile at each row of `exog` (intercept column
    /// included), with `1 − alpha` intervals.
    ///
    /// The mean interval reflects coefficient uncertainty only; the observation
    /// interval adds the residual variance of the fit.
    pub fn predict(&self, exog: &DMatrix<f64>, alpha: f64) -> Result<Prediction, SolverError> {
        if exog.ncols() != self.params.len() {
            return Err(SolverError::DimensionMismatch {
                expected: self.params.len(),
                got: exog.ncols(),
                rows: exog.nrows(),
                targets: exog.nrows(),
            });
        }

        let mean: Vec<f64> = (exog * &self.params).iter().copied().collect();
        let var_mean = row_quadratic_forms(exog, &self.cov_params);
        let crit = t_critical(alpha, self.df_resid).unwrap_or(f64::NAN);

        let n = mean.len();
        let mut out = Prediction {
            mean_se: Vec::with_capacity(n),
            mean_ci_lower: Vec::with_capacity(n),
            mean_ci_upper: Vec::with_capacity(n),
            obs_ci_lower: Vec::with_capacity(n),
            obs_ci_upper: Vec::with_capacity(n),
            mean,
        };
        for (m, v) in out.mean.iter().zip(var_mean) {
            let se = v.max(0.0).sqrt();
            let se_obs = (v.max(0.0) + self.resid_var).sqrt();
            out.mean_se.push(se);
            out.mean_ci_lower.push(m - crit * se);
            out.mean_ci_upper.push(m + crit * se);
            out.obs_ci_lower.push(m - crit * se_obs);
            out.obs_ci_upper.push(m + crit * se_obs);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn fixture() -> QuantRegResults {
        QuantRegResults::new(
            0.5,
            vec!["Intercept".into(), "x".into()],
            DVector::from_column_slice(&[1.0, 2.0]),
            DMatrix::from_row_slice(2, 2, &[0.04, 0.0, 0.0, 0.01]),
            1_000_001,
            1_000_000.0,
            0.3,
            4.0,
            7,
            true,
        )
    }

    #[test]
    fn inference_statistics_follow_from_covariance() {
        let fit = fixture();
        assert_eq!(fit.tau(), 0.5);
        assert_eq!(fit.df_resid(), 1_000_000.0);
        assert_eq!(fit.cov_params().shape(), (2, 2));
        let bse = fit.bse();
        assert_abs_diff_eq!(bse[0], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(bse[1], 0.1, epsilon = 1e-12);

        let t = fit.tvalues();
        assert_abs_diff_eq!(t[0], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(t[1], 20.0, epsilon = 1e-12);
        assert!(fit.pvalues().iter().all(|p| *p < 1e-4));

        // Large df: the t critical value is essentially the normal one.
        let ci = fit.conf_int(0.05);
        assert_abs_diff_eq!(ci[1].0, 2.0 - 1.96 * 0.1, epsilon = 1e-3);
        assert_abs_diff_eq!(ci[1].1, 2.0 + 1.96 * 0.1, epsilon = 1e-3);
    }

    #[test]
    fn prediction_intervals_nest() {
        let fit = fixture();
        let exog = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 1.0, 1.0]);
        let pred = fit.predict(&exog, 0.1).unwrap();

        assert_eq!(pred.len(), 2);
        assert_abs_diff_eq!(pred.mean[0], 1.0);
        assert_abs_diff_eq!(pred.mean[1], 3.0);
        assert_abs_diff_eq!(pred.mean_se[0], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(pred.mean_se[1], 0.05_f64.sqrt(), epsilon = 1e-12);
        for i in 0..2 {
            assert!(pred.obs_ci_lower[i] < pred.mean_ci_lower[i]);
            assert!(pred.mean_ci_lower[i] < pred.mean[i]);
            assert!(pred.mean[i] < pred.mean_ci_upper[i]);
            assert!(pred.mean_ci_upper[i] < pred.obs_ci_upper[i]);
        }
    }

    #[test]
    fn prediction_rejects_wrong_width() {
        let fit = fixture();
        let exog = DMatrix::from_element(1, 3, 1.0);
        assert!(fit.predict(&exog, 0.1).is_err());
    }
}
