//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory by the fit and projection stages
//! - exported to CSV/JSON
//! - printed by the report module

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Label of the implicit constant term in every regression.
pub const INTERCEPT: &str = "Intercept";

/// Quantile levels used when the caller does not supply any.
pub const DEFAULT_QUANTILES: [f64; 7] = [0.05, 0.1, 0.25, 0.5, 0.75, 0.9, 0.95];

/// Significance level of the asymptotic tests (intervals cover `1 - alpha`).
pub const DEFAULT_ALPHA: f64 = 0.1;

/// One row of the coefficient table: a regressor at a (horizon, τ) pair.
///
/// `regressor` is a grouping key, not a primary key: the same regressor
/// repeats across horizons and quantiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientRow {
    pub regressor: String,
    pub tau: f64,
    pub horizon: usize,
    pub coeff: f64,
    pub tval: f64,
    pub pval: f64,
    pub lower_ci: f64,
    pub upper_ci: f64,
    pub pseudo_r2: f64,
    /// IRLS iterations used by the fit this row comes from.
    pub iterations: usize,
    /// Whether that fit met its tolerance before the iteration cap.
    pub converged: bool,
}

/// Long-format coefficient table, ordered in (horizon, τ) blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoefficientTable {
    rows: Vec<CoefficientRow>,
}

impl CoefficientTable {
    pub fn new(rows: Vec<CoefficientRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[CoefficientRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows of one regressor, across horizons and quantiles.
    pub fn regressor<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CoefficientRow> + 'a {
        self.rows.iter().filter(move |r| r.regressor == name)
    }

    /// The rows of a single fit, in regressor order.
    pub fn block(&self, horizon: usize, tau: f64) -> Vec<&CoefficientRow> {
        self.rows
            .iter()
            .filter(|r| r.horizon == horizon && r.tau == tau)
            .collect()
    }
}

/// One conditional quantile forecast: a conditioning row at a (horizon, τ) pair.
///
/// Forecast columns carry the `conditional_quantile_` prefix in exports so they
/// do not collide with the caller's own columns after a join on `index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub index: String,
    pub tau: f64,
    pub horizon: usize,
    #[serde(rename = "conditional_quantile_mean")]
    pub mean: f64,
    #[serde(rename = "conditional_quantile_mean_se")]
    pub mean_se: f64,
    #[serde(rename = "conditional_quantile_mean_ci_lower")]
    pub mean_ci_lower: f64,
    #[serde(rename = "conditional_quantile_mean_ci_upper")]
    pub mean_ci_upper: f64,
    #[serde(rename = "conditional_quantile_obs_ci_lower")]
    pub obs_ci_lower: f64,
    #[serde(rename = "conditional_quantile_obs_ci_upper")]
    pub obs_ci_upper: f64,
}

/// Long-format forecast table, ordered in (horizon, τ) blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastTable {
    rows: Vec<ForecastRow>,
}

impl ForecastTable {
    pub fn new(rows: Vec<ForecastRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every forecast made for one conditioning row.
    pub fn for_index<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a ForecastRow> + 'a {
        self.rows.iter().filter(move |r| r.index == label)
    }

    /// Forecasts of one (horizon, τ) pair, in conditioning-row order.
    pub fn block(&self, horizon: usize, tau: f64) -> Vec<&ForecastRow> {
        self.rows
            .iter()
            .filter(|r| r.horizon == horizon && r.tau == tau)
            .collect()
    }
}

/// Portable JSON export of a run: the model setup plus its tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsFile {
    pub tool: String,
    pub depvar: String,
    pub indvars: Vec<String>,
    pub horizons: Vec<usize>,
    pub quantiles: Vec<f64>,
    pub alpha: f64,
    pub dropped_rows: usize,
    pub coefficients: Vec<CoefficientRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecasts: Option<Vec<ForecastRow>>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub data_path: PathBuf,
    pub depvar: String,
    pub indvars: Vec<String>,
    pub horizons: Vec<usize>,
    pub quantiles: Vec<f64>,
    pub alpha: f64,

    pub max_iter: usize,
    pub p_tol: f64,
    /// Keep fits that hit the iteration cap instead of failing the batch.
    pub tolerate_non_convergence: bool,
    /// Fit (horizon, τ) pairs on the rayon pool.
    pub parallel: bool,

    /// Conditioning scenarios for `qlp project`.
    pub cond_path: Option<PathBuf>,

    /// CSV export of the command's main table (coefficients for `fit`,
    /// forecasts for `project`).
    pub export: Option<PathBuf>,
    /// CSV export of the coefficient table alongside a projection.
    pub export_coefficients: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(regressor: &str, horizon: usize, tau: f64) -> CoefficientRow {
        CoefficientRow {
            regressor: regressor.to_string(),
            tau,
            horizon,
            coeff: 1.0,
            tval: 2.0,
            pval: 0.05,
            lower_ci: 0.1,
            upper_ci: 1.9,
            pseudo_r2: 0.2,
            iterations: 12,
            converged: true,
        }
    }

    #[test]
    fn regressor_is_a_grouping_key() {
        let table = CoefficientTable::new(vec![
            row(INTERCEPT, 0, 0.5),
            row("x", 0, 0.5),
            row(INTERCEPT, 1, 0.5),
            row("x", 1, 0.5),
        ]);
        assert_eq!(table.regressor("x").count(), 2);
        assert_eq!(table.block(1, 0.5).len(), 2);
        assert!(table.block(2, 0.5).is_empty());
    }

    #[test]
    fn forecast_columns_are_prefixed_in_json() {
        let table = ForecastTable::new(vec![ForecastRow {
            index: "2020-01".into(),
            tau: 0.5,
            horizon: 0,
            mean: 1.0,
            mean_se: 0.1,
            mean_ci_lower: 0.8,
            mean_ci_upper: 1.2,
            obs_ci_lower: 0.0,
            obs_ci_upper: 2.0,
        }]);
        let json = serde_json::to_string(&table).unwrap();
        assert!(json.contains("\"conditional_quantile_mean\":1.0"));
        assert!(json.contains("\"conditional_quantile_obs_ci_upper\":2.0"));
        assert_eq!(table.for_index("2020-01").count(), 1);
    }
}
