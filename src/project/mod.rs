//! Conditional quantile forecasts from a fitted local projection.
//!
//! Every fitted (horizon, τ) model is evaluated at each row of a conditioning
//! frame. Output rows are grouped in (horizon, τ) blocks, in fit order, and
//! follow the conditioning frame's row order inside a block.
//!
//! Intervals use the fit's significance level:
//! - mean interval: `mean ± t · se(mean)` (coefficient uncertainty)
//! - observation interval: `mean ± t · sqrt(se(mean)² + s²)` with `s²` the
//!   residual variance of the fit

use tracing::debug;

use crate::domain::{ForecastRow, ForecastTable, Frame};
use crate::error::{QlpError, Result};
use crate::fit::QuantileFit;

/// Forecast table of a fit over one conditioning frame.
#[derive(Debug, Clone)]
pub struct QuantileProjection<'a> {
    fit: &'a QuantileFit<'a>,
    cond_frame: &'a Frame,
    table: ForecastTable,
}

impl<'a> QuantileFit<'a> {
    /// Evaluate every fitted model at the rows of `cond_frame`.
    ///
    /// The frame must carry every independent variable, without missing
    /// values. Extra columns are ignored.
    pub fn project(&'a self, cond_frame: &'a Frame) -> Result<QuantileProjection<'a>> {
        let indvars = self.proj().indvars();
        let missing = cond_frame.missing_columns(indvars);
        if !missing.is_empty() {
            return Err(QlpError::validation(
                "conditioning frame",
                format!("missing independent variables: {}", missing.join(", ")),
            ));
        }
        if cond_frame.n_rows() == 0 {
            return Err(QlpError::validation("conditioning frame", "has no rows"));
        }

        let mut rows = Vec::with_capacity(self.records().len() * cond_frame.n_rows());
        for rec in self.records() {
            let formula = self.proj().formula(&rec.depvar).ok_or_else(|| {
                QlpError::validation("conditioning frame", format!("no formula for `{}`", rec.depvar))
            })?;
            let exog = formula.exog(cond_frame)?;
            let pred = rec
                .model
                .predict(&exog, self.alpha())
                .map_err(|source| QlpError::Fit {
                    horizon: rec.horizon,
                    tau: rec.tau,
                    source,
                })?;

            for (i, label) in cond_frame.index().iter().enumerate() {
                rows.push(ForecastRow {
                    index: label.clone(),
                    tau: rec.tau,
                    horizon: rec.horizon,
                    mean: pred.mean[i],
                    mean_se: pred.mean_se[i],
                    mean_ci_lower: pred.mean_ci_lower[i],
                    mean_ci_upper: pred.mean_ci_upper[i],
                    obs_ci_lower: pred.obs_ci_lower[i],
                    obs_ci_upper: pred.obs_ci_upper[i],
                });
            }
        }
        debug!(rows = rows.len(), scenarios = cond_frame.n_rows(), "conditional quantiles projected");

        Ok(QuantileProjection {
            fit: self,
            cond_frame,
            table: ForecastTable::new(rows),
        })
    }
}

impl<'a> QuantileProjection<'a> {
    pub fn fit(&self) -> &'a QuantileFit<'a> {
        self.fit
    }

    pub fn cond_frame(&self) -> &'a Frame {
        self.cond_frame
    }

    pub fn table(&self) -> &ForecastTable {
        &self.table
    }

    pub fn into_table(self) -> ForecastTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::QuantileProj;

    fn data() -> Frame {
        let x: Vec<f64> = (0..80).map(|i| ((i * 5) % 9) as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, v)| 2.0 + v + ((i * 3) % 7) as f64 - 3.0)
            .collect();
        Frame::with_range_index(vec![("y".into(), y), ("x".into(), x)]).unwrap()
    }

    fn scenarios() -> Frame {
        Frame::new(
            vec!["low".into(), "high".into()],
            vec![("x".into(), vec![1.0, 7.0]), ("unused".into(), vec![0.0, 0.0])],
        )
        .unwrap()
    }

    #[test]
    fn one_row_per_scenario_and_fit_in_block_order() {
        let data = data();
        let proj = QuantileProj::new("y", &["x"], &data, &[0, 3]).unwrap();
        let fit = proj.fit(&[0.1, 0.9], 0.1).unwrap();
        let cond = scenarios();
        let projection = fit.project(&cond).unwrap();
        let table = projection.table();

        assert_eq!(table.len(), 2 * 2 * 2);
        let keys: Vec<(usize, f64, &str)> = table
            .rows()
            .iter()
            .map(|r| (r.horizon, r.tau, r.index.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (0, 0.1, "low"),
                (0, 0.1, "high"),
                (0, 0.9, "low"),
                (0, 0.9, "high"),
                (3, 0.1, "low"),
                (3, 0.1, "high"),
                (3, 0.9, "low"),
                (3, 0.9, "high"),
            ]
        );

        for row in table.rows() {
            assert!(row.mean_ci_lower <= row.mean && row.mean <= row.mean_ci_upper);
            assert!(row.obs_ci_lower <= row.mean_ci_lower && row.mean_ci_upper <= row.obs_ci_upper);
        }
        // Higher quantile, higher forecast at the same scenario.
        let lo = table.block(0, 0.1)[1].mean;
        let hi = table.block(0, 0.9)[1].mean;
        assert!(hi > lo);
        assert_eq!(table.for_index("low").count(), 4);
    }

    #[test]
    fn projection_is_idempotent() {
        let data = data();
        let proj = QuantileProj::new("y", &["x"], &data, &[1]).unwrap();
        let fit = proj.fit(&[0.5], 0.05).unwrap();
        let cond = scenarios();
        let first = fit.project(&cond).unwrap().into_table();
        let second = fit.project(&cond).unwrap().into_table();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_regressor_is_named() {
        let data = data();
        let proj = QuantileProj::new("y", &["x"], &data, &[0]).unwrap();
        let fit = proj.fit(&[0.5], 0.1).unwrap();

        let cond = Frame::with_range_index(vec![("z".into(), vec![1.0])]).unwrap();
        let err = fit.project(&cond).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains('x'));

        let empty = Frame::with_range_index(vec![("x".into(), vec![])]).unwrap();
        assert!(fit.project(&empty).unwrap_err().is_validation());

        let gap = Frame::with_range_index(vec![("x".into(), vec![1.0, f64::NAN])]).unwrap();
        assert!(fit.project(&gap).unwrap_err().is_validation());
    }
}
