//! Local projection setup: horizon-shifted responses and per-horizon formulas.
//!
//! For a dependent variable `y`, regressors `x1..xk` and horizons `h`:
//!
//! - rows with a missing `y` or `x` are dropped once, up front
//! - horizon 0 regresses `y` itself; horizon `h > 0` regresses a derived
//!   column `y_fwd_h` whose row `i` holds `y` at row `i + h`
//! - every horizon gets `response ~ x1 + ... + xk` (intercept implicit)
//!
//! This stage is pure: the same inputs always give the same cleaned data,
//! derived names and formulas.

use std::collections::HashMap;

use tracing::info;

use crate::domain::{Frame, lead};
use crate::error::{QlpError, Result};
use crate::models::Formula;

/// Name of the forward-shifted response for horizon `h` (`h > 0`).
pub fn forward_name(depvar: &str, h: usize) -> String {
    format!("{depvar}_fwd_{h}")
}

/// Cleaned data and regression formulas of a quantile local projection.
#[derive(Debug, Clone)]
pub struct QuantileProj {
    depvar: String,
    indvars: Vec<String>,
    horizons: Vec<usize>,
    data: Frame,
    depvars: Vec<String>,
    formulas: HashMap<String, Formula>,
    dropped_rows: usize,
}

impl QuantileProj {
    /// Build the per-horizon regressions of `depvar` on `indvars`.
    ///
    /// Horizons are stored sorted; duplicates are kept (and fitted twice).
    pub fn new<S: AsRef<str>>(depvar: &str, indvars: &[S], data: &Frame, horizons: &[usize]) -> Result<Self> {
        let indvars: Vec<String> = indvars.iter().map(|s| s.as_ref().to_string()).collect();
        validate_inputs(depvar, &indvars, data, horizons)?;

        let mut used = vec![depvar.to_string()];
        used.extend(indvars.iter().filter(|v| v.as_str() != depvar).cloned());

        let mut clean = data.select(&used)?.drop_missing(&used);
        let dropped_rows = data.n_rows() - clean.n_rows();
        if dropped_rows > 0 {
            info!(dropped_rows, "dropped rows with missing dependent or independent variables");
        }
        if clean.n_rows() == 0 {
            return Err(QlpError::validation(
                "data",
                "no rows left after dropping missing values",
            ));
        }
        reject_infinite(&clean, &used)?;

        let mut horizons = horizons.to_vec();
        horizons.sort_unstable();

        let y = clean.column(depvar).map(<[f64]>::to_vec).unwrap_or_default();
        let mut depvars = Vec::with_capacity(horizons.len());
        for &h in &horizons {
            if h == 0 {
                depvars.push(depvar.to_string());
            } else {
                let name = forward_name(depvar, h);
                clean.set_column(name.clone(), lead(&y, h))?;
                depvars.push(name);
            }
        }

        let formulas = depvars
            .iter()
            .map(|dv| (dv.clone(), Formula::new(dv.clone(), indvars.clone())))
            .collect();

        Ok(Self {
            depvar: depvar.to_string(),
            indvars,
            horizons,
            data: clean,
            depvars,
            formulas,
            dropped_rows,
        })
    }

    pub fn depvar(&self) -> &str {
        &self.depvar
    }

    pub fn indvars(&self) -> &[String] {
        &self.indvars
    }

    /// Horizons, ascending.
    pub fn horizons(&self) -> &[usize] {
        &self.horizons
    }

    /// Cleaned data, including the derived forward columns.
    pub fn data(&self) -> &Frame {
        &self.data
    }

    /// Response name per horizon, aligned with [`Self::horizons`].
    pub fn depvars(&self) -> &[String] {
        &self.depvars
    }

    pub fn formula(&self, depvar: &str) -> Option<&Formula> {
        self.formulas.get(depvar)
    }

    pub fn formulas(&self) -> &HashMap<String, Formula> {
        &self.formulas
    }

    /// Rows of the input frame dropped for missing values.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// `(horizon, response, formula)` in horizon order.
    pub fn regressions(&self) -> impl Iterator<Item = (usize, &str, &Formula)> + '_ {
        self.horizons
            .iter()
            .zip(&self.depvars)
            .filter_map(|(&h, dv)| self.formulas.get(dv).map(|f| (h, dv.as_str(), f)))
    }
}

/// Missing values are dropped, but an infinite value cannot be fitted.
fn reject_infinite(frame: &Frame, columns: &[String]) -> Result<()> {
    for name in columns {
        let Some(col) = frame.column(name) else { continue };
        if let Some(row) = col.iter().position(|v| v.is_infinite()) {
            return Err(QlpError::validation(
                "data",
                format!("column `{name}` has an infinite value at row `{}`", frame.index()[row]),
            ));
        }
    }
    Ok(())
}

fn validate_inputs(depvar: &str, indvars: &[String], data: &Frame, horizons: &[usize]) -> Result<()> {
    if depvar.trim().is_empty() {
        return Err(QlpError::validation("depvar", "must not be empty"));
    }
    if !data.has_column(depvar) {
        return Err(QlpError::validation(
            "depvar",
            format!("`{depvar}` is not a column of the data"),
        ));
    }

    if indvars.is_empty() {
        return Err(QlpError::validation("indvars", "at least one independent variable is required"));
    }
    let missing = data.missing_columns(indvars);
    if !missing.is_empty() {
        return Err(QlpError::validation(
            "indvars",
            format!("not in data columns: {}", missing.join(", ")),
        ));
    }
    for (i, v) in indvars.iter().enumerate() {
        if indvars[..i].contains(v) {
            return Err(QlpError::validation("indvars", format!("`{v}` is listed twice")));
        }
    }

    if horizons.is_empty() {
        return Err(QlpError::validation("horizons", "at least one horizon is required"));
    }
    Ok(())
}
