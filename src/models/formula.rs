//! Linear regression formulas and their design matrices.
//!
//! A [`Formula`] is `response ~ x1 + x2 + ...` with an implicit intercept. The
//! fit and projection stages rely on two primitive operations:
//! - build the (response, design) pair of a regression over a frame
//! - build exogenous rows for prediction over a conditioning frame
//!
//! Every design row has the constant term first (`"Intercept"`), followed by
//! the regressors in formula order.

use std::fmt;

use nalgebra::{DMatrix, DVector};

use crate::domain::{Frame, INTERCEPT};
use crate::error::{QlpError, Result};
use crate::solver::Design;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    response: String,
    regressors: Vec<String>,
}

impl Formula {
    pub fn new(response: impl Into<String>, regressors: Vec<String>) -> Self {
        Self {
            response: response.into(),
            regressors,
        }
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn regressors(&self) -> &[String] {
        &self.regressors
    }

    /// Coefficient labels of the fitted model.
    pub fn term_names(&self) -> Vec<String> {
        std::iter::once(INTERCEPT.to_string())
            .chain(self.regressors.iter().cloned())
            .collect()
    }

    /// Regression design over `frame`.
    ///
    /// Rows with a missing response or regressor are left out, so the last `h`
    /// rows of a horizon-`h` response never enter the fit.
    pub fn design(&self, frame: &Frame) -> Result<Design> {
        let y = lookup(frame, &self.response, "formula")?;
        let xs = self.regressor_columns(frame, "formula")?;

        let rows: Vec<usize> = (0..frame.n_rows())
            .filter(|&i| !y[i].is_nan() && xs.iter().all(|c| !c[i].is_nan()))
            .collect();
        if let Some(&row) = rows
            .iter()
            .find(|&&i| y[i].is_infinite() || xs.iter().any(|c| c[i].is_infinite()))
        {
            return Err(QlpError::validation(
                "formula",
                format!("infinite value in `{self}` at row `{}`", frame.index()[row]),
            ));
        }

        let x = fill_design(&rows, &xs);
        let y = DVector::from_iterator(rows.len(), rows.iter().map(|&i| y[i]));
        Design::new(self.term_names(), x, y)
            .map_err(|e| QlpError::validation("formula", e.to_string()))
    }

    /// Exogenous rows (intercept included) for every row of `frame`.
    ///
    /// Missing or infinite regressor values are rejected: a forecast row is
    /// never dropped silently.
    pub fn exog(&self, frame: &Frame) -> Result<DMatrix<f64>> {
        let xs = self.regressor_columns(frame, "conditioning frame")?;
        for (name, col) in self.regressors.iter().zip(&xs) {
            if let Some(row) = col.iter().position(|v| !v.is_finite()) {
                let what = if col[row].is_nan() { "is missing a value" } else { "has an infinite value" };
                return Err(QlpError::validation(
                    "conditioning frame",
                    format!("column `{name}` {what} at row `{}`", frame.index()[row]),
                ));
            }
        }
        let rows: Vec<usize> = (0..frame.n_rows()).collect();
        Ok(fill_design(&rows, &xs))
    }

    fn regressor_columns<'f>(&self, frame: &'f Frame, argument: &str) -> Result<Vec<&'f [f64]>> {
        self.regressors
            .iter()
            .map(|name| lookup(frame, name, argument))
            .collect()
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.response, self.regressors.join(" + "))
    }
}

fn lookup<'f>(frame: &'f Frame, name: &str, argument: &str) -> Result<&'f [f64]> {
    frame
        .column(name)
        .ok_or_else(|| QlpError::validation(argument, format!("column `{name}` not found")))
}

/// Fill an `rows.len() × (1 + xs.len())` design with the constant term first.
fn fill_design(rows: &[usize], xs: &[&[f64]]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), xs.len() + 1, |r, c| {
        if c == 0 { 1.0 } else { xs[c - 1][rows[r]] }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::new(
            vec!["t0".into(), "t1".into(), "t2".into()],
            vec![
                ("y".into(), vec![1.0, 2.0, f64::NAN]),
                ("a".into(), vec![10.0, 20.0, 30.0]),
                ("b".into(), vec![-1.0, -2.0, -3.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn renders_like_a_model_formula() {
        let f = Formula::new("y_fwd_2", vec!["a".into(), "b".into()]);
        assert_eq!(f.to_string(), "y_fwd_2 ~ a + b");
        assert_eq!(f.term_names(), vec!["Intercept", "a", "b"]);
    }

    #[test]
    fn design_skips_incomplete_rows() {
        let f = Formula::new("y", vec!["a".into(), "b".into()]);
        let d = f.design(&frame()).unwrap();
        assert_eq!(d.nobs(), 2);
        assert_eq!(d.x().row(1).iter().copied().collect::<Vec<_>>(), vec![1.0, 20.0, -2.0]);
        assert_eq!(d.y().as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn design_rejects_infinite_values() {
        let mut data = frame();
        data.set_column("b", vec![-1.0, f64::NEG_INFINITY, -3.0]).unwrap();
        let err = Formula::new("y", vec!["a".into(), "b".into()]).design(&data).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("t1"));
    }

    #[test]
    fn exog_rejects_missing_regressors() {
        let f = Formula::new("y", vec!["a".into()]);
        let x = f.exog(&frame()).unwrap();
        assert_eq!(x.shape(), (3, 2));

        let mut cond = frame();
        cond.set_column("a", vec![1.0, f64::NAN, 3.0]).unwrap();
        let err = f.exog(&cond).unwrap_err();
        assert!(err.to_string().contains("`a`") && err.to_string().contains("t1"));

        cond.set_column("a", vec![1.0, 2.0, f64::INFINITY]).unwrap();
        let err = f.exog(&cond).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("infinite") && err.to_string().contains("t2"));

        let missing = Formula::new("y", vec!["zz".into()]);
        assert!(missing.exog(&frame()).unwrap_err().is_validation());
    }
}
