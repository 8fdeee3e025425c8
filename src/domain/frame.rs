//! In-memory numeric table with a string row index.
//!
//! Columns are stored column-major as `Vec<f64>`; a missing value is `NaN`.
//! Row order is meaningful (observations are implicitly ordered in time) and
//! is preserved by every operation here.

use crate::error::{QlpError, Result};

#[derive(Debug, Clone)]
pub struct Frame {
    index: Vec<String>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Frame {
    /// Build a frame from an index and named columns.
    ///
    /// Every column must have one value per index label and column names must
    /// be unique and non-empty.
    pub fn new(index: Vec<String>, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let mut frame = Frame {
            index,
            names: Vec::with_capacity(columns.len()),
            columns: Vec::with_capacity(columns.len()),
        };
        for (name, values) in columns {
            if frame.has_column(&name) {
                return Err(QlpError::validation(
                    "data",
                    format!("duplicate column name `{name}`"),
                ));
            }
            frame.set_column(name, values)?;
        }
        Ok(frame)
    }

    /// Build a frame whose index is the row position (`"0"`, `"1"`, ...).
    pub fn with_range_index(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let n = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let index = (0..n).map(|i| i.to_string()).collect();
        Frame::new(index, columns)
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Names from `wanted` that are not columns of this frame, in `wanted` order.
    pub fn missing_columns<'a>(&self, wanted: &'a [String]) -> Vec<&'a str> {
        wanted
            .iter()
            .filter(|name| !self.has_column(name))
            .map(String::as_str)
            .collect()
    }

    /// Insert a column, replacing any existing column with the same name.
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(QlpError::validation("data", "column names must not be empty"));
        }
        if values.len() != self.index.len() {
            return Err(QlpError::validation(
                "data",
                format!(
                    "column `{name}` has {} values but the index has {} rows",
                    values.len(),
                    self.index.len()
                ),
            ));
        }
        match self.names.iter().position(|n| *n == name) {
            Some(i) => self.columns[i] = values,
            None => {
                self.names.push(name);
                self.columns.push(values);
            }
        }
        Ok(())
    }

    /// Copy of the frame restricted to `names` (in that order).
    pub fn select(&self, names: &[String]) -> Result<Frame> {
        let missing = self.missing_columns(names);
        if !missing.is_empty() {
            return Err(QlpError::validation(
                "data",
                format!("columns not found: {}", missing.join(", ")),
            ));
        }
        let columns = names
            .iter()
            .filter_map(|name| self.column(name).map(|c| (name.clone(), c.to_vec())))
            .collect();
        Frame::new(self.index.clone(), columns)
    }

    /// Number of rows with a missing value in any of `subset`.
    ///
    /// Names that are not columns are ignored.
    pub fn rows_with_missing(&self, subset: &[String]) -> usize {
        let cols = self.subset_columns(subset);
        (0..self.n_rows())
            .filter(|&row| cols.iter().any(|c| c[row].is_nan()))
            .count()
    }

    /// Copy of the frame without the rows that have a missing value in `subset`.
    ///
    /// Columns outside `subset` are carried along (and may keep their own
    /// missing values).
    pub fn drop_missing(&self, subset: &[String]) -> Frame {
        let cols = self.subset_columns(subset);
        let keep: Vec<usize> = (0..self.n_rows())
            .filter(|&row| cols.iter().all(|c| !c[row].is_nan()))
            .collect();

        Frame {
            index: keep.iter().map(|&row| self.index[row].clone()).collect(),
            names: self.names.clone(),
            columns: self
                .columns
                .iter()
                .map(|col| keep.iter().map(|&row| col[row]).collect())
                .collect(),
        }
    }

    fn subset_columns(&self, subset: &[String]) -> Vec<&[f64]> {
        subset.iter().filter_map(|name| self.column(name)).collect()
    }
}

/// Shift a series backward by `h` positions: `out[i] = values[i + h]`.
///
/// The last `h` entries have no source value and are `NaN`.
pub fn lead(values: &[f64], h: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| i.checked_add(h).and_then(|j| values.get(j)).copied().unwrap_or(f64::NAN))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        Frame::new(
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            vec![
                ("y".into(), vec![1.0, f64::NAN, 3.0, 4.0]),
                ("x".into(), vec![10.0, 20.0, 30.0, f64::NAN]),
                ("z".into(), vec![f64::NAN, 0.0, 0.0, 0.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn drop_missing_only_looks_at_subset() {
        let frame = sample();
        let subset = vec!["y".to_string(), "x".to_string()];
        assert_eq!(frame.rows_with_missing(&subset), 2);

        let clean = frame.drop_missing(&subset);
        assert_eq!(clean.index(), &["a".to_string(), "c".to_string()]);
        assert_eq!(clean.column("y").unwrap(), &[1.0, 3.0]);
        // `z` is carried along, including its own missing value.
        assert!(clean.column("z").unwrap()[0].is_nan());
        assert_eq!(clean.n_cols(), 3);
    }

    #[test]
    fn new_rejects_ragged_and_duplicate_columns() {
        let ragged = Frame::new(vec!["0".into()], vec![("y".into(), vec![1.0, 2.0])]);
        assert!(ragged.unwrap_err().is_validation());

        let dup = Frame::with_range_index(vec![
            ("y".into(), vec![1.0]),
            ("y".into(), vec![2.0]),
        ]);
        assert!(dup.unwrap_err().to_string().contains("duplicate column"));
    }

    #[test]
    fn select_keeps_requested_order() {
        let frame = sample();
        let picked = frame.select(&["x".to_string(), "y".to_string()]).unwrap();
        assert_eq!(picked.column_names(), &["x".to_string(), "y".to_string()]);
        assert_eq!(picked.n_rows(), 4);
        assert!(frame.select(&["nope".to_string()]).unwrap_err().is_validation());
    }

    #[test]
    fn missing_columns_preserve_request_order() {
        let frame = sample();
        let wanted = vec!["w".to_string(), "x".to_string(), "v".to_string()];
        assert_eq!(frame.missing_columns(&wanted), vec!["w", "v"]);
    }

    #[test]
    fn lead_shifts_backward_and_pads_with_nan() {
        let out = lead(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(&out[..2], &[3.0, 4.0]);
        assert!(out[2].is_nan() && out[3].is_nan());
        assert_eq!(lead(&[1.0, 2.0], 0), vec![1.0, 2.0]);
        assert!(lead(&[1.0, 2.0], 5).iter().all(|v| v.is_nan()));
        assert!(lead(&[1.0, 2.0, 7.5], usize::MAX).iter().all(|v| v.is_nan()));
    }
}
