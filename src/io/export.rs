//! Export coefficient/forecast tables and frames.
//!
//! - tables go to CSV with one header row (serde field names, so forecast
//!   columns carry the `conditional_quantile_` prefix)
//! - a whole run goes to pretty-printed JSON ([`ResultsFile`])
//! - frames go to CSV with the row index first and empty cells for missing
//!   values, which [`crate::io::read_frame_csv`] reads back unchanged

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{CoefficientTable, ForecastTable, Frame, ResultsFile};
use crate::error::{QlpError, Result};

/// Header of the index column in exported frames.
pub const INDEX_HEADER: &str = "index";

/// Write the coefficient table to a CSV file.
pub fn write_coefficients_csv(path: &Path, table: &CoefficientTable) -> Result<()> {
    let file = File::create(path).map_err(|e| QlpError::file(path, e))?;
    write_rows(file, table.rows())
}

/// Write the forecast table to a CSV file.
pub fn write_forecasts_csv(path: &Path, table: &ForecastTable) -> Result<()> {
    let file = File::create(path).map_err(|e| QlpError::file(path, e))?;
    write_rows(file, table.rows())
}

/// Serialize table rows as CSV into any writer.
pub fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for row in rows {
        out.serialize(row)?;
    }
    out.flush()?;
    Ok(())
}

/// Write a frame to a CSV file.
pub fn write_frame_csv(path: &Path, frame: &Frame) -> Result<()> {
    let file = File::create(path).map_err(|e| QlpError::file(path, e))?;
    write_frame(file, frame)
}

pub fn write_frame<W: Write>(writer: W, frame: &Frame) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header = vec![INDEX_HEADER.to_string()];
    header.extend(frame.column_names().iter().cloned());
    out.write_record(&header)?;

    let columns: Vec<&[f64]> = frame
        .column_names()
        .iter()
        .filter_map(|name| frame.column(name))
        .collect();
    for (i, label) in frame.index().iter().enumerate() {
        let mut record = vec![label.clone()];
        record.extend(columns.iter().map(|c| {
            let v = c[i];
            if v.is_nan() { String::new() } else { v.to_string() }
        }));
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// Write a run's results as pretty-printed JSON.
pub fn write_results_json(path: &Path, results: &ResultsFile) -> Result<()> {
    let file = File::create(path).map_err(|e| QlpError::file(path, e))?;
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}

/// Read a results file written by [`write_results_json`].
pub fn read_results_json(path: &Path) -> Result<ResultsFile> {
    let file = File::open(path).map_err(|e| QlpError::file(path, e))?;
    Ok(serde_json::from_reader(file)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CoefficientRow, ForecastRow};
    use crate::io::read_frame;

    fn coeff_row() -> CoefficientRow {
        CoefficientRow {
            regressor: "x".into(),
            tau: 0.25,
            horizon: 2,
            coeff: 0.75,
            tval: 3.0,
            pval: 0.004,
            lower_ci: 0.3,
            upper_ci: 1.2,
            pseudo_r2: 0.11,
            iterations: 31,
            converged: false,
        }
    }

    #[test]
    fn coefficient_csv_has_one_header_and_flat_rows() {
        let mut buf = Vec::new();
        write_rows(&mut buf, &[coeff_row()]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "regressor,tau,horizon,coeff,tval,pval,lower_ci,upper_ci,pseudo_r2,iterations,converged"
        );
        assert_eq!(lines.next().unwrap(), "x,0.25,2,0.75,3.0,0.004,0.3,1.2,0.11,31,false");
        assert!(lines.next().is_none());
    }

    #[test]
    fn forecast_csv_uses_prefixed_columns() {
        let row = ForecastRow {
            index: "s1".into(),
            tau: 0.5,
            horizon: 0,
            mean: 1.0,
            mean_se: 0.5,
            mean_ci_lower: 0.0,
            mean_ci_upper: 2.0,
            obs_ci_lower: -1.0,
            obs_ci_upper: 3.0,
        };
        let mut buf = Vec::new();
        write_rows(&mut buf, &[row]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("index,tau,horizon,conditional_quantile_mean,conditional_quantile_mean_se,"));
    }

    #[test]
    fn frame_csv_round_trips_missing_values() {
        let frame = Frame::new(
            vec!["2001-01-01".into(), "2001-02-01".into()],
            vec![
                ("y".into(), vec![1.25, f64::NAN]),
                ("x".into(), vec![-0.5, 2.0]),
            ],
        )
        .unwrap();
        let mut buf = Vec::new();
        write_frame(&mut buf, &frame).unwrap();
        let back = read_frame(buf.as_slice()).unwrap();

        assert_eq!(back.index(), frame.index());
        assert_eq!(back.column_names(), frame.column_names());
        assert_eq!(back.column("y").unwrap()[0], 1.25);
        assert!(back.column("y").unwrap()[1].is_nan());
        assert_eq!(back.column("x").unwrap(), &[-0.5, 2.0]);
    }

    #[test]
    fn results_json_round_trips() {
        let results = ResultsFile {
            tool: "qlp".into(),
            depvar: "y".into(),
            indvars: vec!["x".into()],
            horizons: vec![0, 2],
            quantiles: vec![0.25],
            alpha: 0.1,
            dropped_rows: 3,
            coefficients: vec![coeff_row()],
            forecasts: None,
        };
        let dir = std::env::temp_dir().join(format!("qlp-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("results.json");
        write_results_json(&path, &results).unwrap();
        let back = read_results_json(&path).unwrap();
        assert_eq!(back, results);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
