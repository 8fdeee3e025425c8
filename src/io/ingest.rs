//! CSV ingest of numeric frames.
//!
//! Layout:
//! - the header row names the columns; the first column is the row index
//!   (dates, integers or any label) and its header is ignored
//! - every other cell must parse as `f64`; empty cells, `NA`, `NaN` and
//!   `null` (any case) are missing values
//!
//! Malformed input is rejected as a whole (exit code 2) with the offending
//! line and column; nothing is silently skipped.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::domain::Frame;
use crate::error::{QlpError, Result};

/// Load a frame from a CSV file.
pub fn read_frame_csv(path: &Path) -> Result<Frame> {
    let file = File::open(path).map_err(|e| QlpError::file(path, e))?;
    let frame = read_frame(file).map_err(|e| match e {
        QlpError::Validation { argument, message } => QlpError::Validation {
            argument,
            message: format!("{}: {message}", path.display()),
        },
        other => other,
    })?;
    debug!(
        path = %path.display(),
        rows = frame.n_rows(),
        columns = frame.n_cols(),
        "loaded frame"
    );
    Ok(frame)
}

/// Load a frame from any CSV source.
pub fn read_frame<R: Read>(source: R) -> Result<Frame> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let names = column_names(&headers)?;

    let mut index = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

    for (idx, result) in reader.records().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        if record.len() != headers.len() {
            return Err(QlpError::validation(
                "data",
                format!(
                    "line {line} has {} fields, expected {}",
                    record.len(),
                    headers.len()
                ),
            ));
        }

        index.push(record.get(0).unwrap_or_default().to_string());
        for (j, name) in names.iter().enumerate() {
            let cell = record.get(j + 1).unwrap_or_default();
            let value = parse_cell(cell).ok_or_else(|| {
                QlpError::validation(
                    "data",
                    format!("line {line}, column `{name}`: `{cell}` is not a number"),
                )
            })?;
            columns[j].push(value);
        }
    }

    Frame::new(index, names.into_iter().zip(columns).collect())
}

fn column_names(headers: &StringRecord) -> Result<Vec<String>> {
    if headers.len() < 2 {
        return Err(QlpError::validation(
            "data",
            "expected an index column followed by at least one data column",
        ));
    }
    headers
        .iter()
        .skip(1)
        .enumerate()
        .map(|(j, name)| {
            let name = normalize_header_name(name);
            if name.is_empty() {
                Err(QlpError::validation(
                    "data",
                    format!("column {} has an empty header", j + 2),
                ))
            } else {
                Ok(name)
            }
        })
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn parse_cell(cell: &str) -> Option<f64> {
    if cell.is_empty() || ["na", "nan", "null"].iter().any(|m| cell.eq_ignore_ascii_case(m)) {
        return Some(f64::NAN);
    }
    cell.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_index_columns_and_missing_markers() {
        let csv = "\u{feff}date,y,x\n2020-01-01,1.5,NA\n2020-02-01,,2\n2020-03-01,3,nan\n";
        let frame = read_frame(csv.as_bytes()).unwrap();

        assert_eq!(frame.index(), &["2020-01-01", "2020-02-01", "2020-03-01"]);
        assert_eq!(frame.column_names(), &["y", "x"]);
        let y = frame.column("y").unwrap();
        assert_eq!(y[0], 1.5);
        assert!(y[1].is_nan());
        let x = frame.column("x").unwrap();
        assert!(x[0].is_nan() && x[2].is_nan());
        assert_eq!(x[1], 2.0);
    }

    #[test]
    fn bad_cells_name_line_and_column() {
        let csv = "t,y\n0,1\n1,abc\n";
        let err = read_frame(csv.as_bytes()).unwrap_err();
        assert!(err.is_validation());
        let msg = err.to_string();
        assert!(msg.contains("line 3") && msg.contains("`y`"), "{msg}");
    }

    #[test]
    fn ragged_rows_and_bad_headers_are_rejected() {
        assert!(read_frame("t,y\n0,1,2\n".as_bytes()).unwrap_err().is_validation());
        assert!(read_frame("t\n0\n".as_bytes()).unwrap_err().is_validation());
        assert!(read_frame("t,y,y\n0,1,2\n".as_bytes()).unwrap_err().is_validation());
        assert!(read_frame("t,,y\n0,1,2\n".as_bytes()).unwrap_err().is_validation());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_frame_csv(Path::new("definitely/not/here.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }
}
