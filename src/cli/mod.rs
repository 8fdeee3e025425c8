//! Command-line parsing for the quantile local projection tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the estimation code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_ALPHA, DEFAULT_QUANTILES};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "qlp", version, about = "Quantile local projections")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit one quantile regression per (horizon, quantile) and print the coefficient table.
    Fit(FitArgs),
    /// Fit, then forecast conditional quantiles for the scenarios of a conditioning CSV.
    Project(ProjectArgs),
    /// Write a synthetic dataset (monthly index, columns y, x, z) to CSV.
    Simulate(SimulateArgs),
}

/// Model and estimation options shared by `fit` and `project`.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Input CSV: first column is the row index, the rest are numeric series.
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    /// Dependent variable.
    #[arg(long)]
    pub depvar: String,

    /// Independent variables (comma separated).
    #[arg(long, value_delimiter = ',', required = true, num_args = 1..)]
    pub indvars: Vec<String>,

    /// Forecast horizons in rows (comma separated, non-negative).
    #[arg(long, value_delimiter = ',', required = true, num_args = 1..)]
    pub horizons: Vec<usize>,

    /// Quantile levels in (0, 1) (comma separated).
    #[arg(long, value_delimiter = ',', num_args = 1.., default_values_t = DEFAULT_QUANTILES.to_vec())]
    pub quantiles: Vec<f64>,

    /// Significance level; intervals cover 1 - alpha.
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    pub alpha: f64,

    /// Maximum IRLS iterations per regression.
    #[arg(long, default_value_t = 1000)]
    pub max_iter: usize,

    /// Convergence tolerance on the largest coefficient change.
    #[arg(long, default_value_t = 1e-5)]
    pub p_tol: f64,

    /// Fail the run when a regression hits the iteration cap.
    #[arg(long)]
    pub strict_convergence: bool,

    /// Fit regressions one after another instead of in parallel.
    #[arg(long)]
    pub sequential: bool,

    /// Export the main table to CSV (coefficients for `fit`, forecasts for `project`).
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the whole run (setup, coefficients, forecasts) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

/// Options for `qlp project`.
#[derive(Debug, Args, Clone)]
pub struct ProjectArgs {
    #[command(flatten)]
    pub fit: FitArgs,

    /// Conditioning CSV: one scenario per row, columns include every independent variable.
    #[arg(long, value_name = "CSV")]
    pub cond: PathBuf,

    /// Also export the coefficient table to CSV.
    #[arg(long = "export-coefficients", value_name = "CSV")]
    pub export_coefficients: Option<PathBuf>,
}

/// Options for `qlp simulate`.
#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Number of monthly observations.
    #[arg(long, default_value_t = 240)]
    pub rows: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Probability of blanking each y/x cell.
    #[arg(long, default_value_t = 0.0)]
    pub missing_rate: f64,

    /// Output CSV.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,
}
