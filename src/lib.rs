//! `qlp` library crate: quantile local projections.
//!
//! The binary (`qlp`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the three stages (build, fit, project) are usable from other Rust code
//!
//! ```no_run
//! use qlp::{Frame, QuantileProj};
//!
//! # fn demo(data: &Frame, scenarios: &Frame) -> qlp::Result<()> {
//! let proj = QuantileProj::new("y", &["x"], data, &[0, 1, 4])?;
//! let fit = proj.fit(&[0.1, 0.5, 0.9], 0.1)?;
//! let forecasts = fit.project(scenarios)?;
//! println!("{} forecast rows", forecasts.table().len());
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod project;
pub mod report;
pub mod solver;

pub use domain::{CoefficientRow, CoefficientTable, ForecastRow, ForecastTable, Frame};
pub use error::{QlpError, Result};
pub use fit::{FitOptions, FitRecord, QuantileFit, QuantileProj};
pub use project::QuantileProjection;
pub use solver::{IrlsSolver, QuantRegResults, QuantileSolver, SolverError, SolverOptions};
