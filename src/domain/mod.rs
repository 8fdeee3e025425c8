//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the in-memory dataset (`Frame`)
//! - the long-format output tables (`CoefficientTable`, `ForecastTable`)
//! - the run configuration derived from CLI flags (`RunConfig`)

pub mod frame;
pub mod types;

pub use frame::*;
pub use types::*;
