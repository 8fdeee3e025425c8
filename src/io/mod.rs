//! Input/output helpers.
//!
//! - CSV ingest of frames (`ingest`)
//! - CSV/JSON exports of result tables and frames (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
