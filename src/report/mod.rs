//! Reporting utilities: plain-text tables and run summaries for the terminal.

pub mod format;

pub use format::*;
