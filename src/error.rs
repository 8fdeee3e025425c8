//! Error types shared by the pipeline stages and the CLI.
//!
//! Every failure carries the exit code the `qlp` binary reports for it:
//!
//! - `2`: invalid input (bad argument, missing column, out-of-range level)
//! - `3`: a quantile regression failed for a (horizon, τ) pair
//! - `4`: I/O or serialization failure

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::solver::SolverError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, QlpError>;

#[derive(Debug, Error)]
pub enum QlpError {
    /// Malformed or inconsistent input, raised before anything is computed.
    #[error("invalid `{argument}`: {message}")]
    Validation { argument: String, message: String },

    /// The solver failed fatally for one (horizon, τ) pair; the batch is aborted.
    #[error("quantile regression failed at horizon {horizon}, tau {tau}: {source}")]
    Fit {
        horizon: usize,
        tau: f64,
        #[source]
        source: SolverError,
    },

    /// A file could not be opened or created.
    #[error("cannot access '{}': {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QlpError {
    pub fn validation(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            argument: argument.into(),
            message: message.into(),
        }
    }

    pub fn file(path: &Path, source: std::io::Error) -> Self {
        Self::File {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            QlpError::Validation { .. } => 2,
            QlpError::Fit { .. } => 3,
            QlpError::File { .. } | QlpError::Io(_) | QlpError::Csv(_) | QlpError::Json(_) => 4,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, QlpError::Validation { .. })
    }
}
