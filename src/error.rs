//! Error handling for RDB1 import operations.
//!
//! Only structural problems are fatal. Recoverable conditions met while
//! parsing (quoting artifacts, non-numeric value cells, unknown timezone
//! codes) are reported as [`crate::models::Diagnostic`] values on the result.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RdbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Tab-delimited parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed RDB header: {reason}")]
    MalformedHeader { reason: String },

    #[error("Unknown timezone '{name}': expected an IANA timezone name such as 'America/New_York'")]
    InvalidTimezone { name: String },

    #[error("Column '{column}' has {found} values but the table has {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Failed to retrieve '{location}': {reason}")]
    Fetch { location: String, reason: String },

    #[error("Processing failed for file: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },

    #[error("No RDB files matched input: {pattern}")]
    NoInputFiles { pattern: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl RdbError {
    pub(crate) fn malformed_header(reason: impl Into<String>) -> Self {
        Self::MalformedHeader {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RdbError>;
