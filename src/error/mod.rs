//! Crate-level error type for callers of the library

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for swingtrim operations
#[derive(Error, Debug)]
pub enum SwingTrimError {
    /// Input file not found or inaccessible
    #[error("Input file not found: {path}")]
    InputFileNotFound { path: String },

    /// Invalid time format
    #[error("Invalid time format: {time}. Expected HH:MM:SS.ms, MM:SS.ms, or seconds")]
    InvalidTimeFormat { time: String },

    /// Failure reported by the pipeline
    #[error(transparent)]
    Pipeline(#[from] DomainError),

    /// Output file write error
    #[error("Failed to write output file {path}: {message}")]
    OutputError { path: String, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON report could not be produced
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SwingTrimError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SwingTrimError::InputFileNotFound { .. }
            | SwingTrimError::InvalidTimeFormat { .. } => 2,
            SwingTrimError::Pipeline(DomainError::BadArgs(_))
            | SwingTrimError::Pipeline(DomainError::Config(_)) => 2,
            SwingTrimError::Pipeline(DomainError::Cancelled) => 130,
            _ => 1,
        }
    }
}

/// Result type alias for swingtrim operations
pub type SwingTrimResult<T> = std::result::Result<T, SwingTrimError>;
