//! Error types for the innovation-focus pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input file '{}' not found. {hint}", path.display())]
    MissingInput { path: PathBuf, hint: String },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Insufficient data: need at least {needed} rows, got {actual}")]
    InsufficientData { needed: usize, actual: usize },
}

impl PipelineError {
    /// Build a missing-input error with a remediation hint
    pub fn missing_input(path: impl Into<PathBuf>, hint: impl Into<String>) -> Self {
        PipelineError::MissingInput {
            path: path.into(),
            hint: hint.into(),
        }
    }

    /// Whether this error means a stage should be skipped rather than aborted
    pub fn is_missing_input(&self) -> bool {
        matches!(self, PipelineError::MissingInput { .. })
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        PipelineError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_missing_input_display_includes_hint() {
        let err = PipelineError::missing_input("raw.csv", "Create it first.");
        assert_eq!(err.to_string(), "Input file 'raw.csv' not found. Create it first.");
        assert!(err.is_missing_input());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PipelineError = io_err.into();
        assert!(matches!(err, PipelineError::IoError(_)));
        assert!(!err.is_missing_input());
    }
}
