//! Error types for the call_forecast crate

use call_math::MathError;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for the call_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The input file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error while writing CSV output
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error in configuration content or loading
    #[error("Config error: {0}")]
    ConfigError(String),

    /// A required column is absent from the input
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A required cell is empty
    #[error("Missing value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    /// A cell could not be parsed into the expected type
    #[error("Cannot parse '{value}' in column '{column}' at row {row}")]
    ParseError {
        column: String,
        row: usize,
        value: String,
    },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Not enough rows for the requested operation
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Two frames or sequences disagree in length
    #[error("Shape mismatch: expected {expected} rows, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// `predict` was called before a successful `fit`
    #[error("Model has not been fitted: {0}")]
    NotFitted(String),

    /// Error related to forecasting operations
    #[error("Forecasting error: {0}")]
    ForecastingError(String),

    /// Error from the numeric kernels
    #[error("Math error: {0}")]
    MathError(#[from] MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<polars::prelude::PolarsError> for ForecastError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
        let error = ForecastError::from(io_error);
        assert!(matches!(error, ForecastError::IoError(_)));
        assert!(error.to_string().contains("permission denied"));

        let math_error = MathError::InvalidInput("alpha".to_string());
        assert!(matches!(
            ForecastError::from(math_error),
            ForecastError::MathError(_)
        ));

        let json_error = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(
            ForecastError::from(json_error),
            ForecastError::ConfigError(_)
        ));
    }

    #[test]
    fn test_error_display() {
        let error = ForecastError::ParseError {
            column: "CallArrivalDate".to_string(),
            row: 3,
            value: "13/45/2019".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("CallArrivalDate"));
        assert!(message.contains("13/45/2019"));

        let error = ForecastError::ShapeMismatch {
            expected: 4,
            actual: 2,
        };
        assert_eq!(error.to_string(), "Shape mismatch: expected 4 rows, got 2");

        let error = ForecastError::FileNotFound(PathBuf::from("calls.csv"));
        assert_eq!(error.to_string(), "File not found: calls.csv");
    }
}
