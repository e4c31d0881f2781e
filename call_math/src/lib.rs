//! # Call Math
//!
//! Numeric kernels used by the call arrival forecasting strategies.
//! This crate has no knowledge of call logs or data frames; every function
//! works on plain `f64` slices.

use thiserror::Error;

pub mod boxcox;
pub mod metrics;
pub mod optimize;
pub mod smoothing;

/// Errors that can occur in forecasting calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Check that a smoothing coefficient lies in the closed unit interval
pub(crate) fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) || value.is_nan() {
        return Err(MathError::InvalidInput(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )));
    }
    Ok(())
}
