//! Scoring of predicted intervals against actual ones

use crate::data::CallLog;
use crate::error::Result;
use call_math::metrics;
use std::fmt;

/// Error metrics for forecast evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
}

impl fmt::Display for ErrorMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MSE: {:.4}, RMSE: {:.4}, MAE: {:.4}",
            self.mse, self.rmse, self.mae
        )
    }
}

/// Error metrics between actual and predicted sequences.
///
/// Sequences of different lengths, and empty ones, are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationMetric;

impl ValidationMetric {
    pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
        Ok(metrics::mean_squared_error(actual, predicted)?)
    }

    pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
        Ok(metrics::root_mean_squared_error(actual, predicted)?)
    }

    pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
        Ok(metrics::mean_absolute_error(actual, predicted)?)
    }

    /// Every metric over plain sequences
    pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<ErrorMetrics> {
        Ok(ErrorMetrics {
            mae: Self::mean_absolute_error(actual, predicted)?,
            mse: Self::mean_squared_error(actual, predicted)?,
            rmse: Self::root_mean_squared_error(actual, predicted)?,
        })
    }

    /// Every metric over the `CallDifferenceInterval` columns of two logs
    pub fn evaluate_logs(actual: &CallLog, predicted: &CallLog) -> Result<ErrorMetrics> {
        Self::evaluate(&actual.intervals(), &predicted.intervals())
    }
}
