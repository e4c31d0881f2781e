//! ARIMA(1,0,1) without intercept, estimated by conditional sum of squares

use crate::error::{ForecastError, Result};
use call_math::optimize::{nelder_mead, NelderMeadConfig};

const COEFFICIENT_BOUND: f64 = 0.99;

/// ARIMA(1,0,1) model (one AR lag, no differencing, one MA lag)
#[derive(Debug, Clone)]
pub struct ArimaModel {
    /// Name of the model
    name: String,
    /// Iteration cap for the optimiser
    max_iter: usize,
}

/// Trained ARIMA(1,0,1) model
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedArimaModel {
    /// AR coefficient
    pub ar: f64,
    /// MA coefficient
    pub ma: f64,
    /// Innovation variance estimate
    pub sigma2: f64,
    /// Conditional sum of squared residuals at the optimum
    pub css: f64,
    /// Whether the optimiser met its tolerance
    pub converged: bool,
    /// Number of observations used
    pub observations: usize,
}

impl ArimaModel {
    pub fn new(max_iter: usize) -> Self {
        Self {
            name: "ARIMA(1,0,1)".to_string(),
            max_iter,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Estimate the AR and MA coefficients on `values`
    pub fn train(&self, values: &[f64]) -> Result<TrainedArimaModel> {
        if values.len() < 3 {
            return Err(ForecastError::InsufficientData(format!(
                "{} needs at least 3 observations, got {}",
                self.name,
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::DataError(
                "ARIMA input contains non-finite values".to_string(),
            ));
        }

        let bounds = [
            (-COEFFICIENT_BOUND, COEFFICIENT_BOUND),
            (-COEFFICIENT_BOUND, COEFFICIENT_BOUND),
        ];
        let start = [
            lag_one_autocorrelation(values).clamp(-0.9, 0.9),
            0.0,
        ];
        let config = NelderMeadConfig {
            max_iter: self.max_iter,
            ..NelderMeadConfig::default()
        };

        let minimum = nelder_mead(
            |p| conditional_sum_of_squares(values, p[0], p[1]),
            &start,
            Some(&bounds),
            config,
        )?;

        if !minimum.value.is_finite() {
            return Err(ForecastError::ForecastingError(format!(
                "{} estimation diverged",
                self.name
            )));
        }

        Ok(TrainedArimaModel {
            ar: minimum.point[0],
            ma: minimum.point[1],
            sigma2: minimum.value / (values.len() - 1) as f64,
            css: minimum.value,
            converged: minimum.converged,
            observations: values.len(),
        })
    }
}

impl TrainedArimaModel {
    /// One-step-ahead predictions for every position of `values`.
    ///
    /// Position 0 has no history and is predicted at the zero mean; every
    /// later position uses the actual previous value and residual.
    pub fn one_step_predictions(&self, values: &[f64]) -> Vec<f64> {
        let mut predictions = Vec::with_capacity(values.len());
        let mut residual = 0.0;
        let mut previous: Option<f64> = None;

        for &value in values {
            let prediction = match previous {
                Some(last) => self.ar * last + self.ma * residual,
                None => 0.0,
            };
            if previous.is_some() {
                residual = value - prediction;
            }
            predictions.push(prediction);
            previous = Some(value);
        }

        predictions
    }
}

fn conditional_sum_of_squares(values: &[f64], ar: f64, ma: f64) -> f64 {
    let mut residual = 0.0;
    let mut sum = 0.0;
    for window in values.windows(2) {
        residual = window[1] - ar * window[0] - ma * residual;
        sum += residual * residual;
    }
    sum
}

fn lag_one_autocorrelation(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    if variance <= f64::EPSILON {
        return 0.0;
    }
    let covariance: f64 = values
        .windows(2)
        .map(|w| (w[0] - mean) * (w[1] - mean))
        .sum();
    covariance / variance
}
