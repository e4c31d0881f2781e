//! Grand mean of the training intervals

use super::{fitted, require_rows, ForecastStrategy};
use crate::data::CallLog;
use crate::error::{ForecastError, Result};
use crate::logging::ErrorLog;
use statrs::statistics::Statistics;

const COMPONENT: &str = "simple_average";
const NAME: &str = "SimpleAverage";

/// Predicts the training mean for every test row
#[derive(Debug, Clone, Default)]
pub struct SimpleAverageForecast {
    log: ErrorLog,
    mean: Option<f64>,
}

impl SimpleAverageForecast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(mut self, log: ErrorLog) -> Self {
        self.log = log;
        self
    }

    /// Fitted mean
    pub fn mean(&self) -> Option<f64> {
        self.mean
    }

    fn train(train: &CallLog) -> Result<f64> {
        require_rows(train, 1, NAME)?;
        let mean = train.intervals().mean();
        if !mean.is_finite() {
            return Err(ForecastError::DataError(
                "Training intervals contain non-finite values".to_string(),
            ));
        }
        Ok(mean)
    }
}

impl ForecastStrategy for SimpleAverageForecast {
    fn name(&self) -> &str {
        NAME
    }

    fn fit(&mut self, train: &CallLog) -> Result<()> {
        self.mean = None;
        let mean = self.log.trap(
            COMPONENT,
            "SimpleAverageForecast::fit",
            "Unable to train model",
            Self::train(train),
        )?;
        self.mean = Some(mean);
        Ok(())
    }

    fn predict(&self, test: &CallLog) -> Result<CallLog> {
        let forecast = fitted(&self.mean, NAME)
            .and_then(|&mean| test.with_intervals(&vec![mean; test.len()]));
        self.log.trap(
            COMPONENT,
            "SimpleAverageForecast::predict",
            "Unable to predict forecast",
            forecast,
        )
    }

    fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    fn describe(&self) -> String {
        match self.mean {
            Some(mean) => format!("{}: mean interval {:.3}s", NAME, mean),
            None => format!("{}: not fitted", NAME),
        }
    }
}
