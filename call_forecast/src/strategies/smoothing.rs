//! Simple exponential smoothing with a fixed level

use super::{fitted, require_rows, ForecastStrategy};
use crate::data::CallLog;
use crate::error::Result;
use crate::logging::ErrorLog;
use call_math::smoothing::{SimpleExponentialSmoothing, SmoothedLevel};

const COMPONENT: &str = "smoothing";
const NAME: &str = "Smoothing";

/// Holds the last smoothed level flat over the whole test horizon
#[derive(Debug, Clone)]
pub struct SmoothingForecast {
    level: f64,
    log: ErrorLog,
    state: Option<SmoothedLevel>,
}

impl Default for SmoothingForecast {
    fn default() -> Self {
        Self::new(0.6)
    }
}

impl SmoothingForecast {
    /// Create a forecaster with smoothing level `level`; the level is not optimised
    pub fn new(level: f64) -> Self {
        Self {
            level,
            log: ErrorLog::default(),
            state: None,
        }
    }

    pub fn with_log(mut self, log: ErrorLog) -> Self {
        self.log = log;
        self
    }

    pub fn state(&self) -> Option<&SmoothedLevel> {
        self.state.as_ref()
    }

    fn train(&self, train: &CallLog) -> Result<SmoothedLevel> {
        require_rows(train, 1, NAME)?;
        let model = SimpleExponentialSmoothing::new(self.level)?;
        Ok(model.fit(&train.intervals())?)
    }
}

impl ForecastStrategy for SmoothingForecast {
    fn name(&self) -> &str {
        NAME
    }

    fn fit(&mut self, train: &CallLog) -> Result<()> {
        self.state = None;
        let state = self.log.trap(
            COMPONENT,
            "SmoothingForecast::fit",
            "Unable to train model",
            self.train(train),
        )?;
        self.state = Some(state);
        Ok(())
    }

    fn predict(&self, test: &CallLog) -> Result<CallLog> {
        let forecast = fitted(&self.state, NAME)
            .and_then(|state| test.with_intervals(&state.forecast(test.len())));
        self.log.trap(
            COMPONENT,
            "SmoothingForecast::predict",
            "Unable to predict forecast",
            forecast,
        )
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    fn describe(&self) -> String {
        match &self.state {
            Some(state) => format!(
                "{} (level={}): final level {:.3}s",
                NAME, self.level, state.level
            ),
            None => format!("{} (level={}): not fitted", NAME, self.level),
        }
    }
}
