//! Holt's linear trend method

use super::{fitted, require_rows, ForecastStrategy};
use crate::data::CallLog;
use crate::error::Result;
use crate::logging::ErrorLog;
use call_math::smoothing::{HoltLinear, HoltState};

const COMPONENT: &str = "double_smoothing";
const NAME: &str = "DoubleSmoothing";

/// Extrapolates the fitted level and trend across the test horizon.
///
/// With the default slope of 1e-7 the trend barely moves from its initial
/// value.
#[derive(Debug, Clone)]
pub struct DoubleSmoothingForecast {
    level: f64,
    slope: f64,
    log: ErrorLog,
    state: Option<HoltState>,
}

impl Default for DoubleSmoothingForecast {
    fn default() -> Self {
        Self::new(0.365, 0.0000001)
    }
}

impl DoubleSmoothingForecast {
    pub fn new(level: f64, slope: f64) -> Self {
        Self {
            level,
            slope,
            log: ErrorLog::default(),
            state: None,
        }
    }

    pub fn with_log(mut self, log: ErrorLog) -> Self {
        self.log = log;
        self
    }

    pub fn state(&self) -> Option<&HoltState> {
        self.state.as_ref()
    }

    fn train(&self, train: &CallLog) -> Result<HoltState> {
        require_rows(train, 2, NAME)?;
        let model = HoltLinear::new(self.level, self.slope)?;
        Ok(model.fit(&train.intervals())?)
    }
}

impl ForecastStrategy for DoubleSmoothingForecast {
    fn name(&self) -> &str {
        NAME
    }

    fn fit(&mut self, train: &CallLog) -> Result<()> {
        self.state = None;
        let state = self.log.trap(
            COMPONENT,
            "DoubleSmoothingForecast::fit",
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
            "DoubleSmoothingForecast::predict",
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
                "{} (level={}, slope={}): level {:.3}s, trend {:.6}s/step",
                NAME, self.level, self.slope, state.level, state.trend
            ),
            None => format!("{} (level={}, slope={}): not fitted", NAME, self.level, self.slope),
        }
    }
}
