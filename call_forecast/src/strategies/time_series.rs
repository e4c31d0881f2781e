//! ARIMA(1,0,1) one-step-ahead predictions

use super::{fitted, require_rows, ForecastStrategy};
use crate::data::CallLog;
use crate::error::Result;
use crate::logging::ErrorLog;
use crate::models::arima::{ArimaModel, TrainedArimaModel};

const COMPONENT: &str = "time_series";
const NAME: &str = "TimeSeries";

#[derive(Debug, Clone)]
struct Fitted {
    model: TrainedArimaModel,
    history: Vec<f64>,
}

/// Predicts each test row from the actual value and residual just before it.
///
/// With a holdout attached, the coefficients are estimated on train followed
/// by the holdout, so the model has seen the values it is later scored on.
#[derive(Debug, Clone)]
pub struct TimeSeriesForecast {
    arima: ArimaModel,
    holdout: Option<CallLog>,
    log: ErrorLog,
    fitted: Option<Fitted>,
}

impl Default for TimeSeriesForecast {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl TimeSeriesForecast {
    pub fn new(max_iter: usize) -> Self {
        Self {
            arima: ArimaModel::new(max_iter),
            holdout: None,
            log: ErrorLog::default(),
            fitted: None,
        }
    }

    pub fn with_log(mut self, log: ErrorLog) -> Self {
        self.log = log;
        self
    }

    /// Also estimate on `holdout`, appended after the training rows
    pub fn with_holdout(mut self, holdout: CallLog) -> Self {
        self.holdout = Some(holdout);
        self
    }

    pub fn model(&self) -> Option<&TrainedArimaModel> {
        self.fitted.as_ref().map(|f| &f.model)
    }

    fn train(&self, train: &CallLog) -> Result<Fitted> {
        require_rows(train, 1, NAME)?;
        let history = train.intervals();
        let sample = match &self.holdout {
            Some(holdout) => train.concat(holdout).intervals(),
            None => history.clone(),
        };

        let model = self.arima.train(&sample)?;
        if !model.converged {
            self.log.debug(
                COMPONENT,
                "TimeSeriesForecast::fit",
                "Optimiser stopped at its iteration cap",
            );
        }
        Ok(Fitted { model, history })
    }

    fn forecast(fitted: &Fitted, test: &CallLog) -> Result<CallLog> {
        let mut series = fitted.history.clone();
        series.extend(test.intervals());

        let predictions = fitted.model.one_step_predictions(&series);
        test.with_intervals(&predictions[fitted.history.len()..])
    }
}

impl ForecastStrategy for TimeSeriesForecast {
    fn name(&self) -> &str {
        NAME
    }

    fn fit(&mut self, train: &CallLog) -> Result<()> {
        self.fitted = None;
        let fitted = self.log.trap(
            COMPONENT,
            "TimeSeriesForecast::fit",
            "Unable to train model",
            self.train(train),
        )?;
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, test: &CallLog) -> Result<CallLog> {
        let forecast = fitted(&self.fitted, NAME).and_then(|f| Self::forecast(f, test));
        self.log.trap(
            COMPONENT,
            "TimeSeriesForecast::predict",
            "Unable to predict forecast",
            forecast,
        )
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn describe(&self) -> String {
        let sample = if self.holdout.is_some() {
            "train+holdout"
        } else {
            "train"
        };
        match &self.fitted {
            Some(f) => format!(
                "{} {} on {}: ar={:.4}, ma={:.4}, sigma2={:.3}",
                NAME,
                self.arima.name(),
                sample,
                f.model.ar,
                f.model.ma,
                f.model.sigma2
            ),
            None => format!("{} {}: not fitted", NAME, self.arima.name()),
        }
    }
}

