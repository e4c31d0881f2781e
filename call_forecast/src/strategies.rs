//! Interchangeable forecasting strategies
//!
//! Every strategy learns from a training [`CallLog`] and fills in
//! `CallDifferenceInterval` for a test log with the same layout.

use crate::config::PredictorConfig;
use crate::data::CallLog;
use crate::error::{ForecastError, Result};
use crate::logging::ErrorLog;
use std::fmt;
use std::str::FromStr;

pub mod double_smoothing;
pub mod interval_average;
pub mod seasonal;
pub mod sequence;
pub mod simple_average;
pub mod smoothing;
pub mod time_series;

pub use double_smoothing::DoubleSmoothingForecast;
pub use interval_average::{HalfdayIntervalAverageForecast, HourlyIntervalAverageForecast};
pub use seasonal::SeasonalForecast;
pub use sequence::SequenceForecast;
pub use simple_average::SimpleAverageForecast;
pub use smoothing::SmoothingForecast;
pub use time_series::TimeSeriesForecast;

/// Common interface for call interval forecasters
pub trait ForecastStrategy: fmt::Debug {
    /// Display name of the strategy
    fn name(&self) -> &str;

    /// Learn the model parameters from a training partition
    fn fit(&mut self, train: &CallLog) -> Result<()>;

    /// Copy of `test` with `CallDifferenceInterval` replaced by forecasts
    fn predict(&self, test: &CallLog) -> Result<CallLog>;

    /// Whether `fit` has succeeded
    fn is_fitted(&self) -> bool;

    /// Short text summary of the fitted parameters
    fn describe(&self) -> String;
}

/// Strategies that share the fit/predict contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    SimpleAverage,
    Smoothing,
    DoubleSmoothing,
    HourlyIntervalAverage,
    HalfdayIntervalAverage,
    TimeSeries,
    SequenceModel,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::SimpleAverage,
        StrategyKind::Smoothing,
        StrategyKind::DoubleSmoothing,
        StrategyKind::HourlyIntervalAverage,
        StrategyKind::HalfdayIntervalAverage,
        StrategyKind::TimeSeries,
        StrategyKind::SequenceModel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::SimpleAverage => "simple_average",
            StrategyKind::Smoothing => "smoothing",
            StrategyKind::DoubleSmoothing => "double_smoothing",
            StrategyKind::HourlyIntervalAverage => "hourly_interval_average",
            StrategyKind::HalfdayIntervalAverage => "halfday_interval_average",
            StrategyKind::TimeSeries => "time_series",
            StrategyKind::SequenceModel => "sequence_model",
        }
    }

    /// Build an unfitted strategy
    pub fn build(self, config: &PredictorConfig, log: &ErrorLog) -> Box<dyn ForecastStrategy> {
        let log = log.clone();
        match self {
            StrategyKind::SimpleAverage => Box::new(SimpleAverageForecast::new().with_log(log)),
            StrategyKind::Smoothing => {
                Box::new(SmoothingForecast::new(config.smoothing.level).with_log(log))
            }
            StrategyKind::DoubleSmoothing => Box::new(
                DoubleSmoothingForecast::new(
                    config.double_smoothing.level,
                    config.double_smoothing.slope,
                )
                .with_log(log),
            ),
            StrategyKind::HourlyIntervalAverage => {
                Box::new(HourlyIntervalAverageForecast::new().with_log(log))
            }
            StrategyKind::HalfdayIntervalAverage => {
                Box::new(HalfdayIntervalAverageForecast::new().with_log(log))
            }
            StrategyKind::TimeSeries => {
                Box::new(TimeSeriesForecast::new(config.time_series.max_iter).with_log(log))
            }
            StrategyKind::SequenceModel => {
                Box::new(SequenceForecast::new(config.sequence).with_log(log))
            }
        }
    }

    /// Build an unfitted strategy for a known train/test split.
    ///
    /// Identical to [`StrategyKind::build`] except for the time series
    /// strategy, which also estimates on `test` when
    /// `time_series.fit_on_holdout` is set.
    pub fn build_for_split(
        self,
        config: &PredictorConfig,
        log: &ErrorLog,
        test: &CallLog,
    ) -> Box<dyn ForecastStrategy> {
        match self {
            StrategyKind::TimeSeries if config.time_series.fit_on_holdout => Box::new(
                TimeSeriesForecast::new(config.time_series.max_iter)
                    .with_log(log.clone())
                    .with_holdout(test.clone()),
            ),
            kind => kind.build(config, log),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| ForecastError::InvalidParameter(format!("Unknown strategy '{}'", s)))
    }
}

/// Fail with `NotFitted` unless `model` is present
pub(crate) fn fitted<'a, T>(model: &'a Option<T>, name: &str) -> Result<&'a T> {
    model
        .as_ref()
        .ok_or_else(|| ForecastError::NotFitted(name.to_string()))
}

/// Fail unless `train` has at least `min` rows
pub(crate) fn require_rows(train: &CallLog, min: usize, name: &str) -> Result<()> {
    if train.len() < min {
        return Err(ForecastError::InsufficientData(format!(
            "{} needs at least {} training rows, got {}",
            name,
            min,
            train.len()
        )));
    }
    Ok(())
}
