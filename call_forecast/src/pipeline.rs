//! Fit, predict and score strategies against a train/test split

use crate::config::PredictorConfig;
use crate::data::CallLog;
use crate::error::Result;
use crate::logging::ErrorLog;
use crate::metrics::ValidationMetric;
use crate::strategies::{SeasonalForecast, StrategyKind};
use std::fmt;

const COMPONENT: &str = "pipeline";

/// Outcome of scoring one strategy on a test partition
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyReport {
    pub name: String,
    pub mse: f64,
    pub rmse: f64,
    /// Number of scored predictions
    pub points: usize,
}

impl fmt::Display for StrategyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<26} MSE: {:>12.4}  RMSE: {:>10.4}  ({} points)",
            self.name, self.mse, self.rmse, self.points
        )
    }
}

/// Fit `kind` on `train`, predict `test` and score the predictions
pub fn evaluate_strategy(
    kind: StrategyKind,
    config: &PredictorConfig,
    log: &ErrorLog,
    train: &CallLog,
    test: &CallLog,
) -> Result<StrategyReport> {
    let mut strategy = kind.build_for_split(config, log, test);
    strategy.fit(train)?;
    let predicted = strategy.predict(test)?;
    let scores = log.trap(
        COMPONENT,
        "evaluate_strategy",
        "Unable to score predictions",
        ValidationMetric::evaluate_logs(test, &predicted),
    )?;

    log.debug(COMPONENT, "evaluate_strategy", &strategy.describe());

    Ok(StrategyReport {
        name: strategy.name().to_string(),
        mse: scores.mse,
        rmse: scores.rmse,
        points: predicted.len(),
    })
}

/// Evaluate every trait-based strategy in turn.
///
/// A strategy that fails is logged, by its own component when fitting or
/// predicting and by this module when scoring, and left out of the returned
/// reports; the remaining ones still run.
pub fn compare_strategies(
    config: &PredictorConfig,
    log: &ErrorLog,
    train: &CallLog,
    test: &CallLog,
) -> Vec<StrategyReport> {
    StrategyKind::ALL
        .into_iter()
        .filter_map(|kind| evaluate_strategy(kind, config, log, train, test).ok())
        .collect()
}

/// Run the seasonal forecaster end to end over the full processed log
pub fn evaluate_seasonal(
    config: &PredictorConfig,
    log: &ErrorLog,
    full: &CallLog,
) -> Result<StrategyReport> {
    let mut seasonal = SeasonalForecast::new(config.seasonal).with_log(log.clone());
    seasonal.prepare(full)?;
    seasonal.fit()?;
    seasonal.predict()?;
    let scores = seasonal.score()?;

    let points = seasonal
        .windows()
        .map_or(0, |w| w.test.len().saturating_sub(1).min(config.seasonal.period));

    log.debug(COMPONENT, "evaluate_seasonal", &seasonal.describe());

    Ok(StrategyReport {
        name: "Seasonal".to_string(),
        mse: scores.mse,
        rmse: scores.rmse,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CallRecord, IntervalOfDay};
    use crate::logging::{LogLevel, MemorySink};
    use chrono::{Datelike, NaiveDate, NaiveTime};

    fn record(hour: u32, interval: f64) -> CallRecord {
        let date = NaiveDate::from_ymd_opt(2019, 3, 4).unwrap();
        let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap();
        CallRecord {
            call_arrival_date: date,
            call_arrival_time: date.and_time(time),
            dialer_start_time: date.and_time(time),
            dialer_call_arrival_time: 0.0,
            day_of_week: date.weekday(),
            call_difference_interval: interval,
            time_of_call: time.format("%H:%M:%S").to_string(),
            hour,
            minutes: 0,
            seconds: 0,
            year: 2019,
            month: 3,
            day: 4,
            dialer_start_time_minus_seconds: String::new(),
            interval_of_day: Some(IntervalOfDay::Morning),
        }
    }

    #[test]
    fn test_scoring_failure_is_logged() {
        let train = CallLog::new(vec![record(8, 10.0), record(9, 20.0)]);
        let sink = MemorySink::new();
        let log = ErrorLog::new(sink.clone());

        let result = evaluate_strategy(
            StrategyKind::SimpleAverage,
            &PredictorConfig::default(),
            &log,
            &train,
            &CallLog::default(),
        );
        assert!(result.is_err());

        let errors = sink.entries_at(LogLevel::Error);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].component, "pipeline");
        assert_eq!(errors[0].message, "Unable to score predictions");

        let reports =
            compare_strategies(&PredictorConfig::default(), &log, &train, &CallLog::default());
        assert!(reports.is_empty());
    }

    #[test]
    fn test_report_display() {
        let report = StrategyReport {
            name: "SimpleAverage".to_string(),
            mse: 4.0,
            rmse: 2.0,
            points: 3,
        };
        let text = report.to_string();
        assert!(text.starts_with("SimpleAverage"));
        assert!(text.contains("RMSE:     2.0000"));
        assert!(text.ends_with("(3 points)"));
    }
}
