//! Weekly seasonal forecasting on a per-minute timeline
//!
//! The call log is collapsed to one median row per minute key and joined
//! onto a complete minute index, so minutes without calls still get a row.
//! An additive Holt-Winters model without trend is then fitted with a season
//! of one week and always forecasts exactly one season ahead.
//!
//! Lifecycle: [`SeasonalForecast::prepare`] then [`SeasonalForecast::fit`]
//! then [`SeasonalForecast::predict`].

use crate::config::SeasonalConfig;
use crate::data::CallLog;
use crate::error::{ForecastError, Result};
use crate::features::alignment_key;
use crate::logging::ErrorLog;
use crate::metrics::{ErrorMetrics, ValidationMetric};
use call_math::boxcox::{boxcox, boxcox_lambda, inv_boxcox};
use call_math::smoothing::{AdditiveHoltWinters, SeasonalState};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use statrs::statistics::{Data, Median};
use std::collections::HashMap;

const COMPONENT: &str = "seasonal";

/// Where the forecaster is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonalStage {
    Constructed,
    Prepared,
    Fitted,
    Predicted,
}

/// One row per minute of a window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedFrame {
    pub timestamps: Vec<NaiveDateTime>,
    /// `YYYY-MM-DD HH:MM` key of each minute
    pub keys: Vec<String>,
    /// Median interval of the minute, or the sentinel
    pub intervals: Vec<f64>,
    /// Median dialer arrival of the minute, forward filled, then the sentinel
    pub arrivals: Vec<f64>,
    /// Whether at least one call fell in the minute
    pub observed: Vec<bool>,
}

impl AlignedFrame {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Train and test windows built from the week boundaries
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalWindows {
    /// Dates from the first call date, every 7 days, up to the last call date
    pub weeks: Vec<NaiveDate>,
    /// `[weeks[0], weeks[n]]`, both ends included
    pub train: AlignedFrame,
    /// `[weeks[n], weeks[n + 1]]`, both ends included
    pub test: AlignedFrame,
}

#[derive(Debug, Clone)]
struct FittedSeasonal {
    state: SeasonalState,
    lambda: Option<f64>,
}

/// Median interval and arrival for one minute key
#[derive(Debug, Clone, Copy)]
struct MinuteMedian {
    interval: f64,
    arrival: f64,
}

/// Seasonal Holt-Winters forecaster
#[derive(Debug, Clone)]
pub struct SeasonalForecast {
    config: SeasonalConfig,
    log: ErrorLog,
    windows: Option<SeasonalWindows>,
    model: Option<FittedSeasonal>,
    forecast: Option<Vec<f64>>,
}

impl Default for SeasonalForecast {
    fn default() -> Self {
        Self::new(SeasonalConfig::default())
    }
}

impl SeasonalForecast {
    pub fn new(config: SeasonalConfig) -> Self {
        Self {
            config,
            log: ErrorLog::default(),
            windows: None,
            model: None,
            forecast: None,
        }
    }

    pub fn with_log(mut self, log: ErrorLog) -> Self {
        self.log = log;
        self
    }

    pub fn stage(&self) -> SeasonalStage {
        if self.forecast.is_some() {
            SeasonalStage::Predicted
        } else if self.model.is_some() {
            SeasonalStage::Fitted
        } else if self.windows.is_some() {
            SeasonalStage::Prepared
        } else {
            SeasonalStage::Constructed
        }
    }

    pub fn windows(&self) -> Option<&SeasonalWindows> {
        self.windows.as_ref()
    }

    /// Box-Cox lambda used by the fitted model
    pub fn lambda(&self) -> Option<f64> {
        self.model.as_ref().and_then(|m| m.lambda)
    }

    /// Build the train and test windows from the full processed log
    pub fn prepare(&mut self, full: &CallLog) -> Result<()> {
        let windows = self.log.trap(
            COMPONENT,
            "SeasonalForecast::prepare",
            "Unable to prepare train-test split",
            build_windows(full, &self.config),
        )?;

        self.log.info(
            COMPONENT,
            "SeasonalForecast::prepare",
            &format!(
                "{} train minutes, {} test minutes",
                windows.train.len(),
                windows.test.len()
            ),
        );
        self.windows = Some(windows);
        self.model = None;
        self.forecast = None;
        Ok(())
    }

    /// Fit Holt-Winters on the train window
    pub fn fit(&mut self) -> Result<()> {
        let fitted = match &self.windows {
            Some(windows) => fit_model(&windows.train.intervals, &self.config),
            None => Err(ForecastError::NotFitted(
                "SeasonalForecast has no prepared windows".to_string(),
            )),
        };
        let fitted = self.log.trap(
            COMPONENT,
            "SeasonalForecast::fit",
            "Unable to train model",
            fitted,
        )?;

        self.model = Some(fitted);
        self.forecast = None;
        Ok(())
    }

    /// Forecast one full season past the end of the train window.
    ///
    /// The horizon is the seasonal period whatever the size of the test
    /// window.
    pub fn predict(&mut self) -> Result<Vec<f64>> {
        let forecast = match &self.model {
            Some(model) => Ok(forecast_season(model, self.config.period)),
            None => Err(ForecastError::NotFitted("SeasonalForecast".to_string())),
        };
        let forecast = self.log.trap(
            COMPONENT,
            "SeasonalForecast::predict",
            "Unable to predict forecast",
            forecast,
        )?;

        self.forecast = Some(forecast.clone());
        Ok(forecast)
    }

    /// Timestamps of the forecast points, one minute apart after the train window
    pub fn forecast_index(&self) -> Option<Vec<NaiveDateTime>> {
        let end = *self.windows.as_ref()?.train.timestamps.last()?;
        Some(
            (1..=self.config.period as i64)
                .map(|k| end + Duration::minutes(k))
                .collect(),
        )
    }

    /// Score the forecast against the test window minutes it covers
    pub fn score(&self) -> Result<ErrorMetrics> {
        let (Some(windows), Some(forecast)) = (&self.windows, &self.forecast) else {
            return Err(ForecastError::NotFitted(
                "SeasonalForecast has no forecast to score".to_string(),
            ));
        };

        // The test window starts on the last train minute
        let actual = windows.test.intervals.get(1..).unwrap_or(&[]);
        let points = actual.len().min(forecast.len());
        ValidationMetric::evaluate(&actual[..points], &forecast[..points])
    }

    pub fn describe(&self) -> String {
        let c = &self.config;
        let head = format!(
            "Seasonal (period={}, level={}, seasonal={}, train weeks={})",
            c.period, c.level, c.seasonal, c.num_train_weeks
        );
        match (self.stage(), self.lambda()) {
            (SeasonalStage::Constructed, _) => format!("{}: not prepared", head),
            (SeasonalStage::Prepared, _) => format!("{}: prepared", head),
            (_, Some(lambda)) => format!("{}: fitted, Box-Cox lambda {:.3}", head, lambda),
            (_, None) => format!("{}: fitted", head),
        }
    }
}

/// Dates from `first` in steps of 7 days, not past `last`
pub fn week_boundaries(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut weeks = Vec::new();
    let mut current = first;
    while current <= last {
        weeks.push(current);
        current += Duration::days(7);
    }
    weeks
}

/// Every minute from `start` to `end`, both included
pub fn minute_index(start: NaiveDateTime, end: NaiveDateTime) -> Vec<NaiveDateTime> {
    let minutes = (end - start).num_minutes();
    if minutes < 0 {
        return Vec::new();
    }
    (0..=minutes).map(|k| start + Duration::minutes(k)).collect()
}

fn collapse_by_minute(full: &CallLog) -> HashMap<String, MinuteMedian> {
    let mut groups: HashMap<&str, (Vec<f64>, Vec<f64>)> = HashMap::new();
    for record in full {
        let entry = groups
            .entry(record.dialer_start_time_minus_seconds.as_str())
            .or_default();
        entry.0.push(record.call_difference_interval);
        entry.1.push(record.dialer_call_arrival_time);
    }

    groups
        .into_iter()
        .map(|(key, (intervals, arrivals))| {
            let median = MinuteMedian {
                interval: Data::new(intervals).median(),
                arrival: Data::new(arrivals).median(),
            };
            (key.to_string(), median)
        })
        .collect()
}

/// Left join `index` onto the collapsed log
fn align(
    index: Vec<NaiveDateTime>,
    collapsed: &HashMap<String, MinuteMedian>,
    sentinel: f64,
) -> AlignedFrame {
    let mut frame = AlignedFrame::default();
    let mut last_arrival: Option<f64> = None;

    for timestamp in index {
        let key = alignment_key(timestamp.date(), timestamp.time());
        let hit = collapsed.get(&key);

        if let Some(m) = hit {
            last_arrival = Some(m.arrival);
        }
        frame.intervals.push(hit.map_or(sentinel, |m| m.interval));
        frame.arrivals.push(last_arrival.unwrap_or(sentinel));
        frame.observed.push(hit.is_some());
        frame.keys.push(key);
        frame.timestamps.push(timestamp);
    }

    frame
}

fn build_windows(full: &CallLog, config: &SeasonalConfig) -> Result<SeasonalWindows> {
    let (first, last) = match (full.records().first(), full.records().last()) {
        (Some(first), Some(last)) => (first.call_arrival_date, last.call_arrival_date),
        _ => {
            return Err(ForecastError::InsufficientData(
                "Seasonal windows need a non-empty call log".to_string(),
            ))
        }
    };

    let n = config.num_train_weeks;
    let weeks = week_boundaries(first, last);
    let needed = n.checked_add(2);
    if needed.map_or(true, |needed| weeks.len() < needed) {
        return Err(ForecastError::InsufficientData(format!(
            "{} training weeks plus one test week need data spanning {} weeks from {}, \
             but the last call is on {}",
            n,
            n.saturating_add(1),
            first,
            last
        )));
    }

    let collapsed = collapse_by_minute(full);
    let midnight = |d: NaiveDate| d.and_time(NaiveTime::default());

    let train = align(
        minute_index(midnight(weeks[0]), midnight(weeks[n])),
        &collapsed,
        config.sentinel,
    );
    let test = align(
        minute_index(midnight(weeks[n]), midnight(weeks[n + 1])),
        &collapsed,
        config.sentinel,
    );

    Ok(SeasonalWindows { weeks, train, test })
}

fn fit_model(values: &[f64], config: &SeasonalConfig) -> Result<FittedSeasonal> {
    let model = AdditiveHoltWinters::new(config.level, config.seasonal, config.period)?;

    if config.use_boxcox {
        let lambda = boxcox_lambda(values)?;
        let transformed = boxcox(values, lambda)?;
        Ok(FittedSeasonal {
            state: model.fit(&transformed)?,
            lambda: Some(lambda),
        })
    } else {
        Ok(FittedSeasonal {
            state: model.fit(values)?,
            lambda: None,
        })
    }
}

fn forecast_season(model: &FittedSeasonal, period: usize) -> Vec<f64> {
    let raw = model.state.forecast(period);
    match model.lambda {
        Some(lambda) => inv_boxcox(&raw, lambda),
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CallRecord;
    use chrono::Weekday;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 3, d)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    #[test]
    fn test_week_boundaries() {
        let first = NaiveDate::from_ymd_opt(2019, 3, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2019, 3, 15).unwrap();
        let weeks = week_boundaries(first, last);
        assert_eq!(weeks.len(), 3);
        assert_eq!(weeks[2], last);
        assert_eq!(week_boundaries(last, first), Vec::<NaiveDate>::new());
    }

    #[test]
    fn test_minute_index_is_inclusive() {
        let index = minute_index(at(1, 0, 0), at(2, 0, 0));
        assert_eq!(index.len(), 1441);
        assert_eq!(index[1440], at(2, 0, 0));
    }

    #[test]
    fn test_align_fills_gaps() {
        let mut collapsed = HashMap::new();
        collapsed.insert(
            "2019-03-01 00:01".to_string(),
            MinuteMedian {
                interval: 42.0,
                arrival: 61.0,
            },
        );

        let frame = align(minute_index(at(1, 0, 0), at(1, 0, 3)), &collapsed, 1.0);
        assert_eq!(frame.intervals, vec![1.0, 42.0, 1.0, 1.0]);
        assert_eq!(frame.arrivals, vec![1.0, 61.0, 61.0, 61.0]);
        assert_eq!(frame.observed, vec![false, true, false, false]);
        assert_eq!(frame.keys[0], "2019-03-01 00:00");
    }

    #[test]
    fn test_stage_guards() {
        let mut model = SeasonalForecast::default().with_log(ErrorLog::muted());
        assert_eq!(model.stage(), SeasonalStage::Constructed);
        assert!(model.fit().is_err());
        assert!(model.predict().is_err());
        assert!(model.score().is_err());
        assert!(model.prepare(&CallLog::default()).is_err());
    }

    fn call(h: u32, m: u32, s: u32, interval: f64, arrival: f64) -> CallRecord {
        let date = NaiveDate::from_ymd_opt(2019, 3, 1).unwrap();
        let time = NaiveTime::from_hms_opt(h, m, s).unwrap();
        CallRecord {
            call_arrival_date: date,
            call_arrival_time: date.and_time(time),
            dialer_start_time: date.and_time(time),
            dialer_call_arrival_time: arrival,
            day_of_week: Weekday::Fri,
            call_difference_interval: interval,
            time_of_call: time.format("%H:%M:%S").to_string(),
            hour: h,
            minutes: m,
            seconds: s,
            year: 2019,
            month: 3,
            day: 1,
            dialer_start_time_minus_seconds: alignment_key(date, time),
            interval_of_day: None,
        }
    }

    #[test]
    fn test_calls_in_one_minute_collapse_to_medians() {
        let log = CallLog::new(vec![
            call(10, 0, 5, 3600.0, 36000.0),
            call(10, 0, 12, 7.0, 36107.0),
            call(10, 0, 40, 100.0, 36089.0),
            call(10, 1, 0, 10.0, 36110.0),
            call(10, 1, 30, 30.0, 36140.0),
        ]);

        let collapsed = collapse_by_minute(&log);
        assert_eq!(collapsed.len(), 2);

        let busy = collapsed["2019-03-01 10:00"];
        assert_eq!(busy.interval, 100.0);
        assert_eq!(busy.arrival, 36089.0);

        // Even counts take the mean of the middle pair
        let pair = collapsed["2019-03-01 10:01"];
        assert_eq!(pair.interval, 20.0);
        assert_eq!(pair.arrival, 36125.0);
    }

    #[test]
    fn test_huge_train_week_count_is_insufficient_data() {
        let config = SeasonalConfig {
            num_train_weeks: usize::MAX,
            ..SeasonalConfig::default()
        };
        let mut model = SeasonalForecast::new(config).with_log(ErrorLog::muted());
        let log = CallLog::new(vec![call(10, 0, 0, 5.0, 36000.0)]);

        assert!(matches!(
            model.prepare(&log),
            Err(ForecastError::InsufficientData(_))
        ));
        assert_eq!(model.stage(), SeasonalStage::Constructed);
    }
}
