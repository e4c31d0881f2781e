//! Grouped averages keyed by weekday, and by weekday and interval of the day
//!
//! Predictions look every test row up by key. A key that never occurred in
//! training falls back to a coarser mean and the fallback is logged at DEBUG.

use super::{fitted, require_rows, ForecastStrategy};
use crate::data::{weekday_name, CallLog, CallRecord, IntervalOfDay};
use crate::error::Result;
use crate::logging::ErrorLog;
use chrono::Weekday;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Mean interval per group, for groups whose key is present
fn group_means<K, F>(log: &CallLog, key: F) -> HashMap<K, f64>
where
    K: Eq + Hash,
    F: Fn(&CallRecord) -> Option<K>,
{
    let mut totals: HashMap<K, (f64, usize)> = HashMap::new();
    for record in log {
        if let Some(k) = key(record) {
            let entry = totals.entry(k).or_insert((0.0, 0));
            entry.0 += record.call_difference_interval;
            entry.1 += 1;
        }
    }

    totals
        .into_iter()
        .map(|(k, (sum, count))| (k, sum / count as f64))
        .collect()
}

fn grand_mean(log: &CallLog) -> f64 {
    log.iter().map(|r| r.call_difference_interval).sum::<f64>() / log.len() as f64
}

fn sorted_days(days: HashSet<Weekday>) -> Vec<Weekday> {
    let mut days: Vec<Weekday> = days.into_iter().collect();
    days.sort_by_key(|d| d.num_days_from_monday());
    days
}

/// Fitted weekday table
#[derive(Debug, Clone, PartialEq)]
pub struct DayMeans {
    pub by_day: HashMap<Weekday, f64>,
    pub grand_mean: f64,
}

/// Mean interval per weekday
#[derive(Debug, Clone, Default)]
pub struct HourlyIntervalAverageForecast {
    log: ErrorLog,
    table: Option<DayMeans>,
}

const HOURLY_COMPONENT: &str = "hourly_interval_average";
const HOURLY_NAME: &str = "HourlyIntervalAverage";

impl HourlyIntervalAverageForecast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(mut self, log: ErrorLog) -> Self {
        self.log = log;
        self
    }

    pub fn table(&self) -> Option<&DayMeans> {
        self.table.as_ref()
    }

    fn train(train: &CallLog) -> Result<DayMeans> {
        require_rows(train, 1, HOURLY_NAME)?;
        Ok(DayMeans {
            by_day: group_means(train, |r| Some(r.day_of_week)),
            grand_mean: grand_mean(train),
        })
    }

    fn forecast(&self, table: &DayMeans, test: &CallLog) -> Result<CallLog> {
        let mut missing = HashSet::new();
        let values: Vec<f64> = test
            .iter()
            .map(|r| match table.by_day.get(&r.day_of_week) {
                Some(&mean) => mean,
                None => {
                    missing.insert(r.day_of_week);
                    table.grand_mean
                }
            })
            .collect();

        for day in sorted_days(missing) {
            self.log.debug(
                HOURLY_COMPONENT,
                "HourlyIntervalAverageForecast::predict",
                &format!("No training rows for {}; using the grand mean", weekday_name(day)),
            );
        }

        test.with_intervals(&values)
    }
}

impl ForecastStrategy for HourlyIntervalAverageForecast {
    fn name(&self) -> &str {
        HOURLY_NAME
    }

    fn fit(&mut self, train: &CallLog) -> Result<()> {
        self.table = None;
        let table = self.log.trap(
            HOURLY_COMPONENT,
            "HourlyIntervalAverageForecast::fit",
            "Unable to train model",
            Self::train(train),
        )?;
        self.table = Some(table);
        Ok(())
    }

    fn predict(&self, test: &CallLog) -> Result<CallLog> {
        let forecast =
            fitted(&self.table, HOURLY_NAME).and_then(|table| self.forecast(table, test));
        self.log.trap(
            HOURLY_COMPONENT,
            "HourlyIntervalAverageForecast::predict",
            "Unable to predict forecast",
            forecast,
        )
    }

    fn is_fitted(&self) -> bool {
        self.table.is_some()
    }

    fn describe(&self) -> String {
        let Some(table) = &self.table else {
            return format!("{}: not fitted", HOURLY_NAME);
        };

        let days: Vec<String> = WEEK
            .iter()
            .filter_map(|d| {
                table
                    .by_day
                    .get(d)
                    .map(|m| format!("{} {:.3}s", weekday_name(*d), m))
            })
            .collect();
        format!("{}: {}", HOURLY_NAME, days.join(", "))
    }
}

/// Fitted weekday and interval table
#[derive(Debug, Clone, PartialEq)]
pub struct DayIntervalMeans {
    pub by_slot: HashMap<(Weekday, IntervalOfDay), f64>,
    pub by_day: HashMap<Weekday, f64>,
    pub grand_mean: f64,
}

/// Mean interval per weekday and interval of the day
#[derive(Debug, Clone, Default)]
pub struct HalfdayIntervalAverageForecast {
    log: ErrorLog,
    table: Option<DayIntervalMeans>,
}

const HALFDAY_COMPONENT: &str = "halfday_interval_average";
const HALFDAY_NAME: &str = "HalfdayIntervalAverage";

impl HalfdayIntervalAverageForecast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(mut self, log: ErrorLog) -> Self {
        self.log = log;
        self
    }

    pub fn table(&self) -> Option<&DayIntervalMeans> {
        self.table.as_ref()
    }

    fn train(train: &CallLog) -> Result<DayIntervalMeans> {
        require_rows(train, 1, HALFDAY_NAME)?;
        Ok(DayIntervalMeans {
            by_slot: group_means(train, |r| r.interval_of_day.map(|i| (r.day_of_week, i))),
            by_day: group_means(train, |r| Some(r.day_of_week)),
            grand_mean: grand_mean(train),
        })
    }

    fn forecast(&self, table: &DayIntervalMeans, test: &CallLog) -> Result<CallLog> {
        let mut to_day = HashSet::new();
        let mut to_grand = HashSet::new();

        let values: Vec<f64> = test
            .iter()
            .map(|r| {
                let slot = r
                    .interval_of_day
                    .and_then(|i| table.by_slot.get(&(r.day_of_week, i)));
                if let Some(&mean) = slot {
                    return mean;
                }
                match table.by_day.get(&r.day_of_week) {
                    Some(&mean) => {
                        to_day.insert((r.day_of_week, r.interval_of_day));
                        mean
                    }
                    None => {
                        to_grand.insert(r.day_of_week);
                        table.grand_mean
                    }
                }
            })
            .collect();

        let operation = "HalfdayIntervalAverageForecast::predict";
        let mut to_day: Vec<(Weekday, Option<IntervalOfDay>)> = to_day.into_iter().collect();
        to_day.sort_by_key(|(d, i)| (d.num_days_from_monday(), *i));
        for (day, interval) in to_day {
            let interval = interval.map_or("no interval", IntervalOfDay::as_str);
            self.log.debug(
                HALFDAY_COMPONENT,
                operation,
                &format!(
                    "No training rows for {} {}; using the {} mean",
                    weekday_name(day),
                    interval,
                    weekday_name(day)
                ),
            );
        }
        for day in sorted_days(to_grand) {
            self.log.debug(
                HALFDAY_COMPONENT,
                operation,
                &format!("No training rows for {}; using the grand mean", weekday_name(day)),
            );
        }

        test.with_intervals(&values)
    }
}

impl ForecastStrategy for HalfdayIntervalAverageForecast {
    fn name(&self) -> &str {
        HALFDAY_NAME
    }

    fn fit(&mut self, train: &CallLog) -> Result<()> {
        self.table = None;
        let table = self.log.trap(
            HALFDAY_COMPONENT,
            "HalfdayIntervalAverageForecast::fit",
            "Unable to train model",
            Self::train(train),
        )?;
        self.table = Some(table);
        Ok(())
    }

    fn predict(&self, test: &CallLog) -> Result<CallLog> {
        let forecast =
            fitted(&self.table, HALFDAY_NAME).and_then(|table| self.forecast(table, test));
        self.log.trap(
            HALFDAY_COMPONENT,
            "HalfdayIntervalAverageForecast::predict",
            "Unable to predict forecast",
            forecast,
        )
    }

    fn is_fitted(&self) -> bool {
        self.table.is_some()
    }

    fn describe(&self) -> String {
        match &self.table {
            Some(table) => format!(
                "{}: {} weekday/interval groups, grand mean {:.3}s",
                HALFDAY_NAME,
                table.by_slot.len(),
                table.grand_mean
            ),
            None => format!("{}: not fitted", HALFDAY_NAME),
        }
    }
}
