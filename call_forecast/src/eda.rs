//! Descriptive views over a processed call log
//!
//! Nothing here feeds the forecasters; these are summaries for a person
//! exploring the data.

use crate::data::{CallLog, IntervalOfDay};
use crate::error::{ForecastError, Result};
use chrono::{NaiveDate, NaiveDateTime, Weekday};
use statrs::statistics::{Data, OrderStatistics, Statistics};
use std::collections::BTreeMap;
use std::fmt;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Number of calls on one calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCount {
    pub date: NaiveDate,
    pub day_of_week: Weekday,
    pub count: usize,
}

/// Number of calls in one interval of one date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalCount {
    pub date: NaiveDate,
    pub interval: IntervalOfDay,
    pub count: usize,
}

/// Summary statistics of the per-date call counts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation
    pub std: f64,
    pub min: f64,
    pub lower_quartile: f64,
    pub median: f64,
    pub upper_quartile: f64,
    pub max: f64,
}

impl fmt::Display for CountSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "count {:>10}", self.count)?;
        writeln!(f, "mean  {:>10.3}", self.mean)?;
        writeln!(f, "std   {:>10.3}", self.std)?;
        writeln!(f, "min   {:>10.3}", self.min)?;
        writeln!(f, "25%   {:>10.3}", self.lower_quartile)?;
        writeln!(f, "50%   {:>10.3}", self.median)?;
        writeln!(f, "75%   {:>10.3}", self.upper_quartile)?;
        write!(f, "max   {:>10.3}", self.max)
    }
}

/// Read-only analysis over a processed log
#[derive(Debug, Clone, Copy)]
pub struct Eda<'a> {
    data: &'a CallLog,
}

impl<'a> Eda<'a> {
    pub fn new(data: &'a CallLog) -> Self {
        Self { data }
    }

    /// Distinct weekdays in order of first appearance
    pub fn call_days(&self) -> Vec<Weekday> {
        let mut days = Vec::new();
        for record in self.data {
            if !days.contains(&record.day_of_week) {
                days.push(record.day_of_week);
            }
        }
        days
    }

    /// The inter-arrival column
    pub fn call_difference_intervals(&self) -> Vec<f64> {
        self.data.intervals()
    }

    /// Calls per calendar date, in date order
    pub fn each_day_call_count(&self) -> Vec<DayCount> {
        let mut counts: BTreeMap<NaiveDate, DayCount> = BTreeMap::new();
        for record in self.data {
            counts
                .entry(record.call_arrival_date)
                .or_insert(DayCount {
                    date: record.call_arrival_date,
                    day_of_week: record.day_of_week,
                    count: 0,
                })
                .count += 1;
        }
        counts.into_values().collect()
    }

    /// Count, mean, spread and quartiles of the calls per date
    pub fn each_day_call_count_description(&self) -> Result<CountSummary> {
        let counts: Vec<f64> = self
            .each_day_call_count()
            .iter()
            .map(|d| d.count as f64)
            .collect();
        if counts.is_empty() {
            return Err(ForecastError::InsufficientData(
                "Cannot describe an empty call log".to_string(),
            ));
        }

        let std = if counts.len() > 1 {
            counts.iter().std_dev()
        } else {
            0.0
        };
        let mut data = Data::new(counts.clone());

        Ok(CountSummary {
            count: counts.len(),
            mean: counts.iter().mean(),
            std,
            min: Statistics::min(counts.iter()),
            lower_quartile: data.lower_quartile(),
            median: data.median(),
            upper_quartile: data.upper_quartile(),
            max: Statistics::max(counts.iter()),
        })
    }

    /// Calls per date and interval of the day; unbucketed calls are left out
    pub fn each_day_intervals_call_count(&self) -> Vec<IntervalCount> {
        let mut counts: BTreeMap<(NaiveDate, IntervalOfDay), usize> = BTreeMap::new();
        for record in self.data {
            if let Some(interval) = record.interval_of_day {
                *counts
                    .entry((record.call_arrival_date, interval))
                    .or_insert(0) += 1;
            }
        }
        counts
            .into_iter()
            .map(|((date, interval), count)| IntervalCount {
                date,
                interval,
                count,
            })
            .collect()
    }

    /// Calls per weekday over the whole log, Monday first
    pub fn interday_call_count(&self) -> Vec<(Weekday, usize)> {
        WEEK.iter()
            .map(|&day| {
                let count = self
                    .data
                    .iter()
                    .filter(|r| r.day_of_week == day)
                    .count();
                (day, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    pub fn max_call_difference_interval(&self) -> Option<f64> {
        self.data
            .iter()
            .map(|r| r.call_difference_interval)
            .reduce(f64::max)
    }

    pub fn min_call_difference_interval(&self) -> Option<f64> {
        self.data
            .iter()
            .map(|r| r.call_difference_interval)
            .reduce(f64::min)
    }

    /// Latest arrival on each date
    pub fn max_call_time(&self) -> Vec<(NaiveDate, NaiveDateTime)> {
        self.arrival_extreme(|current, candidate| candidate > current)
    }

    /// Earliest arrival on each date
    pub fn min_call_time(&self) -> Vec<(NaiveDate, NaiveDateTime)> {
        self.arrival_extreme(|current, candidate| candidate < current)
    }

    fn arrival_extreme<F>(&self, replace: F) -> Vec<(NaiveDate, NaiveDateTime)>
    where
        F: Fn(NaiveDateTime, NaiveDateTime) -> bool,
    {
        let mut extremes: BTreeMap<NaiveDate, NaiveDateTime> = BTreeMap::new();
        for record in self.data {
            extremes
                .entry(record.call_arrival_date)
                .and_modify(|current| {
                    if replace(*current, record.call_arrival_time) {
                        *current = record.call_arrival_time;
                    }
                })
                .or_insert(record.call_arrival_time);
        }
        extremes.into_iter().collect()
    }

    /// Mean number of calls per date
    pub fn mean_call_count(&self) -> Option<f64> {
        let counts = self.each_day_call_count();
        if counts.is_empty() {
            return None;
        }
        Some(counts.iter().map(|d| d.count as f64).mean())
    }

    /// Inter-arrival values of each weekday, Monday through Sunday
    pub fn arrival_differences_per_day(&self) -> Vec<(Weekday, Vec<f64>)> {
        WEEK.iter()
            .map(|&day| {
                let values = self
                    .data
                    .iter()
                    .filter(|r| r.day_of_week == day)
                    .map(|r| r.call_difference_interval)
                    .collect();
                (day, values)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CallRecord;
    use approx::assert_relative_eq;
    use chrono::{Datelike, NaiveTime, Timelike};

    fn record(d: u32, h: u32, interval: f64, band: Option<IntervalOfDay>) -> CallRecord {
        let date = NaiveDate::from_ymd_opt(2019, 3, d).unwrap();
        let time = NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        CallRecord {
            call_arrival_date: date,
            call_arrival_time: date.and_time(time),
            dialer_start_time: date.and_time(time),
            dialer_call_arrival_time: 0.0,
            day_of_week: date.weekday(),
            call_difference_interval: interval,
            time_of_call: time.format("%H:%M:%S").to_string(),
            hour: h,
            minutes: 0,
            seconds: 0,
            year: 2019,
            month: 3,
            day: d,
            dialer_start_time_minus_seconds: String::new(),
            interval_of_day: band,
        }
    }

    fn sample() -> CallLog {
        // 4th Monday, 5th Tuesday, 11th Monday
        CallLog::new(vec![
            record(4, 8, 5.0, Some(IntervalOfDay::Morning)),
            record(4, 9, 15.0, Some(IntervalOfDay::Morning)),
            record(4, 13, 40.0, Some(IntervalOfDay::Afternoon)),
            record(5, 3, 2.0, None),
            record(11, 20, 8.0, Some(IntervalOfDay::Night)),
            record(11, 10, 30.0, Some(IntervalOfDay::Morning)),
        ])
    }

    #[test]
    fn test_day_counts() {
        let log = sample();
        let eda = Eda::new(&log);

        assert_eq!(eda.call_days(), vec![Weekday::Mon, Weekday::Tue]);
        let counts: Vec<usize> = eda.each_day_call_count().iter().map(|d| d.count).collect();
        assert_eq!(counts, vec![3, 1, 2]);
        assert_eq!(eda.interday_call_count(), vec![(Weekday::Mon, 5), (Weekday::Tue, 1)]);
        assert_relative_eq!(eda.mean_call_count().unwrap(), 2.0);
    }

    #[test]
    fn test_count_description() {
        let log = sample();
        let summary = Eda::new(&log).each_day_call_count_description().unwrap();

        assert_eq!(summary.count, 3);
        assert_relative_eq!(summary.mean, 2.0);
        assert_relative_eq!(summary.std, 1.0);
        assert_relative_eq!(summary.min, 1.0);
        assert_relative_eq!(summary.median, 2.0);
        assert_relative_eq!(summary.max, 3.0);

        let empty = CallLog::default();
        assert!(Eda::new(&empty).each_day_call_count_description().is_err());
    }

    #[test]
    fn test_interval_counts_skip_unbucketed_rows() {
        let log = sample();
        let counts = Eda::new(&log).each_day_intervals_call_count();

        assert_eq!(counts.len(), 4);
        assert_eq!(counts[0].interval, IntervalOfDay::Morning);
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), 5);
    }

    #[test]
    fn test_extremes() {
        let log = sample();
        let eda = Eda::new(&log);

        assert_eq!(eda.max_call_difference_interval(), Some(40.0));
        assert_eq!(eda.min_call_difference_interval(), Some(2.0));

        let latest = eda.max_call_time();
        let earliest = eda.min_call_time();
        assert_eq!(latest.len(), 3);
        assert_eq!(latest[2].1.hour(), 20);
        assert_eq!(earliest[2].1.hour(), 10);

        let empty = CallLog::default();
        assert_eq!(Eda::new(&empty).max_call_difference_interval(), None);
        assert_eq!(Eda::new(&empty).mean_call_count(), None);
    }

    #[test]
    fn test_arrival_differences_per_day() {
        let log = sample();
        let per_day = Eda::new(&log).arrival_differences_per_day();

        assert_eq!(per_day.len(), 7);
        assert_eq!(per_day[0], (Weekday::Mon, vec![5.0, 15.0, 40.0, 8.0, 30.0]));
        assert_eq!(per_day[1].1, vec![2.0]);
        assert!(per_day[6].1.is_empty());
    }
}
