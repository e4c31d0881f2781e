//! Feature derivation
//!
//! Turns a [`RawCallLog`] into a [`CallLog`] in a fixed order of stages:
//!
//! 1. inter-arrival differences per calendar date
//! 2. time of call and its hour/minute/second parts
//! 3. year/month/day parts of the call date
//! 4. minute alignment key
//! 5. parsed timestamps
//! 6. interval of the day
//!
//! Each stage is a plain function over its inputs. [`FeaturePipeline::process`]
//! either returns a complete log or an error; it never hands back a log with
//! only some of the features filled in.

use crate::config::DayBands;
use crate::data::{
    CallLog, CallRecord, IntervalOfDay, RawCall, RawCallLog, CALL_ARRIVAL_DATE,
    CALL_ARRIVAL_TIME, DAY_OF_WEEK, DIALER_START_TIME,
};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use std::collections::HashMap;

const DATE_FORMATS: [&str; 3] = ["%Y/%m/%d", "%m/%d/%Y", "%Y-%m-%d"];
const TIME_FORMATS: [&str; 3] = ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

/// Time part of an arrival timestamp, split into its fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeOfCall {
    /// Text after the date, as written in the file
    pub text: String,
    pub time: NaiveTime,
    pub hour: u32,
    pub minutes: u32,
    pub seconds: u32,
}

/// Parse a calendar date in any accepted layout
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

fn split_date_time(raw: &str) -> Option<(&str, &str)> {
    raw.trim()
        .split_once(|c: char| c == ' ' || c == 'T')
        .map(|(date, time)| (date, time.trim()))
}

/// Parse `<date> <time>` or ISO `<date>T<time>`
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let (date, time) = split_date_time(raw)?;
    Some(parse_date(date)?.and_time(parse_time(time)?))
}

/// Take the time part of an arrival timestamp and split it into fields
pub fn split_time_of_call(raw: &str) -> Option<TimeOfCall> {
    let (_, text) = split_date_time(raw)?;
    let time = parse_time(text)?;
    Some(TimeOfCall {
        text: text.to_string(),
        time,
        hour: time.hour(),
        minutes: time.minute(),
        seconds: time.second(),
    })
}

/// Year, month and day of a date string
pub fn split_date(raw: &str) -> Option<(i32, u32, u32)> {
    parse_date(raw).map(|d| (d.year(), d.month(), d.day()))
}

/// `YYYY-MM-DD HH:MM` key; calls in the same minute share it
pub fn alignment_key(date: NaiveDate, time: NaiveTime) -> String {
    format!(
        "{} {:02}:{:02}",
        date.format("%Y-%m-%d"),
        time.hour(),
        time.minute()
    )
}

/// Bucket a clock time.
///
/// Every band is closed at both ends and later bands win on the shared
/// endpoints, so 12:00 is afternoon and 19:00 is night. With the literal
/// layout, times outside 07:00 to 23:59 get no bucket.
pub fn interval_of_day(time: NaiveTime, bands: DayBands) -> Option<IntervalOfDay> {
    let at = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default();
    let within = |start: NaiveTime, end: NaiveTime| time >= start && time <= end;

    let bucket = if within(at(19, 0), at(23, 59)) {
        Some(IntervalOfDay::Night)
    } else if within(at(16, 0), at(19, 0)) {
        Some(IntervalOfDay::Evening)
    } else if within(at(12, 0), at(16, 0)) {
        Some(IntervalOfDay::Afternoon)
    } else if within(at(7, 0), at(12, 0)) {
        Some(IntervalOfDay::Morning)
    } else {
        None
    };

    match (bucket, bands) {
        (None, DayBands::WithLateNight) => Some(IntervalOfDay::LateNight),
        (bucket, _) => bucket,
    }
}

/// Seconds since the previous call on the same date.
///
/// The first call of each date keeps its own arrival value. Dates need not
/// be contiguous in the input.
pub fn call_difference_intervals(dates: &[NaiveDate], arrivals: &[f64]) -> Result<Vec<f64>> {
    if dates.len() != arrivals.len() {
        return Err(ForecastError::ShapeMismatch {
            expected: dates.len(),
            actual: arrivals.len(),
        });
    }

    let mut previous: HashMap<NaiveDate, f64> = HashMap::new();
    let intervals = dates
        .iter()
        .zip(arrivals)
        .map(|(date, &arrival)| match previous.insert(*date, arrival) {
            Some(last) => arrival - last,
            None => arrival,
        })
        .collect();

    Ok(intervals)
}

/// Parse a weekday name, full or short, in any case
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    raw.trim().parse::<Weekday>().ok()
}

/// Runs every stage over a raw log
#[derive(Debug, Clone, Copy, Default)]
pub struct FeaturePipeline {
    bands: DayBands,
}

impl FeaturePipeline {
    pub fn new(bands: DayBands) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> DayBands {
        self.bands
    }

    /// Derive every feature for every row
    pub fn process(&self, raw: &RawCallLog) -> Result<CallLog> {
        let calls = raw.calls();

        let dates = calls
            .iter()
            .enumerate()
            .map(|(row, c)| {
                parse_date(&c.call_arrival_date)
                    .ok_or_else(|| parse_error(CALL_ARRIVAL_DATE, row, &c.call_arrival_date))
            })
            .collect::<Result<Vec<_>>>()?;

        let arrivals: Vec<f64> = calls.iter().map(|c| c.dialer_call_arrival_time).collect();
        let intervals = call_difference_intervals(&dates, &arrivals)?;

        let times = calls
            .iter()
            .enumerate()
            .map(|(row, c)| {
                split_time_of_call(&c.call_arrival_time)
                    .ok_or_else(|| parse_error(CALL_ARRIVAL_TIME, row, &c.call_arrival_time))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut records = Vec::with_capacity(calls.len());
        for (row, call) in calls.iter().enumerate() {
            let date = dates[row];
            let time = &times[row];

            let arrival_time = parse_timestamp(&call.call_arrival_time)
                .ok_or_else(|| parse_error(CALL_ARRIVAL_TIME, row, &call.call_arrival_time))?;
            let dialer_start = parse_timestamp(&call.dialer_start_time)
                .ok_or_else(|| parse_error(DIALER_START_TIME, row, &call.dialer_start_time))?;

            records.push(CallRecord {
                call_arrival_date: date,
                call_arrival_time: arrival_time,
                dialer_start_time: dialer_start,
                dialer_call_arrival_time: call.dialer_call_arrival_time,
                day_of_week: day_of_week(call, date, row)?,
                call_difference_interval: intervals[row],
                time_of_call: time.text.clone(),
                hour: time.hour,
                minutes: time.minutes,
                seconds: time.seconds,
                year: date.year(),
                month: date.month(),
                day: date.day(),
                dialer_start_time_minus_seconds: alignment_key(date, time.time),
                interval_of_day: interval_of_day(arrival_time.time(), self.bands),
            });
        }

        Ok(CallLog::new(records))
    }
}

fn day_of_week(call: &RawCall, date: NaiveDate, row: usize) -> Result<Weekday> {
    match &call.day_of_week {
        Some(name) => parse_weekday(name).ok_or_else(|| parse_error(DAY_OF_WEEK, row, name)),
        None => Ok(date.weekday()),
    }
}

fn parse_error(column: &str, row: usize, value: &str) -> ForecastError {
    ForecastError::ParseError {
        column: column.to_string(),
        row,
        value: value.to_string(),
    }
}
