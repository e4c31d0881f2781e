//! Call log data handling
//!
//! Raw rows come in through polars at the file boundary and are turned into
//! typed [`RawCall`] values. The feature pipeline then produces
//! [`CallRecord`]s, collected in an ordered [`CallLog`].

use crate::error::{ForecastError, Result};
use chrono::{NaiveDate, NaiveDateTime, Weekday};
use polars::prelude::*;
use serde::{Serialize, Serializer};
use std::fmt;
use std::fs::File;
use std::ops::Range;
use std::path::Path;

pub const CALL_ARRIVAL_DATE: &str = "CallArrivalDate";
pub const CALL_ARRIVAL_TIME: &str = "CallArrivalTime";
pub const DIALER_START_TIME: &str = "DialerStartTime";
pub const DIALER_CALL_ARRIVAL_TIME: &str = "DialerCallArrivalTime";
pub const DAY_OF_WEEK: &str = "DayOfWeek";
pub const CALL_DIFFERENCE_INTERVAL: &str = "CallDifferenceInterval";

/// Loader for delimited call log files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Read a comma separated file with a header row
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ForecastError::FileNotFound(path.to_path_buf()));
        }

        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Ok(df)
    }

    /// Read a call log file straight into typed rows
    pub fn raw_calls_from_csv<P: AsRef<Path>>(path: P) -> Result<RawCallLog> {
        let df = Self::from_csv(path)?;
        RawCallLog::from_dataframe(&df)
    }
}

/// One unprocessed row of the input file
#[derive(Debug, Clone, PartialEq)]
pub struct RawCall {
    /// Calendar date of the call, as written in the file
    pub call_arrival_date: String,
    /// Date and time of the call, as written in the file
    pub call_arrival_time: String,
    /// Dialer start date and time, as written in the file
    pub dialer_start_time: String,
    /// Dialer clock reading at arrival, in seconds
    pub dialer_call_arrival_time: f64,
    /// Weekday name when the file carries one
    pub day_of_week: Option<String>,
}

/// Rows of the input file, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCallLog {
    calls: Vec<RawCall>,
}

impl RawCallLog {
    pub fn new(calls: Vec<RawCall>) -> Self {
        Self { calls }
    }

    /// Extract the call columns from a data frame
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let dates = text_column(df, CALL_ARRIVAL_DATE)?;
        let times = text_column(df, CALL_ARRIVAL_TIME)?;
        let dialer_starts = text_column(df, DIALER_START_TIME)?;
        let arrivals = numeric_column(df, DIALER_CALL_ARRIVAL_TIME)?;
        let days = if has_column(df, DAY_OF_WEEK) {
            Some(text_column(df, DAY_OF_WEEK)?)
        } else {
            None
        };

        let mut calls = Vec::with_capacity(df.height());
        for row in 0..df.height() {
            calls.push(RawCall {
                call_arrival_date: required(&dates, CALL_ARRIVAL_DATE, row)?,
                call_arrival_time: required(&times, CALL_ARRIVAL_TIME, row)?,
                dialer_start_time: required(&dialer_starts, DIALER_START_TIME, row)?,
                dialer_call_arrival_time: arrivals[row].ok_or_else(|| {
                    ForecastError::MissingValue {
                        column: DIALER_CALL_ARRIVAL_TIME.to_string(),
                        row,
                    }
                })?,
                day_of_week: days.as_ref().and_then(|d| d[row].clone()),
            });
        }

        Ok(Self { calls })
    }

    pub fn calls(&self) -> &[RawCall] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| *c == name)
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    if !has_column(df, name) {
        return Err(ForecastError::MissingColumn(name.to_string()));
    }
    Ok(df.column(name)?)
}

fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = column(df, name)?.cast(&DataType::Utf8)?;
    let values = series
        .utf8()?
        .into_iter()
        .map(|v| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect();
    Ok(values)
}

fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = column(df, name)?;
    if series.dtype() == &DataType::Utf8 {
        return series
            .utf8()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| match v.map(str::trim).filter(|s| !s.is_empty()) {
                None => Ok(None),
                Some(s) => s
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| ForecastError::ParseError {
                        column: name.to_string(),
                        row,
                        value: s.to_string(),
                    }),
            })
            .collect();
    }

    let series = series.cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

fn required(values: &[Option<String>], column: &str, row: usize) -> Result<String> {
    values[row]
        .clone()
        .ok_or_else(|| ForecastError::MissingValue {
            column: column.to_string(),
            row,
        })
}

/// Coarse bucket of the day a call falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
    /// Only produced with [`crate::config::DayBands::WithLateNight`]
    LateNight,
}

impl IntervalOfDay {
    pub fn as_str(self) -> &'static str {
        match self {
            IntervalOfDay::Morning => "morning",
            IntervalOfDay::Afternoon => "afternoon",
            IntervalOfDay::Evening => "evening",
            IntervalOfDay::Night => "night",
            IntervalOfDay::LateNight => "late_night",
        }
    }
}

impl fmt::Display for IntervalOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full English name of a weekday
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn serialize_weekday<S: Serializer>(day: &Weekday, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(weekday_name(*day))
}

/// One processed call with every derived feature
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallRecord {
    pub call_arrival_date: NaiveDate,
    pub call_arrival_time: NaiveDateTime,
    pub dialer_start_time: NaiveDateTime,
    pub dialer_call_arrival_time: f64,
    #[serde(serialize_with = "serialize_weekday")]
    pub day_of_week: Weekday,
    /// Seconds since the previous call on the same date
    pub call_difference_interval: f64,
    /// Time part of the arrival timestamp
    pub time_of_call: String,
    pub hour: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub year: i32,
    pub month: u32,
    #[serde(rename = "DayDate")]
    pub day: u32,
    /// `YYYY-MM-DD HH:MM` key shared by every call in the same minute
    pub dialer_start_time_minus_seconds: String,
    pub interval_of_day: Option<IntervalOfDay>,
}

/// Processed calls in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallLog {
    records: Vec<CallRecord>,
}

impl From<Vec<CallRecord>> for CallLog {
    fn from(records: Vec<CallRecord>) -> Self {
        Self { records }
    }
}

impl CallLog {
    pub fn new(records: Vec<CallRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CallRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CallRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy of the rows in `range`
    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.records.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "Row range {}..{} is outside a log of {} rows",
                range.start,
                range.end,
                self.records.len()
            )));
        }
        Ok(Self::new(self.records[range].to_vec()))
    }

    /// This log followed by `other`
    pub fn concat(&self, other: &CallLog) -> Self {
        let mut records = Vec::with_capacity(self.len() + other.len());
        records.extend_from_slice(&self.records);
        records.extend_from_slice(&other.records);
        Self::new(records)
    }

    /// The `CallDifferenceInterval` column
    pub fn intervals(&self) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| r.call_difference_interval)
            .collect()
    }

    /// Copy of this log with `CallDifferenceInterval` replaced by `values`
    pub fn with_intervals(&self, values: &[f64]) -> Result<Self> {
        if values.len() != self.records.len() {
            return Err(ForecastError::ShapeMismatch {
                expected: self.records.len(),
                actual: values.len(),
            });
        }

        let records = self
            .records
            .iter()
            .zip(values)
            .map(|(record, &value)| CallRecord {
                call_difference_interval: value,
                ..record.clone()
            })
            .collect();

        Ok(Self::new(records))
    }

    /// Export to a polars frame using the input column names
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let r = &self.records;
        let text = |f: fn(&CallRecord) -> String| r.iter().map(f).collect::<Vec<String>>();

        let columns = vec![
            Series::new(
                CALL_ARRIVAL_DATE,
                text(|c| c.call_arrival_date.format("%Y-%m-%d").to_string()),
            ),
            Series::new(
                CALL_ARRIVAL_TIME,
                text(|c| c.call_arrival_time.format("%Y-%m-%d %H:%M:%S").to_string()),
            ),
            Series::new(
                DIALER_START_TIME,
                text(|c| c.dialer_start_time.format("%Y-%m-%d %H:%M:%S").to_string()),
            ),
            Series::new(
                DIALER_CALL_ARRIVAL_TIME,
                r.iter().map(|c| c.dialer_call_arrival_time).collect::<Vec<f64>>(),
            ),
            Series::new(
                DAY_OF_WEEK,
                text(|c| weekday_name(c.day_of_week).to_string()),
            ),
            Series::new(CALL_DIFFERENCE_INTERVAL, self.intervals()),
            Series::new("TimeOfCall", text(|c| c.time_of_call.clone())),
            Series::new("Hour", r.iter().map(|c| c.hour).collect::<Vec<u32>>()),
            Series::new("Minutes", r.iter().map(|c| c.minutes).collect::<Vec<u32>>()),
            Series::new("Seconds", r.iter().map(|c| c.seconds).collect::<Vec<u32>>()),
            Series::new("Year", r.iter().map(|c| c.year).collect::<Vec<i32>>()),
            Series::new("Month", r.iter().map(|c| c.month).collect::<Vec<u32>>()),
            Series::new("DayDate", r.iter().map(|c| c.day).collect::<Vec<u32>>()),
            Series::new(
                "DialerStartTimeMinusSeconds",
                text(|c| c.dialer_start_time_minus_seconds.clone()),
            ),
            Series::new(
                "IntervalOfDay",
                r.iter()
                    .map(|c| c.interval_of_day.map(IntervalOfDay::as_str))
                    .collect::<Vec<Option<&str>>>(),
            ),
        ];

        Ok(DataFrame::new(columns)?)
    }

    /// Write every record to a CSV file with a header row
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a CallLog {
    type Item = &'a CallRecord;
    type IntoIter = std::slice::Iter<'a, CallRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn record(minute: u32, interval: f64) -> CallRecord {
        let date = NaiveDate::from_ymd_opt(2019, 3, 14).unwrap();
        let time = NaiveTime::from_hms_opt(9, minute, 0).unwrap();
        CallRecord {
            call_arrival_date: date,
            call_arrival_time: date.and_time(time),
            dialer_start_time: date.and_time(time),
            dialer_call_arrival_time: 32400.0 + minute as f64 * 60.0,
            day_of_week: Weekday::Thu,
            call_difference_interval: interval,
            time_of_call: time.format("%H:%M:%S").to_string(),
            hour: 9,
            minutes: minute,
            seconds: 0,
            year: 2019,
            month: 3,
            day: 14,
            dialer_start_time_minus_seconds: format!("2019-03-14 09:{:02}", minute),
            interval_of_day: Some(IntervalOfDay::Morning),
        }
    }

    fn log() -> CallLog {
        CallLog::new(vec![record(0, 5.0), record(1, 60.0), record(2, 60.0)])
    }

    #[test]
    fn test_slice_and_concat() {
        let log = log();
        let head = log.slice(0..2).unwrap();
        let tail = log.slice(2..3).unwrap();
        assert_eq!(head.concat(&tail), log);
        assert!(log.slice(2..5).is_err());
    }

    #[test]
    fn test_with_intervals_checks_shape() {
        let log = log();
        let replaced = log.with_intervals(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(replaced.intervals(), vec![1.0, 2.0, 3.0]);
        assert_eq!(replaced.records()[1].minutes, 1);

        assert!(matches!(
            log.with_intervals(&[1.0]),
            Err(ForecastError::ShapeMismatch {
                expected: 3,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_to_dataframe_uses_input_names() {
        let df = log().to_dataframe().unwrap();
        assert_eq!(df.height(), 3);
        assert!(df.column(CALL_DIFFERENCE_INTERVAL).is_ok());
        assert!(df.column("DialerStartTimeMinusSeconds").is_ok());
        assert!(df.column("IntervalOfDay").is_ok());
    }

    #[test]
    fn test_raw_log_from_dataframe() {
        let df = DataFrame::new(vec![
            Series::new(CALL_ARRIVAL_DATE, &["2019/03/14", "2019/03/14"]),
            Series::new(CALL_ARRIVAL_TIME, &["2019/03/14 09:00:00", "2019/03/14 09:01:00"]),
            Series::new(DIALER_START_TIME, &["2019/03/14 08:59:50", "2019/03/14 09:00:55"]),
            Series::new(DIALER_CALL_ARRIVAL_TIME, &[32400.0, 32460.0]),
        ])
        .unwrap();

        let raw = RawCallLog::from_dataframe(&df).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.calls()[1].dialer_call_arrival_time, 32460.0);
        assert_eq!(raw.calls()[0].day_of_week, None);
    }

    #[test]
    fn test_raw_log_reports_missing_column() {
        let df = DataFrame::new(vec![Series::new(CALL_ARRIVAL_DATE, &["2019/03/14"])]).unwrap();
        assert!(matches!(
            RawCallLog::from_dataframe(&df),
            Err(ForecastError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            DataLoader::from_csv("does/not/exist.csv"),
            Err(ForecastError::FileNotFound(_))
        ));
    }
}
