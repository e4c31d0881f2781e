//! Shared fixtures for the integration tests
#![allow(dead_code)]

use call_forecast::data::{RawCall, RawCallLog};
use call_forecast::{CallLog, FeaturePipeline};
use std::io::Write;
use tempfile::NamedTempFile;

pub const HEADER: &str = "CallArrivalDate,CallArrivalTime,DialerStartTime,DialerCallArrivalTime";

/// A raw row for March 2019 at `hh:mm:00`
pub fn raw_call(day: u32, hour: u32, minute: u32, arrival: f64) -> RawCall {
    let date = format!("2019-03-{:02}", day);
    let stamp = format!("{} {:02}:{:02}:00", date, hour, minute);
    RawCall {
        call_arrival_date: date,
        call_arrival_time: stamp.clone(),
        dialer_start_time: stamp,
        dialer_call_arrival_time: arrival,
        day_of_week: None,
    }
}

pub fn process(calls: Vec<RawCall>) -> CallLog {
    FeaturePipeline::default()
        .process(&RawCallLog::new(calls))
        .unwrap()
}

/// Calls on each of `days`, at every hour in `hours`.
///
/// The dialer clock reads seconds since midnight plus a small offset that
/// varies with the hour, so inter-arrival values are uneven.
pub fn hourly_calls(days: impl IntoIterator<Item = u32>, hours: &[u32]) -> Vec<RawCall> {
    let mut calls = Vec::new();
    for day in days {
        for &hour in hours {
            let arrival = 3600.0 * hour as f64 + (hour * hour + day) as f64;
            calls.push(raw_call(day, hour, 0, arrival));
        }
    }
    calls
}

/// Write `rows` under the call log header to a temporary CSV
pub fn csv_file(rows: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}
