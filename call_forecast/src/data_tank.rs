//! Load, process and split a call log

use crate::config::DayBands;
use crate::data::{CallLog, DataLoader, RawCallLog};
use crate::error::{ForecastError, Result};
use crate::features::FeaturePipeline;
use crate::logging::ErrorLog;
use polars::prelude::DataFrame;
use std::path::Path;

const COMPONENT: &str = "data_tank";

/// Holds the working dataset between the load, process and split steps
#[derive(Debug, Clone, Default)]
pub struct DataTank {
    pipeline: FeaturePipeline,
    log: ErrorLog,
    raw: Option<RawCallLog>,
    full_data: Option<CallLog>,
}

impl DataTank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `bands` when bucketing call times
    pub fn with_bands(mut self, bands: DayBands) -> Self {
        self.pipeline = FeaturePipeline::new(bands);
        self
    }

    pub fn with_log(mut self, log: ErrorLog) -> Self {
        self.log = log;
        self
    }

    /// Read the raw rows from a CSV file
    pub fn load_data<P: AsRef<Path>>(&mut self, path: P) -> Result<RawCallLog> {
        let loaded = self.log.trap(
            COMPONENT,
            "DataTank::load_data",
            "Unable to load file",
            DataLoader::raw_calls_from_csv(path),
        )?;
        self.store_raw("DataTank::load_data", loaded)
    }

    /// Take the raw rows from a data frame that is already in memory
    pub fn load_frame(&mut self, df: &DataFrame) -> Result<RawCallLog> {
        let loaded = self.log.trap(
            COMPONENT,
            "DataTank::load_frame",
            "Unable to read data frame",
            RawCallLog::from_dataframe(df),
        )?;
        self.store_raw("DataTank::load_frame", loaded)
    }

    fn store_raw(&mut self, operation: &str, raw: RawCallLog) -> Result<RawCallLog> {
        self.log.info(
            COMPONENT,
            operation,
            &format!("Loaded {} rows", raw.len()),
        );
        self.full_data = None;
        self.raw = Some(raw.clone());
        Ok(raw)
    }

    /// Derive every feature of the loaded rows.
    ///
    /// On failure the previously processed data, if any, is left untouched.
    pub fn process_data(&mut self) -> Result<CallLog> {
        let operation = "DataTank::process_data";
        let processed = match &self.raw {
            Some(raw) => self.pipeline.process(raw),
            None => Err(ForecastError::DataError(
                "No data loaded; call load_data first".to_string(),
            )),
        };
        let processed = self
            .log
            .trap(COMPONENT, operation, "Unable to process data", processed)?;

        self.full_data = Some(processed.clone());
        Ok(processed)
    }

    /// Processed data, when `process_data` has succeeded
    pub fn full_data(&self) -> Option<&CallLog> {
        self.full_data.as_ref()
    }

    /// Order-preserving split of the processed data into train and test.
    ///
    /// The train part holds the first `floor(len * ratio)` rows.
    pub fn train_test_split(&self, ratio: f64) -> Result<(CallLog, CallLog)> {
        let split = match &self.full_data {
            Some(data) => split_log(data, ratio),
            None => Err(ForecastError::DataError(
                "No processed data; call process_data first".to_string(),
            )),
        };
        let (train, test) = self.log.trap(
            COMPONENT,
            "DataTank::train_test_split",
            "Unable to create train-test split",
            split,
        )?;

        self.log.debug(
            COMPONENT,
            "DataTank::train_test_split",
            &format!("{} train rows, {} test rows", train.len(), test.len()),
        );
        Ok((train, test))
    }
}

/// Split `data` at `floor(len * ratio)`
pub fn split_log(data: &CallLog, ratio: f64) -> Result<(CallLog, CallLog)> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "Split ratio must lie strictly between 0 and 1, got {}",
            ratio
        )));
    }

    let cut = (data.len() as f64 * ratio).floor() as usize;
    Ok((data.slice(0..cut)?, data.slice(cut..data.len())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RawCall, CALL_ARRIVAL_DATE};
    use crate::logging::{LogLevel, MemorySink};

    fn tank_with_rows(n: usize) -> DataTank {
        let calls = (0..n)
            .map(|i| RawCall {
                call_arrival_date: "2019/03/14".to_string(),
                call_arrival_time: format!("2019/03/14 09:{:02}:00", i),
                dialer_start_time: format!("2019/03/14 09:{:02}:00", i),
                dialer_call_arrival_time: 32400.0 + 60.0 * i as f64,
                day_of_week: None,
            })
            .collect();
        let mut tank = DataTank::new().with_log(ErrorLog::muted());
        tank.store_raw("DataTank::load_data", RawCallLog::new(calls))
            .unwrap();
        tank
    }

    #[test]
    fn test_split_floor() {
        let mut tank = tank_with_rows(10);
        tank.process_data().unwrap();

        let (train, test) = tank.train_test_split(0.66).unwrap();
        assert_eq!(train.len(), 6);
        assert_eq!(test.len(), 4);
        assert_eq!(&train.concat(&test), tank.full_data().unwrap());
    }

    #[test]
    fn test_split_rejects_bad_ratio() {
        let mut tank = tank_with_rows(4);
        tank.process_data().unwrap();
        assert!(tank.train_test_split(0.0).is_err());
        assert!(tank.train_test_split(1.0).is_err());
    }

    #[test]
    fn test_out_of_order_calls_are_logged() {
        let sink = MemorySink::new();
        let mut tank = DataTank::new().with_log(ErrorLog::new(sink.clone()));

        assert!(tank.process_data().is_err());
        assert!(tank.train_test_split(0.5).is_err());

        let errors = sink.entries_at(LogLevel::Error);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].operation, "DataTank::process_data");
        assert_eq!(errors[0].message, "Unable to process data");
    }

    #[test]
    fn test_failed_processing_keeps_previous_result() {
        let mut tank = tank_with_rows(3);
        let first = tank.process_data().unwrap();

        tank.raw = Some(RawCallLog::new(vec![RawCall {
            call_arrival_date: "not a date".to_string(),
            call_arrival_time: "2019/03/14 09:00:00".to_string(),
            dialer_start_time: "2019/03/14 09:00:00".to_string(),
            dialer_call_arrival_time: 1.0,
            day_of_week: None,
        }]));
        match tank.process_data() {
            Err(ForecastError::ParseError { column, .. }) => assert_eq!(column, CALL_ARRIVAL_DATE),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert_eq!(tank.full_data(), Some(&first));
    }

    #[test]
    fn test_loads_are_logged_under_their_operation() {
        use crate::data::{CALL_ARRIVAL_TIME, DIALER_CALL_ARRIVAL_TIME, DIALER_START_TIME};
        use polars::prelude::{NamedFrom, Series};

        let stamps = ["2019-03-14 09:00:00", "2019-03-14 09:01:00"];
        let df = DataFrame::new(vec![
            Series::new(CALL_ARRIVAL_DATE, &["2019-03-14", "2019-03-14"]),
            Series::new(CALL_ARRIVAL_TIME, &stamps),
            Series::new(DIALER_START_TIME, &stamps),
            Series::new(DIALER_CALL_ARRIVAL_TIME, &[32400.0, 32460.0]),
        ])
        .unwrap();

        let sink = MemorySink::new();
        let mut tank = DataTank::new().with_log(ErrorLog::new(sink.clone()));
        assert_eq!(tank.load_frame(&df).unwrap().len(), 2);

        let info = sink.entries_at(LogLevel::Info);
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].operation, "DataTank::load_frame");
        assert_eq!(info[0].message, "Loaded 2 rows");
    }
}
