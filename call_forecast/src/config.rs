//! Tunable parameters for the data tank and every strategy
//!
//! All sections default to the values the forecasters were calibrated with,
//! so an empty JSON object yields a working configuration.

use crate::error::{ForecastError, Result};
use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Band layout used to bucket call times into intervals of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayBands {
    /// Morning, afternoon, evening and night; 00:00 to 07:00 stays unbucketed
    #[default]
    Literal,
    /// The four literal bands plus `late_night` for every remaining time
    WithLateNight,
}

/// Simple exponential smoothing settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub level: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { level: 0.6 }
    }
}

/// Holt linear trend settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoubleSmoothingConfig {
    pub level: f64,
    pub slope: f64,
}

impl Default for DoubleSmoothingConfig {
    fn default() -> Self {
        Self {
            level: 0.365,
            slope: 0.0000001,
        }
    }
}

/// Holt-Winters windowing and smoothing settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonalConfig {
    /// Weeks in the training window
    pub num_train_weeks: usize,
    /// Season length in minutes
    pub period: usize,
    /// Level smoothing
    pub level: f64,
    /// Seasonal smoothing
    pub seasonal: f64,
    /// Fit on the Box-Cox scale
    pub use_boxcox: bool,
    /// Fill value for minutes without a call
    pub sentinel: f64,
}

impl Default for SeasonalConfig {
    fn default() -> Self {
        Self {
            num_train_weeks: 1,
            period: 10080,
            level: 0.1,
            seasonal: 0.1,
            use_boxcox: true,
            sentinel: 1.0,
        }
    }
}

/// ARIMA estimation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSeriesConfig {
    /// Estimate on train ++ test instead of train alone
    pub fit_on_holdout: bool,
    /// Nelder-Mead iteration cap
    pub max_iter: usize,
}

impl Default for TimeSeriesConfig {
    fn default() -> Self {
        Self {
            fit_on_holdout: true,
            max_iter: 1000,
        }
    }
}

/// Recurrent sequence model settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub window: usize,
    pub hidden_size: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub seed: u64,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            window: 2,
            hidden_size: 2,
            epochs: 1000,
            learning_rate: 0.01,
            seed: 42,
        }
    }
}

/// Top level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Share of rows that go to the training partition
    pub split_ratio: f64,
    pub smoothing: SmoothingConfig,
    pub double_smoothing: DoubleSmoothingConfig,
    pub seasonal: SeasonalConfig,
    pub time_series: TimeSeriesConfig,
    pub sequence: SequenceConfig,
    pub bands: DayBands,
    pub logging: LogConfig,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            split_ratio: 0.66,
            smoothing: SmoothingConfig::default(),
            double_smoothing: DoubleSmoothingConfig::default(),
            seasonal: SeasonalConfig::default(),
            time_series: TimeSeriesConfig::default(),
            sequence: SequenceConfig::default(),
            bands: DayBands::default(),
            logging: LogConfig::default(),
        }
    }
}

impl PredictorConfig {
    /// Read and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ForecastError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a JSON configuration string
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter range
    pub fn validate(&self) -> Result<()> {
        open_unit("split_ratio", self.split_ratio)?;
        closed_unit("smoothing.level", self.smoothing.level)?;
        closed_unit("double_smoothing.level", self.double_smoothing.level)?;
        closed_unit("double_smoothing.slope", self.double_smoothing.slope)?;
        closed_unit("seasonal.level", self.seasonal.level)?;
        closed_unit("seasonal.seasonal", self.seasonal.seasonal)?;

        if self.seasonal.num_train_weeks == 0 {
            return Err(ForecastError::ConfigError(
                "seasonal.num_train_weeks must be at least 1".to_string(),
            ));
        }
        if self.seasonal.period < 2 {
            return Err(ForecastError::ConfigError(format!(
                "seasonal.period must be at least 2, got {}",
                self.seasonal.period
            )));
        }
        if self.seasonal.use_boxcox && self.seasonal.sentinel <= 0.0 {
            return Err(ForecastError::ConfigError(
                "seasonal.sentinel must be positive when use_boxcox is set".to_string(),
            ));
        }
        if self.time_series.max_iter == 0 {
            return Err(ForecastError::ConfigError(
                "time_series.max_iter must be positive".to_string(),
            ));
        }

        let seq = &self.sequence;
        if seq.window == 0 || seq.hidden_size == 0 || seq.epochs == 0 {
            return Err(ForecastError::ConfigError(
                "sequence.window, hidden_size and epochs must be positive".to_string(),
            ));
        }
        if !(seq.learning_rate > 0.0 && seq.learning_rate.is_finite()) {
            return Err(ForecastError::ConfigError(format!(
                "sequence.learning_rate must be positive, got {}",
                seq.learning_rate
            )));
        }

        Ok(())
    }
}

fn open_unit(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ForecastError::ConfigError(format!(
            "{} must lie strictly between 0 and 1, got {}",
            name, value
        )))
    }
}

fn closed_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ForecastError::ConfigError(format!(
            "{} must lie between 0 and 1, got {}",
            name, value
        )))
    }
}
