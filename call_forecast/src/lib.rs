//! # Call Forecast
//!
//! Forecasting of the time between consecutive calls arriving at a call
//! center.
//!
//! ## Features
//!
//! - Loading of raw call logs from delimited files
//! - A feature pipeline deriving inter-arrival intervals, weekday, interval
//!   of the day and a minute alignment key
//! - Interchangeable forecasting strategies behind one fit/predict contract
//! - A weekly seasonal forecaster over a minute-resolution timeline
//! - MSE/RMSE scoring and descriptive statistics of the call log
//!
//! ## Quick Start
//!
//! ```no_run
//! use call_forecast::data_tank::DataTank;
//! use call_forecast::metrics::ValidationMetric;
//! use call_forecast::strategies::{ForecastStrategy, SimpleAverageForecast};
//!
//! # fn main() -> call_forecast::Result<()> {
//! let mut tank = DataTank::new();
//! tank.load_data("calls.csv")?;
//! tank.process_data()?;
//! let (train, test) = tank.train_test_split(0.66)?;
//!
//! let mut model = SimpleAverageForecast::new();
//! model.fit(&train)?;
//! let predicted = model.predict(&test)?;
//!
//! let scores = ValidationMetric::evaluate_logs(&test, &predicted)?;
//! println!("{}", scores);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod data_tank;
pub mod eda;
pub mod error;
pub mod features;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod strategies;

// Re-export commonly used types
pub use crate::config::PredictorConfig;
pub use crate::data::{CallLog, CallRecord, DataLoader, IntervalOfDay, RawCallLog};
pub use crate::data_tank::DataTank;
pub use crate::eda::Eda;
pub use crate::error::{ForecastError, Result};
pub use crate::features::FeaturePipeline;
pub use crate::logging::{init_tracing, ErrorLog};
pub use crate::metrics::{ErrorMetrics, ValidationMetric};
pub use crate::pipeline::{compare_strategies, evaluate_strategy, StrategyReport};
pub use crate::strategies::{ForecastStrategy, SeasonalForecast, StrategyKind};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
