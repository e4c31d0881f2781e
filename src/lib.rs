//! # pcatr
//!
//! Prediction of call arrival times. This package bundles the workspace
//! crates:
//!
//! - [`call_math`]: numeric kernels (error metrics, exponential smoothing,
//!   Box-Cox, Nelder-Mead)
//! - [`call_forecast`]: call log loading, feature derivation, forecasting
//!   strategies and evaluation
//!
//! ```no_run
//! use pcatr::call_forecast::{compare_strategies, DataTank, ErrorLog, PredictorConfig};
//!
//! # fn main() -> pcatr::call_forecast::Result<()> {
//! let config = PredictorConfig::default();
//! let mut tank = DataTank::new().with_bands(config.bands);
//! tank.load_data("calls.csv")?;
//! tank.process_data()?;
//! let (train, test) = tank.train_test_split(config.split_ratio)?;
//!
//! for report in compare_strategies(&config, &ErrorLog::default(), &train, &test) {
//!     println!("{}", report);
//! }
//! # Ok(())
//! # }
//! ```

pub use call_forecast;
pub use call_math;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
