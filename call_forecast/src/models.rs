//! Numeric models that back the heavier strategies
//!
//! The smoothing families live in `call_math`; the models here need state
//! that only makes sense next to the strategies using them.

pub mod arima;
pub mod lstm;

pub use arima::{ArimaModel, TrainedArimaModel};
pub use lstm::{sliding_windows, LstmNetwork, MinMaxScaler};
