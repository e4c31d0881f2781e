//! Exponential smoothing kernels
//!
//! Contains the three smoothing families used by the forecasters:
//! - Simple Exponential Smoothing (level only)
//! - Holt's linear trend method (level and trend)
//! - Additive Holt-Winters without trend (level and seasonal indices)
//!
//! Parameters are fixed by the caller; nothing here optimises them.

use crate::{check_unit_interval, MathError, Result};

/// Simple exponential smoothing with a fixed smoothing level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleExponentialSmoothing {
    alpha: f64,
}

/// State of a fitted simple exponential smoothing model
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedLevel {
    /// Final smoothed level
    pub level: f64,
}

impl SimpleExponentialSmoothing {
    /// Create a new model with smoothing level `alpha`
    pub fn new(alpha: f64) -> Result<Self> {
        check_unit_interval("alpha", alpha)?;
        Ok(Self { alpha })
    }

    /// Smoothing level
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Run the level recursion over `values`, starting from the first observation
    pub fn fit(&self, values: &[f64]) -> Result<SmoothedLevel> {
        let (&first, rest) = values.split_first().ok_or_else(|| {
            MathError::InsufficientData("Simple smoothing needs at least one value".to_string())
        })?;

        let mut level = first;
        for &value in rest {
            level = self.alpha * value + (1.0 - self.alpha) * level;
        }

        Ok(SmoothedLevel { level })
    }
}

impl SmoothedLevel {
    /// Flat forecast at the last level
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        vec![self.level; horizon]
    }
}

/// Holt's linear trend method
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoltLinear {
    alpha: f64,
    beta: f64,
}

/// State of a fitted Holt model
#[derive(Debug, Clone, PartialEq)]
pub struct HoltState {
    /// Final level
    pub level: f64,
    /// Final trend
    pub trend: f64,
}

impl HoltLinear {
    /// Create a new model with level smoothing `alpha` and trend smoothing `beta`
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        check_unit_interval("alpha", alpha)?;
        check_unit_interval("beta", beta)?;
        Ok(Self { alpha, beta })
    }

    /// Fit the model.
    ///
    /// The level starts at the first observation and the trend at the mean
    /// first difference of the whole series.
    pub fn fit(&self, values: &[f64]) -> Result<HoltState> {
        let n = values.len();
        if n < 2 {
            return Err(MathError::InsufficientData(format!(
                "Holt smoothing needs at least 2 values, got {}",
                n
            )));
        }

        let mut level = values[0];
        let mut trend = (values[n - 1] - values[0]) / (n - 1) as f64;

        for &value in &values[1..] {
            let previous = level;
            level = self.alpha * value + (1.0 - self.alpha) * (level + trend);
            trend = self.beta * (level - previous) + (1.0 - self.beta) * trend;
        }

        Ok(HoltState { level, trend })
    }
}

impl HoltState {
    /// Linear extrapolation `level + h * trend` for `h = 1..=horizon`
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        (1..=horizon)
            .map(|h| self.level + h as f64 * self.trend)
            .collect()
    }
}

/// Additive Holt-Winters without a trend component
///
/// - Level: `l_t = α(y_t - s_{t-m}) + (1-α)l_{t-1}`
/// - Seasonal: `s_t = γ(y_t - l_t) + (1-γ)s_{t-m}`
/// - Forecast: `ŷ_{t+h} = l_t + s_{t+h-m}`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdditiveHoltWinters {
    alpha: f64,
    gamma: f64,
    period: usize,
}

/// State of a fitted additive Holt-Winters model
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalState {
    /// Final level
    pub level: f64,
    /// Seasonal indices, indexed by `t % period`
    pub seasonals: Vec<f64>,
    /// Number of observations the model was fitted on
    pub observations: usize,
}

impl AdditiveHoltWinters {
    /// Create a new model with level smoothing `alpha`, seasonal smoothing `gamma`
    /// and season length `period`
    pub fn new(alpha: f64, gamma: f64, period: usize) -> Result<Self> {
        check_unit_interval("alpha", alpha)?;
        check_unit_interval("gamma", gamma)?;
        if period < 2 {
            return Err(MathError::InvalidInput(format!(
                "Seasonal period must be at least 2, got {}",
                period
            )));
        }
        Ok(Self {
            alpha,
            gamma,
            period,
        })
    }

    /// Season length
    pub fn period(&self) -> usize {
        self.period
    }

    /// Fit the model, initialising from the first complete season
    pub fn fit(&self, values: &[f64]) -> Result<SeasonalState> {
        let m = self.period;
        if values.len() < m {
            return Err(MathError::InsufficientData(format!(
                "Holt-Winters needs at least one full season ({} values), got {}",
                m,
                values.len()
            )));
        }

        let mut level = values[..m].iter().sum::<f64>() / m as f64;
        let mut seasonals: Vec<f64> = values[..m].iter().map(|y| y - level).collect();

        for (t, &y) in values.iter().enumerate().skip(m) {
            let idx = t % m;
            let s = seasonals[idx];
            level = self.alpha * (y - s) + (1.0 - self.alpha) * level;
            seasonals[idx] = self.gamma * (y - level) + (1.0 - self.gamma) * s;
        }

        Ok(SeasonalState {
            level,
            seasonals,
            observations: values.len(),
        })
    }
}

impl SeasonalState {
    /// Forecast `horizon` steps past the end of the fitted sample
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        let m = self.seasonals.len();
        (1..=horizon)
            .map(|h| self.level + self.seasonals[(self.observations + h - 1) % m])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ses_level() {
        let model = SimpleExponentialSmoothing::new(0.5).unwrap();
        let state = model.fit(&[2.0, 4.0, 8.0]).unwrap();

        // 2 -> 3 -> 5.5
        assert_relative_eq!(state.level, 5.5);
        assert_eq!(state.forecast(3), vec![5.5; 3]);
    }

    #[test]
    fn test_ses_rejects_bad_input() {
        assert!(SimpleExponentialSmoothing::new(1.2).is_err());
        let model = SimpleExponentialSmoothing::new(0.6).unwrap();
        assert!(model.fit(&[]).is_err());
    }

    #[test]
    fn test_holt_follows_linear_series() {
        let values: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * i as f64).collect();
        let state = HoltLinear::new(0.365, 0.0000001).unwrap().fit(&values).unwrap();

        assert_relative_eq!(state.trend, 2.0, epsilon = 1e-9);
        let forecast = state.forecast(2);
        assert_relative_eq!(forecast[0], 23.0, epsilon = 1e-9);
        assert_relative_eq!(forecast[1], 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_holt_needs_two_values() {
        let model = HoltLinear::new(0.5, 0.1).unwrap();
        assert!(model.fit(&[1.0]).is_err());
    }

    #[test]
    fn test_holt_winters_repeats_clean_season() {
        let season = [1.0, 5.0, 3.0];
        let values: Vec<f64> = season.iter().cycle().take(9).copied().collect();
        let state = AdditiveHoltWinters::new(0.1, 0.1, 3)
            .unwrap()
            .fit(&values)
            .unwrap();

        let forecast = state.forecast(6);
        for (h, value) in forecast.iter().enumerate() {
            assert_relative_eq!(*value, season[h % 3], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_holt_winters_horizon_is_exact() {
        let values: Vec<f64> = (0..20).map(|i| (i % 4) as f64 + 1.0).collect();
        let state = AdditiveHoltWinters::new(0.1, 0.1, 4)
            .unwrap()
            .fit(&values)
            .unwrap();
        assert_eq!(state.forecast(7).len(), 7);
        assert_eq!(state.observations, values.len());
    }

    #[test]
    fn test_holt_winters_short_series() {
        let model = AdditiveHoltWinters::new(0.1, 0.1, 5).unwrap();
        assert!(matches!(
            model.fit(&[1.0, 2.0]),
            Err(MathError::InsufficientData(_))
        ));
        assert!(AdditiveHoltWinters::new(0.1, 0.1, 1).is_err());
    }
}
