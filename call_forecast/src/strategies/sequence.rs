//! Recurrent sequence model over the interval column

use super::{fitted, ForecastStrategy};
use crate::config::SequenceConfig;
use crate::data::CallLog;
use crate::error::{ForecastError, Result};
use crate::logging::ErrorLog;
use crate::models::lstm::{sliding_windows, LstmNetwork, MinMaxScaler};

const COMPONENT: &str = "sequence_model";
const NAME: &str = "SequenceModel";

#[derive(Debug, Clone)]
struct Fitted {
    network: LstmNetwork,
    scaler: MinMaxScaler,
    /// Last `window` scaled training values
    tail: Vec<f64>,
    final_loss: f64,
}

/// LSTM trained on (window -> next value) pairs of the training intervals.
///
/// The prediction for test row `j` is made from the `window` actual values
/// preceding it, taken from the end of training and then from earlier test
/// rows.
#[derive(Debug, Clone)]
pub struct SequenceForecast {
    config: SequenceConfig,
    log: ErrorLog,
    fitted: Option<Fitted>,
}

impl Default for SequenceForecast {
    fn default() -> Self {
        Self::new(SequenceConfig::default())
    }
}

impl SequenceForecast {
    pub fn new(config: SequenceConfig) -> Self {
        Self {
            config,
            log: ErrorLog::default(),
            fitted: None,
        }
    }

    pub fn with_log(mut self, log: ErrorLog) -> Self {
        self.log = log;
        self
    }

    /// Mean squared error of the last training epoch, on the scaled values
    pub fn final_loss(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.final_loss)
    }

    fn train(&self, train: &CallLog) -> Result<Fitted> {
        let window = self.config.window;
        if window == 0 {
            return Err(ForecastError::InvalidParameter(
                "Sequence window must be positive".to_string(),
            ));
        }
        if train.len() <= window {
            return Err(ForecastError::InsufficientData(format!(
                "{} needs more than {} training rows, got {}",
                NAME,
                window,
                train.len()
            )));
        }

        let values = train.intervals();
        let scaler = MinMaxScaler::fit(&values)?;
        let scaled: Vec<f64> = values.iter().map(|&v| scaler.transform(v)).collect();
        let (inputs, targets) = sliding_windows(&scaled, window);

        let mut network = LstmNetwork::new(self.config.hidden_size, self.config.seed)?;
        let losses = network.train(
            &inputs,
            &targets,
            self.config.epochs,
            self.config.learning_rate,
        )?;
        let final_loss = losses.last().copied().unwrap_or(f64::NAN);

        self.log.info(
            COMPONENT,
            "SequenceForecast::fit",
            &format!(
                "Trained on {} windows for {} epochs, loss {:.5}",
                inputs.len(),
                self.config.epochs,
                final_loss
            ),
        );

        Ok(Fitted {
            network,
            scaler,
            tail: scaled[scaled.len() - window..].to_vec(),
            final_loss,
        })
    }

    fn forecast(&self, fitted: &Fitted, test: &CallLog) -> Result<CallLog> {
        let window = self.config.window;
        let mut history = fitted.tail.clone();
        history.extend(test.iter().map(|r| fitted.scaler.transform(r.call_difference_interval)));

        let values: Vec<f64> = (0..test.len())
            .map(|j| {
                let scaled = fitted.network.forward(&history[j..j + window]);
                fitted.scaler.inverse(scaled)
            })
            .collect();

        test.with_intervals(&values)
    }
}

impl ForecastStrategy for SequenceForecast {
    fn name(&self) -> &str {
        NAME
    }

    fn fit(&mut self, train: &CallLog) -> Result<()> {
        self.fitted = None;
        let fitted = self.log.trap(
            COMPONENT,
            "SequenceForecast::fit",
            "Unable to train model",
            self.train(train),
        )?;
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, test: &CallLog) -> Result<CallLog> {
        let forecast = fitted(&self.fitted, NAME).and_then(|f| self.forecast(f, test));
        self.log.trap(
            COMPONENT,
            "SequenceForecast::predict",
            "Unable to predict forecast",
            forecast,
        )
    }

    fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn describe(&self) -> String {
        let c = &self.config;
        let shape = format!(
            "{} (window={}, hidden={}, epochs={}, lr={})",
            NAME, c.window, c.hidden_size, c.epochs, c.learning_rate
        );
        match &self.fitted {
            Some(f) => format!("{}: final loss {:.5}", shape, f.final_loss),
            None => format!("{}: not fitted", shape),
        }
    }
}
