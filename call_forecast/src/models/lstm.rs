//! Single-layer LSTM regressor for one numeric sequence
//!
//! Input size 1, a configurable hidden size and a linear head producing one
//! value from the last hidden state. Trained full-batch on mean squared error
//! with Adam, gradients by backpropagation through time.

use crate::error::{ForecastError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};

/// Every `(history, next)` pair of a sequence, with `history` of length `window`
pub fn sliding_windows(values: &[f64], window: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    if window == 0 || values.len() <= window {
        return (Vec::new(), Vec::new());
    }

    values
        .windows(window + 1)
        .map(|w| (w[..window].to_vec(), w[window]))
        .unzip()
}

/// Min-max scaling onto `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    min: f64,
    range: f64,
}

impl MinMaxScaler {
    /// Fit on `values`; a constant sequence gets a unit range
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::InsufficientData(
                "Cannot scale an empty sequence".to_string(),
            ));
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() || !max.is_finite() {
            return Err(ForecastError::DataError(
                "Sequence contains non-finite values".to_string(),
            ));
        }
        let range = if max - min > f64::EPSILON { max - min } else { 1.0 };
        Ok(Self { min, range })
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.min) / self.range
    }

    pub fn inverse(&self, value: f64) -> f64 {
        value * self.range + self.min
    }
}

/// Adam optimizer with bias correction
#[derive(Debug, Clone)]
struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    m: Vec<f64>,
    v: Vec<f64>,
    step_count: i32,
}

impl Adam {
    fn new(learning_rate: f64, parameter_count: usize) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            m: vec![0.0; parameter_count],
            v: vec![0.0; parameter_count],
            step_count: 0,
        }
    }

    fn step(&mut self, parameters: &mut [f64], gradients: &[f64]) {
        self.step_count += 1;
        let bias_correction1 = 1.0 - self.beta1.powi(self.step_count);
        let bias_correction2 = 1.0 - self.beta2.powi(self.step_count);

        for (i, (param, &grad)) in parameters.iter_mut().zip(gradients).enumerate() {
            self.m[i] = self.beta1 * self.m[i] + (1.0 - self.beta1) * grad;
            self.v[i] = self.beta2 * self.v[i] + (1.0 - self.beta2) * grad * grad;

            let m_hat = self.m[i] / bias_correction1;
            let v_hat = self.v[i] / bias_correction2;
            *param -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Activations of one time step, kept for the backward pass
struct Step {
    input: f64,
    h_prev: Vec<f64>,
    c_prev: Vec<f64>,
    i: Vec<f64>,
    f: Vec<f64>,
    g: Vec<f64>,
    o: Vec<f64>,
    c: Vec<f64>,
}

/// LSTM network parameters, stored flat:
/// `w_ih (4H) | w_hh (4H x H) | b (4H) | w_fc (H) | b_fc (1)`,
/// gate order input, forget, cell, output
#[derive(Debug, Clone, PartialEq)]
pub struct LstmNetwork {
    hidden: usize,
    params: Vec<f64>,
}

impl LstmNetwork {
    /// Initialise every weight from `U(-1/sqrt(H), 1/sqrt(H))`
    pub fn new(hidden: usize, seed: u64) -> Result<Self> {
        if hidden == 0 {
            return Err(ForecastError::InvalidParameter(
                "LSTM hidden size must be positive".to_string(),
            ));
        }
        let bound = 1.0 / (hidden as f64).sqrt();
        let init = Uniform::new_inclusive(-bound, bound);
        let mut rng = StdRng::seed_from_u64(seed);

        let count = 8 * hidden + 4 * hidden * hidden + hidden + 1;
        let params = (0..count).map(|_| init.sample(&mut rng)).collect();
        Ok(Self { hidden, params })
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden
    }

    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    fn w_hh(&self) -> usize {
        4 * self.hidden
    }

    fn bias(&self) -> usize {
        4 * self.hidden + 4 * self.hidden * self.hidden
    }

    fn w_fc(&self) -> usize {
        self.bias() + 4 * self.hidden
    }

    fn b_fc(&self) -> usize {
        self.w_fc() + self.hidden
    }

    fn run(&self, window: &[f64]) -> (Vec<Step>, Vec<f64>, f64) {
        let hsz = self.hidden;
        let p = &self.params;
        let mut h = vec![0.0; hsz];
        let mut c = vec![0.0; hsz];
        let mut steps = Vec::with_capacity(window.len());

        for &x in window {
            let z: Vec<f64> = (0..4 * hsz)
                .map(|k| {
                    let recurrent: f64 = (0..hsz)
                        .map(|j| p[self.w_hh() + k * hsz + j] * h[j])
                        .sum();
                    p[k] * x + recurrent + p[self.bias() + k]
                })
                .collect();

            let i: Vec<f64> = z[..hsz].iter().map(|&v| sigmoid(v)).collect();
            let f: Vec<f64> = z[hsz..2 * hsz].iter().map(|&v| sigmoid(v)).collect();
            let g: Vec<f64> = z[2 * hsz..3 * hsz].iter().map(|&v| v.tanh()).collect();
            let o: Vec<f64> = z[3 * hsz..].iter().map(|&v| sigmoid(v)).collect();

            let c_next: Vec<f64> = (0..hsz).map(|j| f[j] * c[j] + i[j] * g[j]).collect();
            let h_next: Vec<f64> = (0..hsz).map(|j| o[j] * c_next[j].tanh()).collect();

            steps.push(Step {
                input: x,
                h_prev: std::mem::replace(&mut h, h_next),
                c_prev: std::mem::replace(&mut c, c_next.clone()),
                i,
                f,
                g,
                o,
                c: c_next,
            });
        }

        let output = (0..hsz).map(|j| p[self.w_fc() + j] * h[j]).sum::<f64>() + p[self.b_fc()];
        (steps, h, output)
    }

    /// Network output for one input window
    pub fn forward(&self, window: &[f64]) -> f64 {
        self.run(window).2
    }

    /// Mean squared error over a batch and its gradient
    fn loss_and_gradient(&self, inputs: &[Vec<f64>], targets: &[f64]) -> (f64, Vec<f64>) {
        let hsz = self.hidden;
        let p = &self.params;
        let n = inputs.len() as f64;
        let mut grad = vec![0.0; p.len()];
        let mut loss = 0.0;

        for (window, &target) in inputs.iter().zip(targets) {
            let (steps, h_last, output) = self.run(window);
            let error = output - target;
            loss += error * error;

            let d_out = 2.0 * error / n;
            for j in 0..hsz {
                grad[self.w_fc() + j] += d_out * h_last[j];
            }
            grad[self.b_fc()] += d_out;

            let mut dh: Vec<f64> = (0..hsz).map(|j| d_out * p[self.w_fc() + j]).collect();
            let mut dc = vec![0.0; hsz];

            for step in steps.iter().rev() {
                let mut dz = vec![0.0; 4 * hsz];
                for j in 0..hsz {
                    let tanh_c = step.c[j].tanh();
                    let d_o = dh[j] * tanh_c;
                    dc[j] += dh[j] * step.o[j] * (1.0 - tanh_c * tanh_c);

                    let d_i = dc[j] * step.g[j];
                    let d_g = dc[j] * step.i[j];
                    let d_f = dc[j] * step.c_prev[j];

                    dz[j] = d_i * step.i[j] * (1.0 - step.i[j]);
                    dz[hsz + j] = d_f * step.f[j] * (1.0 - step.f[j]);
                    dz[2 * hsz + j] = d_g * (1.0 - step.g[j] * step.g[j]);
                    dz[3 * hsz + j] = d_o * step.o[j] * (1.0 - step.o[j]);

                    dc[j] *= step.f[j];
                }

                let mut dh_prev = vec![0.0; hsz];
                for (k, &dzk) in dz.iter().enumerate() {
                    grad[k] += dzk * step.input;
                    grad[self.bias() + k] += dzk;
                    for j in 0..hsz {
                        grad[self.w_hh() + k * hsz + j] += dzk * step.h_prev[j];
                        dh_prev[j] += p[self.w_hh() + k * hsz + j] * dzk;
                    }
                }
                dh = dh_prev;
            }
        }

        (loss / n, grad)
    }

    /// Train for `epochs` full-batch Adam steps; returns the loss of each epoch
    pub fn train(
        &mut self,
        inputs: &[Vec<f64>],
        targets: &[f64],
        epochs: usize,
        learning_rate: f64,
    ) -> Result<Vec<f64>> {
        if inputs.is_empty() {
            return Err(ForecastError::InsufficientData(
                "LSTM training needs at least one window".to_string(),
            ));
        }
        if inputs.len() != targets.len() {
            return Err(ForecastError::ShapeMismatch {
                expected: inputs.len(),
                actual: targets.len(),
            });
        }

        let mut optimizer = Adam::new(learning_rate, self.params.len());
        let mut losses = Vec::with_capacity(epochs);
        for _ in 0..epochs {
            let (loss, grad) = self.loss_and_gradient(inputs, targets);
            if !loss.is_finite() {
                return Err(ForecastError::ForecastingError(
                    "LSTM loss became non-finite".to_string(),
                ));
            }
            optimizer.step(&mut self.params, &grad);
            losses.push(loss);
        }

        Ok(losses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sliding_windows_keeps_every_pair() {
        let (x, y) = sliding_windows(&[1.0, 2.0, 3.0, 4.0, 5.0], 2);
        assert_eq!(x, vec![vec![1.0, 2.0], vec![2.0, 3.0], vec![3.0, 4.0]]);
        assert_eq!(y, vec![3.0, 4.0, 5.0]);

        let (x, _) = sliding_windows(&[1.0, 2.0], 2);
        assert!(x.is_empty());
    }

    #[test]
    fn test_scaler_round_trip() {
        let scaler = MinMaxScaler::fit(&[10.0, 20.0, 30.0]).unwrap();
        assert_relative_eq!(scaler.transform(20.0), 0.5);
        assert_relative_eq!(scaler.inverse(scaler.transform(27.0)), 27.0);
        assert!(MinMaxScaler::fit(&[]).is_err());
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let net = LstmNetwork::new(2, 3).unwrap();
        let inputs = vec![vec![0.1, 0.7], vec![0.4, 0.2], vec![0.9, 0.5]];
        let targets = vec![0.3, 0.8, 0.1];
        let (_, grad) = net.loss_and_gradient(&inputs, &targets);

        let eps = 1e-6;
        for k in 0..net.parameter_count() {
            let mut plus = net.clone();
            plus.params[k] += eps;
            let mut minus = net.clone();
            minus.params[k] -= eps;
            let numeric = (plus.loss_and_gradient(&inputs, &targets).0
                - minus.loss_and_gradient(&inputs, &targets).0)
                / (2.0 * eps);
            assert!(
                (numeric - grad[k]).abs() < 1e-6,
                "param {}: analytic {} numeric {}",
                k,
                grad[k],
                numeric
            );
        }
    }

    #[test]
    fn test_training_reduces_loss() {
        let series: Vec<f64> = (0..40).map(|i| ((i as f64) * 0.3).sin() * 0.5 + 0.5).collect();
        let (x, y) = sliding_windows(&series, 2);
        let mut net = LstmNetwork::new(2, 42).unwrap();

        let losses = net.train(&x, &y, 300, 0.01).unwrap();
        assert_eq!(losses.len(), 300);
        assert!(losses[299] < losses[0]);
    }

    #[test]
    fn test_seeded_initialisation_is_reproducible() {
        assert_eq!(LstmNetwork::new(2, 9).unwrap(), LstmNetwork::new(2, 9).unwrap());
        assert!(LstmNetwork::new(0, 9).is_err());
    }
}
