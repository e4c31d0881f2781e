//! Derivative-free minimisation
//!
//! A bounded Nelder-Mead simplex search, enough for the two- and
//! three-parameter likelihood surfaces the forecasters estimate.

use crate::{MathError, Result};

/// Configuration for Nelder-Mead optimization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Convergence tolerance on the spread of objective values
    pub tolerance: f64,
    /// Reflection coefficient
    pub alpha: f64,
    /// Expansion coefficient
    pub gamma: f64,
    /// Contraction coefficient
    pub rho: f64,
    /// Shrinkage coefficient
    pub sigma: f64,
    /// Initial simplex step
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Result of a Nelder-Mead run
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Whether the tolerance was reached before `max_iter`
    pub converged: bool,
}

/// Minimise `objective` starting from `initial`, keeping every coordinate
/// inside the matching `(min, max)` pair of `bounds` when given
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> Result<Minimum>
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return Err(MathError::InvalidInput(
            "Cannot optimise over zero parameters".to_string(),
        ));
    }
    if let Some(b) = bounds {
        if b.len() != n {
            return Err(MathError::LengthMismatch {
                expected: n,
                actual: b.len(),
            });
        }
    }

    let clamp = |point: Vec<f64>| -> Vec<f64> {
        match bounds {
            Some(b) => point
                .iter()
                .zip(b.iter())
                .map(|(&x, &(lo, hi))| x.clamp(lo, hi))
                .collect(),
            None => point,
        }
    };
    let evaluate = |point: &[f64]| -> f64 {
        let value = objective(point);
        if value.is_nan() {
            f64::INFINITY
        } else {
            value
        }
    };

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(clamp(initial.to_vec()));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        let step = if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        simplex.push(clamp(vertex));
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| evaluate(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        if (values[worst] - values[best]).abs() < config.tolerance {
            converged = true;
            break;
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| {
                simplex
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != worst)
                    .map(|(_, v)| v[j])
                    .sum::<f64>()
                    / n as f64
            })
            .collect();

        let towards = |from: &[f64], coefficient: f64| -> Vec<f64> {
            clamp(
                centroid
                    .iter()
                    .zip(from.iter())
                    .map(|(c, x)| c + coefficient * (x - c))
                    .collect(),
            )
        };

        let reflected = towards(&simplex[worst], -config.alpha);
        let reflected_value = evaluate(&reflected);

        if reflected_value < values[best] {
            let expanded = towards(&reflected, config.gamma);
            let expanded_value = evaluate(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        let (contracted, contracted_value) = if reflected_value < values[worst] {
            let point = towards(&reflected, config.rho);
            let value = evaluate(&point);
            (point, value)
        } else {
            let point = towards(&simplex[worst], config.rho);
            let value = evaluate(&point);
            (point, value)
        };

        if contracted_value < values[worst].min(reflected_value) {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        // Shrink every vertex towards the best one
        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i == best {
                continue;
            }
            let shrunk: Vec<f64> = anchor
                .iter()
                .zip(simplex[i].iter())
                .map(|(a, x)| a + config.sigma * (x - a))
                .collect();
            simplex[i] = clamp(shrunk);
            values[i] = evaluate(&simplex[i]);
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    Ok(Minimum {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    })
}
