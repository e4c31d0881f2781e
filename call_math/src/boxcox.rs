//! Box-Cox power transformation.
//!
//! Used as a variance-stabilising step before seasonal smoothing.

use crate::{MathError, Result};

const LAMBDA_EPS: f64 = 1e-10;

/// Apply Box-Cox transformation with a given lambda.
///
/// For lambda != 0: y = (x^lambda - 1) / lambda
/// For lambda == 0: y = ln(x)
pub fn boxcox(series: &[f64], lambda: f64) -> Result<Vec<f64>> {
    ensure_positive(series)?;
    Ok(series.iter().map(|&x| transform(x, lambda)).collect())
}

/// Inverse Box-Cox transformation.
///
/// Values outside the domain of the inverse are clamped to zero.
pub fn inv_boxcox(transformed: &[f64], lambda: f64) -> Vec<f64> {
    transformed
        .iter()
        .map(|&y| {
            if lambda.abs() < LAMBDA_EPS {
                y.exp()
            } else {
                let base = lambda * y + 1.0;
                if base <= 0.0 {
                    0.0
                } else {
                    base.powf(1.0 / lambda)
                }
            }
        })
        .collect()
}

/// Find the lambda maximising the Box-Cox profile log-likelihood.
///
/// Coarse grid over [-2, 2] in steps of 0.01, then a finer pass around the
/// best coarse value. Constant series fall back to lambda = 1.
pub fn boxcox_lambda(series: &[f64]) -> Result<f64> {
    ensure_positive(series)?;
    if series.len() < 2 {
        return Err(MathError::InsufficientData(
            "Box-Cox lambda estimation needs at least 2 values".to_string(),
        ));
    }

    let log_sum: f64 = series.iter().map(|x| x.ln()).sum();
    let mut best_lambda = 1.0;
    let mut best_llf = f64::NEG_INFINITY;

    for i in -200..=200 {
        let lambda = i as f64 / 100.0;
        let llf = log_likelihood(series, lambda, log_sum);
        if llf > best_llf {
            best_llf = llf;
            best_lambda = lambda;
        }
    }

    let start = (best_lambda - 0.01).max(-2.0);
    let end = (best_lambda + 0.01).min(2.0);
    for i in 0..=100 {
        let lambda = start + (end - start) * i as f64 / 100.0;
        let llf = log_likelihood(series, lambda, log_sum);
        if llf > best_llf {
            best_llf = llf;
            best_lambda = lambda;
        }
    }

    Ok(best_lambda)
}

fn transform(x: f64, lambda: f64) -> f64 {
    if lambda.abs() < LAMBDA_EPS {
        x.ln()
    } else {
        (x.powf(lambda) - 1.0) / lambda
    }
}

fn log_likelihood(series: &[f64], lambda: f64, log_sum: f64) -> f64 {
    let n = series.len() as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for &x in series {
        let y = transform(x, lambda);
        sum += y;
        sum_sq += y * y;
    }
    let mean = sum / n;
    let variance = sum_sq / n - mean * mean;
    if !variance.is_finite() || variance <= 0.0 {
        return f64::NEG_INFINITY;
    }

    -0.5 * n * variance.ln() + (lambda - 1.0) * log_sum
}

fn ensure_positive(series: &[f64]) -> Result<()> {
    if let Some(bad) = series.iter().find(|&&x| x <= 0.0 || x.is_nan()) {
        return Err(MathError::InvalidInput(format!(
            "Box-Cox requires strictly positive values, found {}",
            bad
        )));
    }
    Ok(())
}
