//! Regressor scoring.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub sample_count: usize,
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    /// Coefficient of determination; 1.0 for a perfect fit, can go
    /// negative for a fit worse than predicting the mean.
    pub r2: f64,
    /// Mean absolute percentage error over samples with non-zero actuals.
    pub mape: f64,
}

pub fn compute(predicted: &[f64], actual: &[f64]) -> RegressionMetrics {
    debug_assert_eq!(predicted.len(), actual.len());
    let n = actual.len();
    if n == 0 {
        return RegressionMetrics::default();
    }
    let nf = n as f64;

    let mae = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).abs())
        .sum::<f64>()
        / nf;
    let mse = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a) * (p - a))
        .sum::<f64>()
        / nf;

    let mean_actual = actual.iter().sum::<f64>() / nf;
    let ss_res = mse * nf;
    let ss_tot = actual
        .iter()
        .map(|a| (a - mean_actual) * (a - mean_actual))
        .sum::<f64>();
    let r2 = if ss_tot == 0.0 {
        // Constant actuals: perfect iff residuals vanish.
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    };

    let mut mape_sum = 0.0;
    let mut mape_count = 0usize;
    for (p, a) in predicted.iter().zip(actual) {
        if *a != 0.0 {
            mape_sum += ((p - a) / a).abs();
            mape_count += 1;
        }
    }

    RegressionMetrics {
        sample_count: n,
        mae,
        mse,
        rmse: mse.sqrt(),
        r2,
        mape: if mape_count > 0 {
            mape_sum / mape_count as f64
        } else {
            0.0
        },
    }
}
