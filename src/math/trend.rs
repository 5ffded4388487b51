//! Single-series time trend.
//!
//! Fits a least-squares line through the non-missing values of one series,
//! indexed `0..n` in order, and evaluates it one step past the end. Used as a
//! baseline next to the multi-variable regression.

use crate::domain::Series;

/// Trend forecast rounded to 2 decimals; `None` for an all-missing series.
pub fn linear_trend_forecast(series: &Series) -> Option<f64> {
    let clean: Vec<f64> = series.present().filter(|v| v.is_finite()).collect();
    if clean.is_empty() {
        return None;
    }

    let n = clean.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = clean.iter().sum::<f64>() / n;

    let (num, den) = clean
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });

    let slope = if den != 0.0 { num / den } else { 0.0 };
    let intercept = y_mean - slope * x_mean;
    Some(super::round2(slope * n + intercept))
}
