//! Ordinary least squares via the normal equations.
//!
//! For a design matrix `X` (rows × k, no intercept column) and targets `y` we
//! prepend a column of ones and solve
//!
//! ```text
//! β = (Xbᵀ Xb)⁻¹ Xbᵀ y
//! ```
//!
//! with an explicit inverse (see `linalg::invert`). The resulting
//! `Coefficients` are `[intercept, b1, ..., bk]`.
//!
//! Callers are responsible for complete-case filtering; this module only sees
//! fully observed rows.

use nalgebra::{DMatrix, DVector};

use crate::domain::{Coefficients, MIN_REGRESSION_ROWS};
use crate::error::EngineError;
use crate::math::linalg::{invert, multiply, transpose};

/// Fit `y ≈ b0 + Σ bi·xi`.
pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<Coefficients, EngineError> {
    let rows = x.nrows();
    if rows < MIN_REGRESSION_ROWS {
        return Err(EngineError::InsufficientSamples { rows });
    }
    if y.len() != rows {
        return Err(EngineError::ShapeMismatch {
            expected: rows,
            got: y.len(),
        });
    }
    if x.ncols() == 0 {
        return Err(EngineError::ShapeMismatch {
            expected: 1,
            got: 0,
        });
    }

    let xb = with_intercept(x);
    let xt = transpose(&xb);
    let xtx = multiply(&xt, &xb)?;
    let xtx_inv = invert(&xtx)?;
    let y_col = DMatrix::from_column_slice(rows, 1, y.as_slice());
    let xty = multiply(&xt, &y_col)?;
    let beta = multiply(&xtx_inv, &xty)?;

    let values: Vec<f64> = beta.column(0).iter().copied().collect();
    if values.iter().any(|v| !v.is_finite()) {
        return Err(EngineError::NumericalFailure(
            "non-finite regression coefficient".to_string(),
        ));
    }
    Ok(Coefficients::new(values))
}

/// Evaluate `coeffs[0] + Σ coeffs[i+1] · features[i]`.
pub fn predict(coeffs: &Coefficients, features: &[f64]) -> Result<f64, EngineError> {
    let slopes = coeffs.slopes();
    if coeffs.is_empty() || slopes.len() != features.len() {
        return Err(EngineError::ShapeMismatch {
            expected: slopes.len(),
            got: features.len(),
        });
    }
    Ok(coeffs.intercept()
        + slopes
            .iter()
            .zip(features)
            .map(|(b, x)| b * x)
            .sum::<f64>())
}

fn with_intercept(x: &DMatrix<f64>) -> DMatrix<f64> {
    let (rows, cols) = x.shape();
    DMatrix::from_fn(rows, cols + 1, |r, c| if c == 0 { 1.0 } else { x[(r, c - 1)] })
}
