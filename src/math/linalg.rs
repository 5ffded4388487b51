//! Dense matrix helpers used by the regression engine.
//!
//! Matrices are `nalgebra::DMatrix<f64>`; the problems here are tiny
//! (rows <= 10, columns <= 6), so everything is straightforward dense code.
//!
//! `invert` is plain Gauss-Jordan elimination with the pivot taken as `M[i][i]`
//! (no row exchange). A pivot whose magnitude falls below `PIVOT_TOLERANCE`
//! times the original diagonal entry of its column is reported as
//! `SingularMatrix` instead of letting NaN/Inf leak into the coefficients.
//! The test is per column, so a predictor measured in small numbers next to
//! one measured in large numbers is not mistaken for a redundant one.

use nalgebra::DMatrix;

use crate::error::EngineError;

/// Magnitude, relative to the column's original diagonal, below which a pivot counts as zero.
pub const PIVOT_TOLERANCE: f64 = 1e-9;

/// Matrix product `A · B`.
pub fn multiply(a: &DMatrix<f64>, b: &DMatrix<f64>) -> Result<DMatrix<f64>, EngineError> {
    if a.ncols() != b.nrows() {
        return Err(EngineError::DimensionMismatch {
            left: (a.nrows(), a.ncols()),
            right: (b.nrows(), b.ncols()),
        });
    }
    Ok(a * b)
}

pub fn transpose(a: &DMatrix<f64>) -> DMatrix<f64> {
    a.transpose()
}

/// Gauss-Jordan inverse without pivoting.
pub fn invert(m: &DMatrix<f64>) -> Result<DMatrix<f64>, EngineError> {
    let n = m.nrows();
    if m.ncols() != n {
        return Err(EngineError::DimensionMismatch {
            left: (m.nrows(), m.ncols()),
            right: (m.ncols(), m.nrows()),
        });
    }

    let mut work = m.clone();
    let mut inv = DMatrix::<f64>::identity(n, n);

    for i in 0..n {
        let pivot = work[(i, i)];
        let tol = PIVOT_TOLERANCE * m[(i, i)].abs().max(f64::MIN_POSITIVE);
        if !pivot.is_finite() || pivot.abs() <= tol {
            return Err(EngineError::SingularMatrix { pivot: i });
        }
        for j in 0..n {
            work[(i, j)] /= pivot;
            inv[(i, j)] /= pivot;
        }
        for k in 0..n {
            if k == i {
                continue;
            }
            let factor = work[(k, i)];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                work[(k, j)] -= factor * work[(i, j)];
                inv[(k, j)] -= factor * inv[(i, j)];
            }
        }
    }

    if inv.iter().any(|v| !v.is_finite()) {
        return Err(EngineError::NumericalFailure(
            "matrix inverse contains non-finite entries".to_string(),
        ));
    }
    Ok(inv)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &DMatrix<f64>, b: &DMatrix<f64>, tol: f64) {
        assert_eq!(a.shape(), b.shape());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < tol, "expected {b}, got {a}");
        }
    }

    #[test]
    fn multiply_by_identity_is_exact() {
        let a = DMatrix::from_row_slice(2, 3, &[1.5, -2.0, 3.25, 4.0, 0.0, -7.5]);
        let id = DMatrix::<f64>::identity(3, 3);
        assert_eq!(multiply(&a, &id).unwrap(), a);
    }

    #[test]
    fn multiply_rejects_incompatible_shapes() {
        let a = DMatrix::<f64>::zeros(2, 3);
        let b = DMatrix::<f64>::zeros(2, 2);
        let err = multiply(&a, &b).unwrap_err();
        assert_eq!(
            err,
            EngineError::DimensionMismatch {
                left: (2, 3),
                right: (2, 2)
            }
        );
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let a = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let t = transpose(&a);
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t[(2, 1)], 6.0);
        assert_eq!(t[(0, 1)], 4.0);
    }

    #[test]
    fn double_inverse_recovers_matrix() {
        let m = DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 2.0]);
        let inv = invert(&m).unwrap();
        let back = invert(&inv).unwrap();
        assert_close(&back, &m, 1e-10);

        let product = multiply(&m, &inv).unwrap();
        assert_close(&product, &DMatrix::identity(3, 3), 1e-12);
    }

    #[test]
    fn zero_pivot_is_singular() {
        // Rank-deficient: second row is twice the first.
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert_eq!(invert(&m).unwrap_err(), EngineError::SingularMatrix { pivot: 1 });

        // Leading zero pivot: invertible in principle, but there is no row exchange.
        let m = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]);
        assert_eq!(invert(&m).unwrap_err(), EngineError::SingularMatrix { pivot: 0 });
    }

    #[test]
    fn badly_scaled_diagonal_still_inverts() {
        // Sum of squared humidities next to a dry-climate rainfall column.
        let m = DMatrix::from_row_slice(2, 2, &[56_700.0, 0.0, 0.0, 1e-5]);
        let inv = invert(&m).unwrap();
        assert!((inv[(0, 0)] - 1.0 / 56_700.0).abs() < 1e-15);
        assert!((inv[(1, 1)] - 1e5).abs() < 1e-6);

        let product = multiply(&m, &inv).unwrap();
        assert_close(&product, &DMatrix::identity(2, 2), 1e-12);
    }

    #[test]
    fn collinear_columns_at_large_scale_are_singular() {
        // Columns [1, h, h + 30] for h around 90.
        let x = DMatrix::from_fn(7, 3, |r, c| {
            let h = 88.0 + r as f64;
            [1.0, h, h + 30.0][c]
        });
        let xtx = multiply(&transpose(&x), &x).unwrap();
        assert_eq!(invert(&xtx).unwrap_err(), EngineError::SingularMatrix { pivot: 2 });
    }

    #[test]
    fn invert_requires_square_input() {
        let m = DMatrix::<f64>::zeros(2, 3);
        assert!(matches!(
            invert(&m),
            Err(EngineError::DimensionMismatch { .. })
        ));
    }
}
