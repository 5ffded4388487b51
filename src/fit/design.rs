//! Complete-case design matrices.
//!
//! A row enters the fit only when the target and *every* predictor are present
//! at that index. Columns follow the predictor order given by the caller.

use nalgebra::{DMatrix, DVector};

use crate::domain::Series;

/// Filtered regression inputs.
#[derive(Debug, Clone)]
pub struct Design {
    /// rows × k, no intercept column.
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
    /// Original series indices of the kept rows.
    pub rows: Vec<usize>,
}

impl Design {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// The same rows restricted to the given columns (in the given order).
    pub fn select_columns(&self, columns: &[usize]) -> DMatrix<f64> {
        self.x.select_columns(columns)
    }
}

pub fn complete_cases(target: &Series, predictors: &[&Series]) -> Design {
    let len = predictors
        .iter()
        .map(|s| s.len())
        .fold(target.len(), usize::min);

    let mut rows = Vec::new();
    let mut values = Vec::new();
    let mut y = Vec::new();

    for i in 0..len {
        let Some(t) = target.get(i) else { continue };
        let row: Option<Vec<f64>> = predictors.iter().map(|s| s.get(i)).collect();
        let Some(row) = row else { continue };
        rows.push(i);
        values.extend(row);
        y.push(t);
    }

    let k = predictors.len();
    Design {
        x: DMatrix::from_row_slice(rows.len(), k, &values),
        y: DVector::from_vec(y),
        rows,
    }
}

/// Latest-or-mean value of each predictor, in order.
///
/// `None` if any predictor has no values at all.
pub fn feature_vector(predictors: &[&Series]) -> Option<Vec<f64>> {
    predictors.iter().map(|s| s.latest_or_mean()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_fully_observed_rows() {
        let target = Series::new(vec![Some(1.0), Some(2.0), None, Some(4.0), Some(5.0)]);
        let a = Series::new(vec![Some(10.0), None, Some(30.0), Some(40.0), Some(50.0)]);
        let b = Series::new(vec![Some(0.1), Some(0.2), Some(0.3), Some(0.4), None]);

        let design = complete_cases(&target, &[&a, &b]);
        assert_eq!(design.rows, vec![0, 3]);
        assert_eq!(design.x.shape(), (2, 2));
        assert_eq!(design.x[(1, 0)], 40.0);
        assert_eq!(design.x[(1, 1)], 0.4);
        assert_eq!(design.y.as_slice(), &[1.0, 4.0]);

        let narrowed = design.select_columns(&[1]);
        assert_eq!(narrowed.shape(), (2, 1));
        assert_eq!(narrowed[(0, 0)], 0.1);
    }

    #[test]
    fn features_use_latest_observation() {
        let a = Series::new(vec![Some(1.0), Some(2.0), None]);
        let b = Series::new(vec![Some(5.0), None, Some(7.0)]);
        assert_eq!(feature_vector(&[&a, &b]), Some(vec![2.0, 7.0]));
        assert_eq!(feature_vector(&[&a, &Series::missing(3)]), None);
    }
}
