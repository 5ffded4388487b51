//! Per-variable regression predictions.
//!
//! For each target we regress it on a fixed set of *other* variables:
//!
//! 1. derive the heat-index series from temperature and humidity
//! 2. build the complete-case design for the target's predictors
//! 3. fit OLS (normal equations) and evaluate it at the latest-or-mean features
//! 4. round to 2 decimals and clamp into the variable's physical range
//!
//! Failures are local: a target with too few rows, or whose fit fails, is
//! reported as `None` with a reason while the other targets proceed.

use serde::Serialize;

use crate::domain::{
    Coefficients, MIN_REGRESSION_ROWS, PredictionMap, Series, TargetPrediction, Variable, VariableSet,
};
use crate::error::EngineError;
use crate::fit::design::{Design, complete_cases, feature_vector};
use crate::math::{linear_trend_forecast, ols, round2};
use crate::models::heat_index_series;

/// Aligned input series (including the derived heat index) and predictions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub series: VariableSet,
    pub predictions: PredictionMap,
}

/// A copy of `set` with the `HeatIndex` series (re)derived.
pub fn derive_heat_index(set: &VariableSet) -> Result<VariableSet, EngineError> {
    let len = set.len();
    let missing = Series::missing(len);
    let temperature = set.get(Variable::Temperature).unwrap_or(&missing);
    let humidity = set.get(Variable::Humidity).unwrap_or(&missing);
    set.with_series(Variable::HeatIndex, heat_index_series(temperature, humidity))
}

/// Predict every target variable.
pub fn predict(set: &VariableSet) -> Result<PredictionMap, EngineError> {
    Ok(forecast(set)?.predictions)
}

/// Derive the heat index, then predict every target.
pub fn forecast(set: &VariableSet) -> Result<Forecast, EngineError> {
    let series = derive_heat_index(set)?;
    let mut predictions = PredictionMap::default();
    for target in Variable::ALL {
        let prediction = predict_target(&series, target);
        if let Some(reason) = &prediction.failure {
            tracing::warn!(target = target.key(), %reason, "prediction degraded to null");
        }
        predictions.insert(target, prediction);
    }
    Ok(Forecast {
        series,
        predictions,
    })
}

/// Predict one target from its fixed predictor set.
///
/// `set` must already carry the heat index when `target` is `HeatIndex`.
pub fn predict_target(set: &VariableSet, target: Variable) -> TargetPrediction {
    let missing = Series::missing(set.len());
    let target_series = set.get(target).unwrap_or(&missing);
    let trend = linear_trend_forecast(target_series);

    let predictor_vars = target.predictors();
    let predictor_series: Vec<&Series> = predictor_vars
        .iter()
        .map(|v| set.get(*v).unwrap_or(&missing))
        .collect();

    let design = complete_cases(target_series, &predictor_series);
    let rows_used = design.n_rows();
    if rows_used < MIN_REGRESSION_ROWS {
        let err = EngineError::InsufficientSamples { rows: rows_used };
        return TargetPrediction::degraded(rows_used, trend, err.to_string());
    }

    let fitted = match fit_with_redundancy_drop(&design, predictor_vars) {
        Ok(f) => f,
        Err(err) => return TargetPrediction::degraded(rows_used, trend, err.to_string()),
    };

    let used_series: Vec<&Series> = fitted.columns.iter().map(|&c| predictor_series[c]).collect();
    let Some(features) = feature_vector(&used_series) else {
        return TargetPrediction::degraded(rows_used, trend, "predictor has no observed values");
    };

    let raw = match ols::predict(&fitted.coefficients, &features) {
        Ok(v) if v.is_finite() => round2(v),
        Ok(_) => return TargetPrediction::degraded(rows_used, trend, "non-finite prediction"),
        Err(err) => return TargetPrediction::degraded(rows_used, trend, err.to_string()),
    };

    TargetPrediction {
        value: Some(sanitize(target, raw)),
        raw: Some(raw),
        coefficients: Some(fitted.coefficients),
        predictors: fitted.columns.iter().map(|&c| predictor_vars[c]).collect(),
        rows_used,
        trend,
        failure: None,
    }
}

/// Clamp a prediction into the variable's physical range.
pub fn sanitize(var: Variable, value: f64) -> f64 {
    match var {
        Variable::Rainfall | Variable::Wind | Variable::UvIndex => value.max(0.0),
        Variable::Humidity => value.clamp(0.0, 100.0),
        Variable::Temperature | Variable::HeatIndex => value,
    }
}

struct FittedTarget {
    coefficients: Coefficients,
    /// Indices into the target's predictor list.
    columns: Vec<usize>,
}

/// Fit on all predictors; on a singular normal matrix, re-admit predictors
/// one at a time in their fixed order and drop each one that makes it singular.
fn fit_with_redundancy_drop(design: &Design, vars: &[Variable]) -> Result<FittedTarget, EngineError> {
    let all: Vec<usize> = (0..vars.len()).collect();
    match fit_columns(design, &all) {
        Err(EngineError::SingularMatrix { .. }) => {}
        other => return other,
    }

    let mut kept: Vec<usize> = Vec::new();
    let mut last_fit = None;
    for col in all {
        let mut trial = kept.clone();
        trial.push(col);
        match fit_columns(design, &trial) {
            Ok(fit) => {
                kept = trial;
                last_fit = Some(fit);
            }
            Err(EngineError::SingularMatrix { .. }) => {
                tracing::debug!(predictor = vars[col].key(), "dropping redundant predictor");
            }
            Err(other) => return Err(other),
        }
    }

    last_fit.ok_or(EngineError::SingularMatrix { pivot: 0 })
}

fn fit_columns(design: &Design, columns: &[usize]) -> Result<FittedTarget, EngineError> {
    let x = design.select_columns(columns);
    let coefficients = ols::fit(&x, &design.y)?;
    Ok(FittedTarget {
        coefficients,
        columns: columns.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| (2020 + i).to_string()).collect()
    }

    fn observed_set(columns: [(Variable, &[f64]); 5]) -> VariableSet {
        let n = columns[0].1.len();
        VariableSet::from_columns(
            labels(n),
            columns.map(|(v, values)| (v, Series::observed(values))),
        )
        .unwrap()
    }

    fn scenario() -> VariableSet {
        observed_set([
            (Variable::Temperature, &[10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0]),
            (Variable::Humidity, &[40.0, 42.0, 41.0, 43.0, 42.0, 44.0, 43.0]),
            (Variable::Wind, &[3.0, 4.0, 3.0, 5.0, 4.0, 6.0, 5.0]),
            (Variable::Rainfall, &[0.0, 1.0, 0.0, 2.0, 0.0, 1.0, 0.0]),
            (Variable::UvIndex, &[2.0, 3.0, 2.0, 4.0, 3.0, 5.0, 4.0]),
        ])
    }

    #[test]
    fn end_to_end_scenario_predicts_every_target() {
        let set = scenario();
        let out = forecast(&set).unwrap();

        let heat = out.series.get(Variable::HeatIndex).unwrap();
        assert_eq!(heat.len(), 7);
        assert_eq!(heat, set.get(Variable::Temperature).unwrap());

        for target in Variable::ALL {
            let p = out.predictions.get(target).unwrap();
            assert!(p.value.is_some(), "{target:?}: {:?}", p.failure);
            assert_eq!(p.rows_used, 7);
            let coeffs = p.coefficients.as_ref().unwrap();
            assert_eq!(coeffs.len(), p.predictors.len() + 1);
        }

        for var in [Variable::Rainfall, Variable::Wind, Variable::UvIndex] {
            assert!(out.predictions.value(var).unwrap() >= 0.0);
        }
        let humidity = out.predictions.value(Variable::Humidity).unwrap();
        assert!((0.0..=100.0).contains(&humidity));
    }

    #[test]
    fn redundant_predictors_are_dropped_in_order() {
        // humidity = temperature + 30 and uvIndex = wind - 1 in the scenario.
        let out = forecast(&scenario()).unwrap();
        let rain = out.predictions.get(Variable::Rainfall).unwrap();
        assert_eq!(rain.predictors, vec![Variable::Temperature, Variable::Wind]);

        // The heat index equals temperature here, so the fit is exact.
        let heat = out.predictions.get(Variable::HeatIndex).unwrap();
        assert_eq!(heat.predictors[0], Variable::Temperature);
        assert!((heat.value.unwrap() - 13.0).abs() < 1e-6);
    }

    #[test]
    fn predicting_twice_is_identical() {
        let set = scenario();
        let first = predict(&set).unwrap();
        let second = predict(&set).unwrap();
        assert_eq!(first, second);
    }

    /// Training rows follow `rain = 15 - temp` and `humidity = 5*temp + 20`;
    /// the last year has no target value, so its features extrapolate.
    fn extrapolating_set() -> VariableSet {
        let temp = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 20.0];
        let rain: Vec<Option<f64>> = temp[..6]
            .iter()
            .map(|t| Some(15.0 - t))
            .chain([None])
            .collect();
        let humidity: Vec<Option<f64>> = temp[..6]
            .iter()
            .map(|t| Some(5.0 * t + 20.0))
            .chain([None])
            .collect();
        VariableSet::from_columns(
            labels(7),
            [
                (Variable::Temperature, Series::observed(&temp)),
                (Variable::Rainfall, Series::new(rain)),
                (Variable::Humidity, Series::new(humidity)),
                (Variable::Wind, Series::observed(&[2.0, 5.0, 3.0, 7.0, 4.0, 6.0, 3.0])),
                (Variable::UvIndex, Series::observed(&[1.0, 4.0, 2.0, 2.0, 6.0, 3.0, 5.0])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn negative_rainfall_is_clamped_to_zero() {
        let set = derive_heat_index(&extrapolating_set()).unwrap();
        let p = predict_target(&set, Variable::Rainfall);
        assert_eq!(p.rows_used, 6);
        let raw = p.raw.unwrap();
        assert!((raw + 5.0).abs() < 1e-6, "raw {raw}");
        assert_eq!(p.value, Some(0.0));
    }

    #[test]
    fn humidity_is_clamped_to_percentage_range() {
        let set = derive_heat_index(&extrapolating_set()).unwrap();
        let p = predict_target(&set, Variable::Humidity);
        let raw = p.raw.unwrap();
        assert!((raw - 120.0).abs() < 1e-6, "raw {raw}");
        assert_eq!(p.value, Some(100.0));
    }

    #[test]
    fn sparse_target_degrades_without_aborting_others() {
        let mut columns = scenario();
        columns = columns
            .with_series(
                Variable::UvIndex,
                Series::new(vec![None, None, None, None, None, None, Some(4.0)]),
            )
            .unwrap();
        let out = forecast(&columns).unwrap();

        let uv = out.predictions.get(Variable::UvIndex).unwrap();
        assert_eq!(uv.value, None);
        assert_eq!(uv.rows_used, 1);
        assert!(uv.failure.as_deref().unwrap().contains("Insufficient samples"));
        assert_eq!(uv.trend, Some(4.0));

        // Every other target lists UV among its predictors.
        assert_eq!(out.predictions.len(), Variable::ALL.len());
        let temp = out.predictions.get(Variable::Temperature).unwrap();
        assert_eq!(temp.value, None);
        assert_eq!(temp.rows_used, 1);
        assert_eq!(temp.trend, Some(14.14));
    }

    #[test]
    fn small_scale_predictor_is_not_dropped() {
        // Humid site with a single trace of rain; rainfall is tiny but not collinear.
        let set = derive_heat_index(&observed_set([
            (Variable::Temperature, &[24.0, 25.0, 26.0, 25.5, 27.0, 26.5, 28.0]),
            (Variable::Humidity, &[88.0, 91.0, 90.0, 93.0, 89.0, 92.0, 90.0]),
            (Variable::Wind, &[2.0, 5.0, 3.0, 7.0, 4.0, 6.0, 3.0]),
            (Variable::Rainfall, &[0.0, 0.0, 0.0, 0.001, 0.0, 0.0, 0.0]),
            (Variable::UvIndex, &[1.0, 4.0, 2.0, 2.0, 6.0, 3.0, 5.0]),
        ]))
        .unwrap();

        let wind = predict_target(&set, Variable::Wind);
        assert!(wind.value.is_some(), "{:?}", wind.failure);
        assert_eq!(wind.predictors, Variable::Wind.predictors());
    }

    #[test]
    fn constant_predictors_null_one_target_only() {
        let out = forecast(&observed_set([
            (Variable::Temperature, &[10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0]),
            (Variable::Humidity, &[50.0; 7]),
            (Variable::Wind, &[4.0; 7]),
            (Variable::Rainfall, &[0.0; 7]),
            (Variable::UvIndex, &[2.0; 7]),
        ]))
        .unwrap();

        let temp = out.predictions.get(Variable::Temperature).unwrap();
        assert_eq!(temp.value, None);
        assert_eq!(temp.rows_used, 7);
        assert!(temp.failure.as_deref().unwrap().contains("Singular matrix"));

        for target in Variable::ALL.into_iter().filter(|v| *v != Variable::Temperature) {
            let p = out.predictions.get(target).unwrap();
            assert!(p.value.is_some(), "{target:?}: {:?}", p.failure);
            assert_eq!(p.predictors, vec![Variable::Temperature]);
        }
        assert_eq!(out.predictions.value(Variable::Humidity), Some(50.0));
        assert_eq!(out.predictions.value(Variable::Rainfall), Some(0.0));
    }

    #[test]
    fn sanitize_bounds() {
        assert_eq!(sanitize(Variable::Wind, -0.3), 0.0);
        assert_eq!(sanitize(Variable::UvIndex, 2.5), 2.5);
        assert_eq!(sanitize(Variable::Humidity, -4.0), 0.0);
        assert_eq!(sanitize(Variable::Humidity, 104.0), 100.0);
        assert_eq!(sanitize(Variable::Temperature, -12.0), -12.0);
    }
}
