//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built fresh for every (location, date) query
//! - exported to JSON/CSV
//! - reloaded later (CSV series) for offline predictions

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Number of prior years sampled for the reference day (the window holds
/// `LOOKBACK_YEARS + 1` points including the end year).
pub const LOOKBACK_YEARS: i32 = 6;

/// Minimum complete rows a regression target needs.
pub const MIN_REGRESSION_ROWS: usize = 2;

/// Climate variables handled by the engine.
///
/// `HeatIndex` is derived; the other five come from the provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "camelCase")]
pub enum Variable {
    Temperature,
    Rainfall,
    Wind,
    Humidity,
    UvIndex,
    HeatIndex,
}

impl Variable {
    /// Provider-backed variables, in canonical column order.
    pub const BASE: [Variable; 5] = [
        Variable::Temperature,
        Variable::Rainfall,
        Variable::Wind,
        Variable::Humidity,
        Variable::UvIndex,
    ];

    /// Every prediction target, base variables first.
    pub const ALL: [Variable; 6] = [
        Variable::Temperature,
        Variable::Rainfall,
        Variable::Wind,
        Variable::Humidity,
        Variable::UvIndex,
        Variable::HeatIndex,
    ];

    /// Stable identifier used in JSON, CSV headers and preferences.
    pub fn key(self) -> &'static str {
        match self {
            Variable::Temperature => "temperature",
            Variable::Rainfall => "rainfall",
            Variable::Wind => "wind",
            Variable::Humidity => "humidity",
            Variable::UvIndex => "uvIndex",
            Variable::HeatIndex => "heatIndex",
        }
    }

    pub fn from_key(key: &str) -> Option<Variable> {
        Variable::ALL.into_iter().find(|v| v.key() == key)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Variable::Temperature => "Temperature",
            Variable::Rainfall => "Precipitation",
            Variable::Wind => "Wind Speed",
            Variable::Humidity => "Humidity",
            Variable::UvIndex => "UV Index",
            Variable::HeatIndex => "Heat Index",
        }
    }

    /// Fixed predictor order used when this variable is the regression target.
    ///
    /// A variable never predicts itself, and the derived heat index is never a
    /// predictor.
    pub fn predictors(self) -> &'static [Variable] {
        use Variable::*;
        match self {
            Temperature => &[Humidity, Rainfall, Wind, UvIndex],
            Rainfall => &[Temperature, Humidity, Wind, UvIndex],
            Wind => &[Temperature, Humidity, Rainfall, UvIndex],
            Humidity => &[Temperature, Rainfall, Wind, UvIndex],
            UvIndex => &[Temperature, Humidity, Rainfall, Wind],
            HeatIndex => &[Temperature, Humidity, Rainfall, Wind, UvIndex],
        }
    }
}

/// A geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, EngineError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(EngineError::InvalidQuery(format!(
                "latitude must be within [-90, 90] (got {latitude})"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(EngineError::InvalidQuery(format!(
                "longitude must be within [-180, 180] (got {longitude})"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// A validated (location, reference date) query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub location: Location,
    /// Only month and day are used; every sampled year shares them.
    pub date: NaiveDate,
}

impl QueryRequest {
    pub fn new(latitude: f64, longitude: f64, date: NaiveDate) -> Result<Self, EngineError> {
        Ok(Self {
            location: Location::new(latitude, longitude)?,
            date,
        })
    }

    pub fn window(&self, current_year: i32) -> LookbackWindow {
        LookbackWindow::ending(current_year)
    }
}

/// Contiguous, inclusive span of sampled years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackWindow {
    pub start_year: i32,
    pub end_year: i32,
}

impl LookbackWindow {
    pub fn ending(end_year: i32) -> Self {
        Self {
            start_year: end_year - LOOKBACK_YEARS,
            end_year,
        }
    }

    /// Years oldest first.
    pub fn years(&self) -> Vec<i32> {
        (self.start_year..=self.end_year).collect()
    }

    pub fn len(&self) -> usize {
        (self.end_year - self.start_year + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One value per position, `None` where the sample is absent.
///
/// Missing values are kept in place so indices stay aligned across variables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series(Vec<Option<f64>>);

impl Series {
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self(values)
    }

    /// Convenience for fully observed series.
    pub fn observed(values: &[f64]) -> Self {
        Self(values.iter().copied().map(Some).collect())
    }

    pub fn missing(len: usize) -> Self {
        Self(vec![None; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value at `idx`; `None` when missing or out of range.
    pub fn get(&self, idx: usize) -> Option<f64> {
        self.0.get(idx).copied().flatten()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.0
    }

    pub fn present(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().filter_map(|v| *v)
    }

    pub fn present_count(&self) -> usize {
        self.present().count()
    }

    /// Most recent non-missing value.
    pub fn latest(&self) -> Option<f64> {
        self.0.iter().rev().find_map(|v| *v)
    }

    /// Mean of the non-missing values.
    pub fn mean(&self) -> Option<f64> {
        let n = self.present_count();
        if n == 0 {
            return None;
        }
        Some(self.present().sum::<f64>() / n as f64)
    }

    /// Latest non-missing value, falling back to the mean.
    pub fn latest_or_mean(&self) -> Option<f64> {
        self.latest().or_else(|| self.mean())
    }

    /// Pointwise combination; the output is missing wherever either input is.
    pub fn zip_with(&self, other: &Series, f: impl Fn(f64, f64) -> Option<f64>) -> Series {
        let len = self.len().max(other.len());
        let values = (0..len)
            .map(|i| match (self.get(i), other.get(i)) {
                (Some(a), Some(b)) => f(a, b),
                _ => None,
            })
            .collect();
        Series(values)
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Series {
        Series(self.0.iter().map(|v| v.map(&f)).collect())
    }
}

/// Named, index-aligned series sharing one label sequence.
///
/// Invariant: every series has exactly `labels.len()` entries, and all five
/// base variables are present (absent columns are stored as fully missing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSet {
    labels: Vec<String>,
    series: BTreeMap<Variable, Series>,
}

impl VariableSet {
    pub fn new(labels: Vec<String>, series: BTreeMap<Variable, Series>) -> Result<Self, EngineError> {
        let len = labels.len();
        for s in series.values() {
            if s.len() != len {
                return Err(EngineError::ShapeMismatch {
                    expected: len,
                    got: s.len(),
                });
            }
        }
        let mut series = series;
        for var in Variable::BASE {
            series.entry(var).or_insert_with(|| Series::missing(len));
        }
        Ok(Self { labels, series })
    }

    /// Build from `(variable, values)` columns.
    pub fn from_columns(
        labels: Vec<String>,
        columns: impl IntoIterator<Item = (Variable, Series)>,
    ) -> Result<Self, EngineError> {
        Self::new(labels, columns.into_iter().collect())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, var: Variable) -> Option<&Series> {
        self.series.get(&var)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, &Series)> {
        self.series.iter().map(|(v, s)| (*v, s))
    }

    /// A copy of this set with `var` added or replaced.
    pub fn with_series(&self, var: Variable, values: Series) -> Result<VariableSet, EngineError> {
        if values.len() != self.len() {
            return Err(EngineError::ShapeMismatch {
                expected: self.len(),
                got: values.len(),
            });
        }
        let mut series = self.series.clone();
        series.insert(var, values);
        Ok(VariableSet {
            labels: self.labels.clone(),
            series,
        })
    }
}

/// Regression coefficients: `[intercept, b1, ..., bk]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coefficients(Vec<f64>);

impl Coefficients {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn intercept(&self) -> f64 {
        self.0.first().copied().unwrap_or(0.0)
    }

    /// Slopes aligned with the predictor order.
    pub fn slopes(&self) -> &[f64] {
        self.0.get(1..).unwrap_or(&[])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outcome of predicting a single target variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetPrediction {
    /// Sanitized, rounded prediction (`None` when the target degraded).
    pub value: Option<f64>,
    /// Rounded prediction before range sanitization.
    pub raw: Option<f64>,
    pub coefficients: Option<Coefficients>,
    /// Predictors actually used, aligned with `coefficients.slopes()`.
    pub predictors: Vec<Variable>,
    /// Complete-case rows that entered the fit.
    pub rows_used: usize,
    /// Least-squares time trend of the target alone.
    pub trend: Option<f64>,
    /// Why `value` is missing.
    pub failure: Option<String>,
}

impl TargetPrediction {
    pub fn degraded(rows_used: usize, trend: Option<f64>, reason: impl Into<String>) -> Self {
        Self {
            value: None,
            raw: None,
            coefficients: None,
            predictors: Vec::new(),
            rows_used,
            trend,
            failure: Some(reason.into()),
        }
    }
}

/// Per-variable predictions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionMap(BTreeMap<Variable, TargetPrediction>);

impl PredictionMap {
    pub fn insert(&mut self, var: Variable, prediction: TargetPrediction) {
        self.0.insert(var, prediction);
    }

    pub fn get(&self, var: Variable) -> Option<&TargetPrediction> {
        self.0.get(&var)
    }

    /// Sanitized value for `var` (`None` when missing or degraded).
    pub fn value(&self, var: Variable) -> Option<f64> {
        self.0.get(&var).and_then(|p| p.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Variable, &TargetPrediction)> {
        self.0.iter().map(|(v, p)| (*v, p))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolved per-run configuration (CLI flags + environment).
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub place: Option<String>,
    pub first_place: bool,
    pub date: NaiveDate,
    /// End year of the lookback window.
    pub current_year: i32,
    /// Offline series CSV instead of the provider.
    pub input: Option<PathBuf>,
    pub settings_path: PathBuf,

    pub json: bool,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_series: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}
