//! Historical series fetcher.
//!
//! For a query `(location, date)` we sample the same month/day in every year of
//! the lookback window, one provider call per year, issued in parallel on a
//! bounded rayon pool.
//!
//! Missing-value discipline: **null padding**. Every year keeps its slot in the
//! labels and in every series; a year whose call fails (or whose date does not
//! exist, e.g. 29 February) is missing at that index in all variables at once.

use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use serde::Serialize;

use crate::domain::{Location, LookbackWindow, QueryRequest, Series, Variable, VariableSet};
use crate::error::EngineError;

/// Raw per-day provider values (metric units, `None` when absent).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DailyRecord {
    pub t_max: Option<f64>,
    pub t_min: Option<f64>,
    pub precipitation: Option<f64>,
    pub wind_speed: Option<f64>,
    pub humidity: Option<f64>,
    pub uv_index: Option<f64>,
}

impl DailyRecord {
    pub fn is_empty(&self) -> bool {
        self.t_max.is_none()
            && self.t_min.is_none()
            && self.precipitation.is_none()
            && self.wind_speed.is_none()
            && self.humidity.is_none()
            && self.uv_index.is_none()
    }

    /// Mean of max/min when both are present, else whichever one is.
    pub fn average_temperature(&self) -> Option<f64> {
        match (self.t_max, self.t_min) {
            (Some(hi), Some(lo)) => Some((hi + lo) / 2.0),
            (hi, lo) => hi.or(lo),
        }
    }
}

/// Source of single-day climate samples.
///
/// Implementations own their timeout/retry policy; the fetcher only sees the
/// final outcome of each call.
pub trait DailySource: Send + Sync {
    fn fetch_day(&self, location: Location, date: NaiveDate) -> Result<DailyRecord, EngineError>;
}

/// What happened to one year of the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "reason")]
pub enum YearStatus {
    Fetched,
    Missing(String),
}

/// Aligned series plus per-year bookkeeping.
#[derive(Debug, Clone)]
pub struct HistoricalSeries {
    pub window: LookbackWindow,
    pub set: VariableSet,
    /// One entry per label, same order.
    pub years: Vec<(i32, YearStatus)>,
    /// Number of negative precipitation values replaced with 0.
    pub clamped_precipitation: usize,
}

impl HistoricalSeries {
    pub fn failed_years(&self) -> Vec<i32> {
        self.years
            .iter()
            .filter(|(_, status)| matches!(status, YearStatus::Missing(_)))
            .map(|(year, _)| *year)
            .collect()
    }
}

/// Fetch one sample per year over `window`, in parallel.
///
/// Never fails because of individual years; only pool setup can fail.
pub fn fetch_history<S>(
    source: &S,
    request: &QueryRequest,
    window: LookbackWindow,
    max_concurrency: usize,
) -> Result<HistoricalSeries, EngineError>
where
    S: DailySource + ?Sized,
{
    let years = window.years();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_concurrency.max(1))
        .build()
        .map_err(|e| EngineError::Runtime(format!("failed to start fetch pool: {e}")))?;

    let outcomes: Vec<Result<DailyRecord, EngineError>> = pool.install(|| {
        years
            .par_iter()
            .map(|&year| fetch_year(source, request, year))
            .collect()
    });

    let mut records = Vec::with_capacity(years.len());
    let mut statuses = Vec::with_capacity(years.len());
    for (&year, outcome) in years.iter().zip(outcomes) {
        match outcome {
            Ok(record) => {
                records.push(Some(record));
                statuses.push((year, YearStatus::Fetched));
            }
            Err(err) => {
                tracing::warn!(year, error = %err, "historical sample unavailable; slot left missing");
                records.push(None);
                statuses.push((year, YearStatus::Missing(err.to_string())));
            }
        }
    }

    let labels: Vec<String> = years.iter().map(|y| y.to_string()).collect();
    let keys = labels.clone();
    let (set, clamped_precipitation) = build_variable_set(labels, &records, &keys)?;

    Ok(HistoricalSeries {
        window,
        set,
        years: statuses,
        clamped_precipitation,
    })
}

fn fetch_year<S>(source: &S, request: &QueryRequest, year: i32) -> Result<DailyRecord, EngineError>
where
    S: DailySource + ?Sized,
{
    let date = request.date.with_year(year).ok_or_else(|| EngineError::DataUnavailable {
        year,
        reason: format!("{} does not exist in {year}", request.date.format("%m-%d")),
    })?;
    tracing::debug!(year, %date, "fetching historical sample");

    let record = source.fetch_day(request.location, date).map_err(|err| match err {
        EngineError::MalformedResponse(reason) | EngineError::Request(reason) => {
            EngineError::DataUnavailable { year, reason }
        }
        other => other,
    })?;

    if record.is_empty() {
        return Err(EngineError::DataUnavailable {
            year,
            reason: "provider returned no values".to_string(),
        });
    }
    Ok(record)
}

/// Turn per-slot records into an aligned `VariableSet`.
///
/// `None` records become a missing entry in every variable. Negative
/// precipitation is clamped to 0 (and logged); returns the clamp count.
pub(crate) fn build_variable_set(
    labels: Vec<String>,
    records: &[Option<DailyRecord>],
    keys: &[String],
) -> Result<(VariableSet, usize), EngineError> {
    let mut clamped = 0usize;
    let mut temperature = Vec::with_capacity(records.len());
    let mut rainfall = Vec::with_capacity(records.len());
    let mut wind = Vec::with_capacity(records.len());
    let mut humidity = Vec::with_capacity(records.len());
    let mut uv_index = Vec::with_capacity(records.len());

    for (idx, record) in records.iter().enumerate() {
        let record = record.unwrap_or_default();

        let precip = match record.precipitation {
            Some(p) if p < 0.0 => {
                let key = keys.get(idx).map(String::as_str).unwrap_or("?");
                tracing::warn!(key, value = p, "clamping negative precipitation to 0");
                clamped += 1;
                Some(0.0)
            }
            other => other,
        };

        temperature.push(record.average_temperature());
        rainfall.push(precip);
        wind.push(record.wind_speed);
        humidity.push(record.humidity);
        uv_index.push(record.uv_index);
    }

    let set = VariableSet::from_columns(
        labels,
        [
            (Variable::Temperature, Series::new(temperature)),
            (Variable::Rainfall, Series::new(rainfall)),
            (Variable::Wind, Series::new(wind)),
            (Variable::Humidity, Series::new(humidity)),
            (Variable::UvIndex, Series::new(uv_index)),
        ],
    )?;
    Ok((set, clamped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory source failing for selected years.
    struct FakeSource {
        failing: Vec<i32>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn failing(years: &[i32]) -> Self {
            Self {
                failing: years.to_vec(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DailySource for FakeSource {
        fn fetch_day(&self, _location: Location, date: NaiveDate) -> Result<DailyRecord, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let year = date.year();
            if self.failing.contains(&year) {
                return Err(EngineError::Request(format!("timeout for {year}")));
            }
            let offset = (year - 2020) as f64;
            Ok(DailyRecord {
                t_max: Some(20.0 + offset),
                t_min: Some(10.0 + offset),
                precipitation: Some(if year == 2021 { -0.4 } else { offset }),
                wind_speed: Some(3.0),
                humidity: Some(50.0 + offset),
                uv_index: None,
            })
        }
    }

    fn request(month: u32, day: u32) -> QueryRequest {
        QueryRequest::new(37.78, -122.43, NaiveDate::from_ymd_opt(2026, month, day).unwrap()).unwrap()
    }

    #[test]
    fn failed_years_stay_aligned_across_all_series() {
        let source = FakeSource::failing(&[2022, 2025]);
        let window = LookbackWindow::ending(2026);
        let history = fetch_history(&source, &request(7, 4), window, 3).unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 7);
        let labels = history.set.labels();
        assert_eq!(labels.len(), 7);
        assert_eq!(labels[0], "2020");
        assert_eq!(labels[6], "2026");

        let failed_idx = [2usize, 5usize];
        for var in Variable::BASE {
            let s = history.set.get(var).unwrap();
            assert_eq!(s.len(), labels.len(), "{var:?} length");
            for idx in failed_idx {
                assert_eq!(s.get(idx), None, "{var:?} at {idx}");
            }
        }
        assert_eq!(history.failed_years(), vec![2022, 2025]);

        let temp = history.set.get(Variable::Temperature).unwrap();
        assert_eq!(temp.get(0), Some(15.0));
        assert_eq!(temp.get(6), Some(21.0));
    }

    #[test]
    fn negative_precipitation_is_clamped_and_counted() {
        let source = FakeSource::failing(&[]);
        let history = fetch_history(&source, &request(7, 4), LookbackWindow::ending(2026), 2).unwrap();
        let rain = history.set.get(Variable::Rainfall).unwrap();
        assert_eq!(rain.get(1), Some(0.0));
        assert_eq!(rain.get(3), Some(3.0));
        assert_eq!(history.clamped_precipitation, 1);
        // Untouched variables pass through, missing stays missing.
        assert_eq!(history.set.get(Variable::UvIndex).unwrap().present_count(), 0);
    }

    #[test]
    fn leap_day_leaves_non_leap_years_missing() {
        let source = FakeSource::failing(&[]);
        let req = QueryRequest::new(0.0, 0.0, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()).unwrap();
        let history = fetch_history(&source, &req, LookbackWindow::ending(2026), 4).unwrap();
        // 2020 and 2024 are leap years.
        assert_eq!(history.failed_years(), vec![2021, 2022, 2023, 2025, 2026]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        let hum = history.set.get(Variable::Humidity).unwrap();
        assert_eq!(hum.values()[0], Some(50.0));
        assert_eq!(hum.values()[1], None);
    }

    #[test]
    fn average_temperature_falls_back_to_single_bound() {
        let rec = DailyRecord {
            t_min: Some(4.0),
            ..DailyRecord::default()
        };
        assert_eq!(rec.average_temperature(), Some(4.0));
        assert_eq!(DailyRecord::default().average_temperature(), None);
    }
}
