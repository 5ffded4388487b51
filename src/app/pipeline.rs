//! Shared "query pipeline" logic used by every command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! validate -> per-year fetch -> heat index -> per-target regression -> flags
//!
//! Commands then focus on presentation (tables, charts, exports).

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::{DailySource, HistoricalSeries, PowerClient, YearStatus, fetch_history};
use crate::domain::{Location, LookbackWindow, PredictionMap, QueryRequest, Thresholds, VariableSet};
use crate::error::EngineError;
use crate::fit::{derive_heat_index, forecast};
use crate::units::{ExtremeFlag, extreme_flags};

/// Per-run knobs that are not part of the query itself.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub current_year: i32,
    pub max_concurrency: usize,
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearOutcome {
    pub year: i32,
    pub status: YearStatus,
}

/// Everything computed for one query; serialized as the JSON report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryReport {
    /// Absent for offline (CSV) input.
    pub request: Option<QueryRequest>,
    pub window: Option<LookbackWindow>,
    pub years: Vec<YearOutcome>,
    pub clamped_precipitation: usize,
    pub series: VariableSet,
    pub predictions: PredictionMap,
    pub extremes: Vec<ExtremeFlag>,
}

impl QueryReport {
    pub fn failed_years(&self) -> Vec<i32> {
        self.years
            .iter()
            .filter(|y| matches!(y.status, YearStatus::Missing(_)))
            .map(|y| y.year)
            .collect()
    }
}

/// Fetch the lookback window for `request` and predict every variable.
pub fn run_query<S>(source: &S, request: &QueryRequest, options: &QueryOptions) -> Result<QueryReport, EngineError>
where
    S: DailySource + ?Sized,
{
    let window = request.window(options.current_year);
    tracing::info!(
        latitude = request.location.latitude,
        longitude = request.location.longitude,
        date = %request.date,
        start_year = window.start_year,
        end_year = window.end_year,
        "running query"
    );

    let history = fetch_history(source, request, window, options.max_concurrency)?;
    report_from_history(Some(*request), history, &options.thresholds)
}

/// Predict from already-aligned series (e.g. loaded from CSV).
pub fn run_offline(set: VariableSet, thresholds: &Thresholds) -> Result<QueryReport, EngineError> {
    if set.is_empty() {
        return Err(EngineError::InvalidQuery("input series has no rows".to_string()));
    }
    let result = forecast(&set)?;
    Ok(QueryReport {
        request: None,
        window: None,
        years: Vec::new(),
        clamped_precipitation: 0,
        extremes: extreme_flags(&result.predictions, thresholds),
        series: result.series,
        predictions: result.predictions,
    })
}

fn report_from_history(
    request: Option<QueryRequest>,
    history: HistoricalSeries,
    thresholds: &Thresholds,
) -> Result<QueryReport, EngineError> {
    let result = forecast(&history.set)?;
    let years = history
        .years
        .into_iter()
        .map(|(year, status)| YearOutcome { year, status })
        .collect();

    Ok(QueryReport {
        request,
        window: Some(history.window),
        years,
        clamped_precipitation: history.clamped_precipitation,
        extremes: extreme_flags(&result.predictions, thresholds),
        series: result.series,
        predictions: result.predictions,
    })
}

/// Daily series over `[start, end]` (with derived heat index), no regression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeReport {
    pub location: Location,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub clamped_precipitation: usize,
    pub series: VariableSet,
}

pub fn run_range(
    client: &PowerClient,
    location: Location,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RangeReport, EngineError> {
    tracing::info!(%start, %end, "fetching date range");
    let range = client.fetch_range(location, start, end)?;
    Ok(RangeReport {
        location,
        start,
        end,
        clamped_precipitation: range.clamped_precipitation,
        series: derive_heat_index(&range.set)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DailyRecord;
    use crate::domain::{Series, Variable};
    use chrono::Datelike;

    /// Serves the fixed scenario year by year; 2023 fails.
    struct ScenarioSource;

    impl DailySource for ScenarioSource {
        fn fetch_day(&self, _location: Location, date: NaiveDate) -> Result<DailyRecord, EngineError> {
            let idx = (date.year() - 2020) as usize;
            if date.year() == 2023 {
                return Err(EngineError::Request("connection reset".to_string()));
            }
            let temperature = [10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0][idx];
            Ok(DailyRecord {
                t_max: Some(temperature + 2.0),
                t_min: Some(temperature - 2.0),
                precipitation: Some([0.0, 1.0, 0.0, 2.0, 0.0, 1.0, 0.0][idx]),
                wind_speed: Some([3.0, 4.0, 3.0, 5.0, 4.0, 6.0, 5.0][idx]),
                humidity: Some([40.0, 47.0, 41.0, 43.0, 49.0, 44.0, 42.0][idx]),
                uv_index: Some([2.0, 3.0, 4.0, 4.0, 3.0, 7.0, 4.0][idx]),
            })
        }
    }

    fn options() -> QueryOptions {
        QueryOptions {
            current_year: 2026,
            max_concurrency: 4,
            thresholds: Thresholds::default(),
        }
    }

    #[test]
    fn query_survives_a_failed_year() {
        let request = QueryRequest::new(51.5, -0.12, NaiveDate::from_ymd_opt(2026, 6, 21).unwrap()).unwrap();
        let report = run_query(&ScenarioSource, &request, &options()).unwrap();

        assert_eq!(report.series.labels().len(), 7);
        assert_eq!(report.failed_years(), vec![2023]);
        for var in Variable::ALL {
            assert_eq!(report.series.get(var).unwrap().get(3), None, "{var:?}");
        }
        assert_eq!(report.predictions.len(), Variable::ALL.len());
        assert!(report.predictions.value(Variable::Temperature).is_some());
        assert!(report.extremes.is_empty());
    }

    #[test]
    fn offline_report_has_no_request() {
        let set = VariableSet::from_columns(
            vec!["2024".into(), "2025".into(), "2026".into()],
            [
                (Variable::Temperature, Series::observed(&[36.0, 37.0, 38.5])),
                (Variable::Humidity, Series::observed(&[20.0, 25.0, 22.0])),
            ],
        )
        .unwrap();
        let report = run_offline(set, &Thresholds::default()).unwrap();
        assert!(report.request.is_none());
        // Rainfall is absent entirely, so every target lacks complete rows.
        assert!(report.predictions.iter().all(|(_, p)| p.value.is_none()));
        assert_eq!(report.series.get(Variable::HeatIndex).unwrap().present_count(), 3);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["predictions"]["temperature"]["value"].is_null());
        assert!(json["request"].is_null());
    }

    #[test]
    fn empty_offline_input_is_rejected() {
        let set = VariableSet::from_columns(Vec::new(), []).unwrap();
        let err = run_offline(set, &Thresholds::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidQuery(_)));
    }
}
