//! NASA POWER daily point API integration.
//!
//! One request covers a `[start, end]` span of days for a single point. The
//! historical fetcher issues one single-day request per year; `fetch_range`
//! issues one request for a contiguous span.
//!
//! Response shape (only the parts we read):
//!
//! ```text
//! { "header": { "fill_value": -999.0 },
//!   "properties": { "parameter": { "T2M_MAX": { "20240704": 24.1, ... }, ... } } }
//! ```

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::data::fetcher::{DailyRecord, DailySource, build_variable_set};
use crate::data::http::HttpPolicy;
use crate::domain::{Location, VariableSet};
use crate::error::EngineError;

const DEFAULT_BASE_URL: &str = "https://power.larc.nasa.gov/api/temporal/daily/point";
const COMMUNITY: &str = "RE";

const PARAM_T_MAX: &str = "T2M_MAX";
const PARAM_T_MIN: &str = "T2M_MIN";
const PARAM_PRECIP: &str = "PRECTOTCORR";
const PARAM_WIND: &str = "WS10M";
const PARAM_HUMIDITY: &str = "RH2M";
const PARAM_UV: &str = "ALLSKY_SFC_UV_INDEX";

const PARAMETERS: [&str; 6] = [
    PARAM_T_MAX,
    PARAM_T_MIN,
    PARAM_PRECIP,
    PARAM_WIND,
    PARAM_HUMIDITY,
    PARAM_UV,
];

/// POWER marks missing samples with this value unless the header says otherwise.
const DEFAULT_FILL_VALUE: f64 = -999.0;

pub struct PowerClient {
    client: Client,
    base_url: String,
    policy: HttpPolicy,
}

impl PowerClient {
    /// Build from `POWER_BASE_URL` (optional) and the HTTP policy environment.
    pub fn from_env() -> Result<Self, EngineError> {
        dotenvy::dotenv().ok();
        let policy = HttpPolicy::from_env()?;
        let base_url = std::env::var("POWER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url, policy)
    }

    pub fn new(base_url: impl Into<String>, policy: HttpPolicy) -> Result<Self, EngineError> {
        Ok(Self {
            client: policy.build_client()?,
            base_url: base_url.into(),
            policy,
        })
    }

    pub fn policy(&self) -> &HttpPolicy {
        &self.policy
    }

    /// Daily records for every day in `[start, end]`, keyed by date.
    pub fn fetch_days(
        &self,
        location: Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashMap<NaiveDate, DailyRecord>, EngineError> {
        let start_key = date_key(start);
        let end_key = date_key(end);
        let parameters = PARAMETERS.join(",");
        let latitude = location.latitude.to_string();
        let longitude = location.longitude.to_string();

        let resp = self.policy.send(|| {
            self.client.get(&self.base_url).query(&[
                ("parameters", parameters.as_str()),
                ("community", COMMUNITY),
                ("longitude", longitude.as_str()),
                ("latitude", latitude.as_str()),
                ("start", start_key.as_str()),
                ("end", end_key.as_str()),
                ("format", "JSON"),
            ])
        })?;

        let body: PowerResponse = resp
            .json()
            .map_err(|e| EngineError::MalformedResponse(format!("failed to parse POWER response: {e}")))?;

        parse_days(&body, start, end)
    }

    /// One request over a contiguous span, labelled `MM-DD` per day.
    pub fn fetch_range(
        &self,
        location: Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RangeSeries, EngineError> {
        if end < start {
            return Err(EngineError::InvalidQuery(format!(
                "range end {end} is before start {start}"
            )));
        }
        let days = self.fetch_days(location, start, end)?;
        build_range_series(&days, start, end)
    }
}

impl DailySource for PowerClient {
    fn fetch_day(&self, location: Location, date: NaiveDate) -> Result<DailyRecord, EngineError> {
        let mut days = self.fetch_days(location, date, date)?;
        days.remove(&date).ok_or_else(|| EngineError::DataUnavailable {
            year: date.year(),
            reason: "no parameter values for the requested day".to_string(),
        })
    }
}

/// Output of a date-range fetch.
#[derive(Debug, Clone)]
pub struct RangeSeries {
    pub set: VariableSet,
    pub clamped_precipitation: usize,
}

#[derive(Debug, Deserialize)]
struct PowerResponse {
    header: Option<PowerHeader>,
    properties: Option<PowerProperties>,
}

#[derive(Debug, Deserialize)]
struct PowerHeader {
    fill_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    parameter: Option<HashMap<String, HashMap<String, Option<f64>>>>,
}

fn parse_days(
    body: &PowerResponse,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashMap<NaiveDate, DailyRecord>, EngineError> {
    let params = body
        .properties
        .as_ref()
        .and_then(|p| p.parameter.as_ref())
        .ok_or_else(|| EngineError::MalformedResponse("missing properties.parameter block".to_string()))?;

    let fill = body
        .header
        .as_ref()
        .and_then(|h| h.fill_value)
        .unwrap_or(DEFAULT_FILL_VALUE);

    let lookup = |code: &str, key: &str| -> Option<f64> {
        let v = params.get(code)?.get(key).copied().flatten()?;
        if v.is_finite() && v != fill { Some(v) } else { None }
    };

    let mut out = HashMap::new();
    for date in start.iter_days().take_while(|d| *d <= end) {
        let key = date_key(date);
        let record = DailyRecord {
            t_max: lookup(PARAM_T_MAX, &key),
            t_min: lookup(PARAM_T_MIN, &key),
            precipitation: lookup(PARAM_PRECIP, &key),
            wind_speed: lookup(PARAM_WIND, &key),
            humidity: lookup(PARAM_HUMIDITY, &key),
            uv_index: lookup(PARAM_UV, &key),
        };
        if !record.is_empty() {
            out.insert(date, record);
        }
    }
    Ok(out)
}

fn build_range_series(
    days: &HashMap<NaiveDate, DailyRecord>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RangeSeries, EngineError> {
    let dates: Vec<NaiveDate> = start.iter_days().take_while(|d| *d <= end).collect();
    let labels = dates.iter().map(|d| d.format("%m-%d").to_string()).collect();
    let records: Vec<Option<DailyRecord>> = dates.iter().map(|d| days.get(d).copied()).collect();
    let keys: Vec<String> = dates.iter().map(|d| date_key(*d)).collect();

    let (set, clamped_precipitation) = build_variable_set(labels, &records, &keys)?;
    Ok(RangeSeries {
        set,
        clamped_precipitation,
    })
}

/// `YYYYMMDD`, the provider's date key.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
