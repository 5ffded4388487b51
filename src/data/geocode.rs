//! Place search via the OpenStreetMap Nominatim JSON API.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::data::http::HttpPolicy;
use crate::domain::Location;
use crate::error::EngineError;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Queries shorter than this return no candidates without a request.
pub const MIN_QUERY_LEN: usize = 3;

/// A ranked geocoding candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub id: String,
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Place {
    pub fn location(&self) -> Result<Location, EngineError> {
        Location::new(self.latitude, self.longitude)
    }
}

pub struct GeocodeClient {
    client: Client,
    base_url: String,
    policy: HttpPolicy,
}

impl GeocodeClient {
    pub fn from_env() -> Result<Self, EngineError> {
        dotenvy::dotenv().ok();
        let policy = HttpPolicy::from_env()?;
        let base_url =
            std::env::var("NOMINATIM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            client: policy.build_client()?,
            base_url,
            policy,
        })
    }

    /// Candidates in provider rank order.
    pub fn search(&self, query: &str) -> Result<Vec<Place>, EngineError> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        let resp = self.policy.send(|| {
            self.client
                .get(&self.base_url)
                .header("Accept-Language", "en")
                .query(&[("format", "json"), ("q", query)])
        })?;

        let raw: Vec<RawPlace> = resp
            .json()
            .map_err(|e| EngineError::MalformedResponse(format!("failed to parse geocode response: {e}")))?;
        Ok(to_places(raw))
    }
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    place_id: serde_json::Value,
    display_name: String,
    lat: String,
    lon: String,
}

fn to_places(raw: Vec<RawPlace>) -> Vec<Place> {
    raw.into_iter()
        .filter_map(|p| {
            let latitude = p.lat.trim().parse::<f64>().ok()?;
            let longitude = p.lon.trim().parse::<f64>().ok()?;
            let id = match p.place_id {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            Some(Place {
                id,
                display_name: p.display_name,
                latitude,
                longitude,
            })
        })
        .collect()
}
