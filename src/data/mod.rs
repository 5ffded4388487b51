//! External data collaborators and the historical fetch pipeline.
//!
//! - `power`: NASA POWER daily point client
//! - `geocode`: Nominatim place search
//! - `http`: timeout/retry/concurrency policy shared by both clients
//! - `fetcher`: per-year fan-out producing aligned series

pub mod fetcher;
pub mod geocode;
pub mod http;
pub mod power;

pub use fetcher::{DailyRecord, DailySource, HistoricalSeries, YearStatus, fetch_history};
pub use geocode::{GeocodeClient, Place};
pub use http::HttpPolicy;
pub use power::{PowerClient, RangeSeries};
