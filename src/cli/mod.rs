//! Command-line parsing for the climate outlook tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fetching/regression code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{GraphType, RainfallUnit, TemperatureUnit, Variable, WindUnit};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sky", version, about = "Historical climate outlook for a place and day")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sample the same day over past years and predict every variable.
    Predict(PredictArgs),
    /// Fetch daily series over a contiguous date range.
    Range(RangeArgs),
    /// Look up places by name.
    Search(SearchArgs),
    /// Show or update stored preferences.
    Settings(SettingsArgs),
}

/// Where to query: explicit coordinates or a place name to geocode.
#[derive(Debug, Args, Clone)]
pub struct LocationArgs {
    /// Latitude in degrees (-90..90).
    #[arg(long = "lat", allow_negative_numbers = true, requires = "longitude")]
    pub latitude: Option<f64>,

    /// Longitude in degrees (-180..180).
    #[arg(long = "lon", allow_negative_numbers = true, requires = "latitude")]
    pub longitude: Option<f64>,

    /// Place name to geocode instead of coordinates.
    #[arg(long, conflicts_with_all = ["latitude", "longitude"])]
    pub place: Option<String>,

    /// Take the first geocoding candidate without prompting.
    #[arg(long)]
    pub first: bool,
}

/// Options shared by commands that print tables/charts.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Print the JSON report instead of tables.
    #[arg(long)]
    pub json: bool,

    /// Render a terminal chart per displayed variable.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 12)]
    pub height: usize,

    /// Export the aligned series to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the full report to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    /// Preferences file (defaults to `SKY_SETTINGS` or `sky-settings.json`).
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// Reference day (YYYY-MM-DD); only month and day are used. Defaults to today.
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Last year of the lookback window. Defaults to the current year.
    #[arg(long = "current-year")]
    pub current_year: Option<i32>,

    /// Predict from a series CSV instead of fetching.
    #[arg(short = 'f', long, value_name = "CSV", conflicts_with_all = ["latitude", "longitude", "place"])]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct RangeArgs {
    #[command(flatten)]
    pub location: LocationArgs,

    /// First day (YYYY-MM-DD).
    #[arg(long)]
    pub start: NaiveDate,

    /// Last day (YYYY-MM-DD), inclusive.
    #[arg(long)]
    pub end: NaiveDate,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct SearchArgs {
    /// Free-text place query (at least 3 characters).
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Print candidates as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser, Clone)]
pub struct SettingsArgs {
    /// Preferences file (defaults to `SKY_SETTINGS` or `sky-settings.json`).
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Start from defaults instead of the stored file.
    #[arg(long)]
    pub reset: bool,

    #[arg(long = "temperature-unit", value_enum)]
    pub temperature_unit: Option<TemperatureUnit>,

    #[arg(long = "rainfall-unit", value_enum)]
    pub rainfall_unit: Option<RainfallUnit>,

    #[arg(long = "wind-unit", value_enum)]
    pub wind_unit: Option<WindUnit>,

    /// Chart style.
    #[arg(long, value_enum)]
    pub graph: Option<GraphType>,

    /// Variables to display (repeatable).
    #[arg(long, value_enum)]
    pub show: Vec<Variable>,

    /// Variables to hide (repeatable).
    #[arg(long, value_enum)]
    pub hide: Vec<Variable>,

    /// Very hot threshold (°C).
    #[arg(long = "very-hot", allow_negative_numbers = true)]
    pub very_hot: Option<f64>,

    /// Very cold threshold (°C).
    #[arg(long = "very-cold", allow_negative_numbers = true)]
    pub very_cold: Option<f64>,

    /// Very wet threshold (mm).
    #[arg(long = "very-wet")]
    pub very_wet: Option<f64>,

    /// Very windy threshold (m/s).
    #[arg(long = "very-windy")]
    pub very_windy: Option<f64>,

    /// Very uncomfortable heat-index threshold (°C).
    #[arg(long = "very-uncomfortable", allow_negative_numbers = true)]
    pub very_uncomfortable: Option<f64>,

    /// Print the preferences as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SettingsArgs {
    /// Whether any flag asks for a change (and thus a save).
    pub fn has_updates(&self) -> bool {
        self.reset
            || self.temperature_unit.is_some()
            || self.rainfall_unit.is_some()
            || self.wind_unit.is_some()
            || self.graph.is_some()
            || !self.show.is_empty()
            || !self.hide.is_empty()
            || self.very_hot.is_some()
            || self.very_cold.is_some()
            || self.very_wet.is_some()
            || self.very_windy.is_some()
            || self.very_uncomfortable.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_accepts_negative_coordinates() {
        let cli = Cli::parse_from([
            "sky", "predict", "--lat", "-33.87", "--lon", "151.21", "--date", "2026-01-15",
        ]);
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.location.latitude, Some(-33.87));
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2026, 1, 15));
        assert!(!args.output.json);
    }

    #[test]
    fn place_conflicts_with_coordinates() {
        let res = Cli::try_parse_from(["sky", "predict", "--lat", "1", "--lon", "2", "--place", "Oslo"]);
        assert!(res.is_err());
    }

    #[test]
    fn settings_value_enums() {
        let cli = Cli::parse_from([
            "sky", "settings", "--temperature-unit", "f", "--wind-unit", "kmh", "--show", "uv-index",
        ]);
        let Command::Settings(args) = cli.command else {
            panic!("expected settings");
        };
        assert_eq!(args.temperature_unit, Some(TemperatureUnit::Fahrenheit));
        assert_eq!(args.wind_unit, Some(WindUnit::KilometersPerHour));
        assert_eq!(args.show, vec![Variable::UvIndex]);
        assert!(args.has_updates());
    }
}
