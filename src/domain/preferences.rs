//! User preferences: display units, which variables to show, chart style and
//! extreme-condition thresholds.
//!
//! The engine only *reads* these. Serialized names match the stored blob
//! (`°C`, `m/s`, `displayData`, `graphType`, ...). Every field has a default so
//! partial blobs load cleanly.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::Variable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "°C")]
    #[value(name = "c")]
    Celsius,
    #[serde(rename = "°F")]
    #[value(name = "f")]
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum RainfallUnit {
    #[default]
    #[serde(rename = "mm")]
    #[value(name = "mm")]
    Millimeters,
    #[serde(rename = "inches")]
    #[value(name = "inches")]
    Inches,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum WindUnit {
    #[default]
    #[serde(rename = "m/s")]
    #[value(name = "ms")]
    MetersPerSecond,
    #[serde(rename = "km/h")]
    #[value(name = "kmh")]
    KilometersPerHour,
    #[serde(rename = "mph")]
    #[value(name = "mph")]
    MilesPerHour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitSettings {
    pub temperature: TemperatureUnit,
    pub rainfall: RainfallUnit,
    pub wind: WindUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GraphType {
    #[default]
    Line,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplaySettings {
    pub graph_type: GraphType,
}

/// Which variables are presented. Unknown keys in the stored blob are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayData {
    pub temperature: bool,
    pub rainfall: bool,
    pub wind: bool,
    pub humidity: bool,
    pub heat_index: bool,
    pub uv_index: bool,
}

impl Default for DisplayData {
    fn default() -> Self {
        Self {
            temperature: true,
            rainfall: true,
            wind: true,
            humidity: false,
            heat_index: false,
            uv_index: false,
        }
    }
}

impl DisplayData {
    pub fn shows(&self, var: Variable) -> bool {
        match var {
            Variable::Temperature => self.temperature,
            Variable::Rainfall => self.rainfall,
            Variable::Wind => self.wind,
            Variable::Humidity => self.humidity,
            Variable::HeatIndex => self.heat_index,
            Variable::UvIndex => self.uv_index,
        }
    }

    pub fn set(&mut self, var: Variable, shown: bool) {
        let slot = match var {
            Variable::Temperature => &mut self.temperature,
            Variable::Rainfall => &mut self.rainfall,
            Variable::Wind => &mut self.wind,
            Variable::Humidity => &mut self.humidity,
            Variable::HeatIndex => &mut self.heat_index,
            Variable::UvIndex => &mut self.uv_index,
        };
        *slot = shown;
    }

    /// Shown variables in canonical order.
    pub fn shown(&self) -> Vec<Variable> {
        Variable::ALL.into_iter().filter(|v| self.shows(*v)).collect()
    }
}

/// Extreme-condition thresholds, in canonical metric units (°C, mm, m/s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Thresholds {
    pub very_hot: f64,
    pub very_cold: f64,
    pub very_wet: f64,
    pub very_windy: f64,
    /// Heat index at or above which conditions are flagged (80 °F caution line).
    pub very_uncomfortable: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            very_hot: 35.0,
            very_cold: 0.0,
            very_wet: 50.0,
            very_windy: 15.0,
            very_uncomfortable: 26.7,
        }
    }
}

/// The persisted preferences blob.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub units: UnitSettings,
    pub display: DisplaySettings,
    pub display_data: DisplayData,
    pub thresholds: Thresholds,
}
