//! Preferences file (JSON).
//!
//! A missing file means defaults; a present but invalid file is an error so
//! a typo never silently resets the user's units.
//!
//! Thresholds are stored in the file's own display units (°F thresholds next
//! to `"temperature": "°F"`) and held in canonical metric units in memory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{Preferences, Thresholds, UnitSettings, Variable};
use crate::error::AppError;
use crate::units::{convert, to_canonical};

const DEFAULT_SETTINGS_FILE: &str = "sky-settings.json";

/// `SKY_SETTINGS`, or `sky-settings.json` in the working directory.
pub fn settings_path_from_env() -> PathBuf {
    std::env::var_os("SKY_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
}

pub fn load_preferences(path: &Path) -> Result<Preferences, AppError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no settings file; using defaults");
        return Ok(Preferences::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read settings '{}': {e}", path.display())))?;
    parse_preferences(&raw)
        .map_err(|e| AppError::new(2, format!("Invalid settings JSON in '{}': {e}", path.display())))
}

pub fn parse_preferences(raw: &str) -> Result<Preferences, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Preferences::default());
    }
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let mut prefs = Preferences::deserialize(&value)?;

    // Keys absent from the file keep their (already metric) defaults.
    if let Some(stored) = value.get("thresholds").and_then(|t| t.as_object()) {
        let units = prefs.units;
        for (key, var, slot) in threshold_slots(&mut prefs.thresholds) {
            if stored.contains_key(key) {
                *slot = to_canonical(var, *slot, &units);
            }
        }
    }
    Ok(prefs)
}

pub fn save_preferences(path: &Path, prefs: &Preferences) -> Result<(), AppError> {
    let stored = Preferences {
        thresholds: thresholds_for_display(&prefs.thresholds, &prefs.units),
        ..*prefs
    };
    let json = serde_json::to_string_pretty(&stored)
        .map_err(|e| AppError::new(2, format!("Failed to encode settings: {e}")))?;
    fs::write(path, json)
        .map_err(|e| AppError::new(2, format!("Failed to write settings '{}': {e}", path.display())))?;
    tracing::info!(path = %path.display(), "settings saved");
    Ok(())
}

/// Thresholds expressed in the display units of `units`.
pub fn thresholds_for_display(thresholds: &Thresholds, units: &UnitSettings) -> Thresholds {
    let mut out = *thresholds;
    for (_, var, slot) in threshold_slots(&mut out) {
        *slot = convert(var, *slot, units);
    }
    out
}

/// JSON key, unit-bearing variable and field for each threshold.
fn threshold_slots(t: &mut Thresholds) -> [(&'static str, Variable, &mut f64); 5] {
    [
        ("veryHot", Variable::Temperature, &mut t.very_hot),
        ("veryCold", Variable::Temperature, &mut t.very_cold),
        ("veryWet", Variable::Rainfall, &mut t.very_wet),
        ("veryWindy", Variable::Wind, &mut t.very_windy),
        ("veryUncomfortable", Variable::HeatIndex, &mut t.very_uncomfortable),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GraphType, TemperatureUnit, WindUnit};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sky-outlook-{}-{name}", std::process::id()))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let prefs = load_preferences(&temp_path("does-not-exist.json")).unwrap();
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn save_then_load() {
        let path = temp_path("settings.json");
        let mut prefs = Preferences::default();
        prefs.units.wind = WindUnit::MilesPerHour;
        prefs.display.graph_type = GraphType::Bar;

        save_preferences(&path, &prefs).unwrap();
        let loaded = load_preferences(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, prefs);
    }

    #[test]
    fn thresholds_are_read_in_the_stored_units() {
        let raw = r#"{
            "units": { "temperature": "°F", "wind": "km/h" },
            "thresholds": { "veryHot": 95, "veryWindy": 54, "veryUncomfortable": 80 }
        }"#;
        let prefs = parse_preferences(raw).unwrap();
        assert_eq!(prefs.units.temperature, TemperatureUnit::Fahrenheit);
        assert!((prefs.thresholds.very_hot - 35.0).abs() < 1e-9);
        assert!((prefs.thresholds.very_windy - 15.0).abs() < 1e-9);
        assert!((prefs.thresholds.very_uncomfortable - 26.6667).abs() < 1e-3);
        // Absent keys keep their metric defaults.
        assert_eq!(prefs.thresholds.very_cold, 0.0);
        assert_eq!(prefs.thresholds.very_wet, 50.0);
    }

    #[test]
    fn imperial_thresholds_survive_save_and_load() {
        let path = temp_path("imperial-settings.json");
        let mut prefs = Preferences::default();
        prefs.units.temperature = TemperatureUnit::Fahrenheit;
        prefs.thresholds.very_hot = 35.0;

        save_preferences(&path, &prefs).unwrap();
        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let loaded = load_preferences(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert!((written["thresholds"]["veryHot"].as_f64().unwrap() - 95.0).abs() < 1e-9);
        assert!((loaded.thresholds.very_hot - 35.0).abs() < 1e-9);
        assert!((loaded.thresholds.very_uncomfortable - 26.7).abs() < 1e-9);
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(parse_preferences("{ \"units\": 3 }").is_err());
        assert_eq!(parse_preferences("  ").unwrap(), Preferences::default());
    }
}
