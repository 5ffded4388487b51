//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for snapshot tests)
//!
//! Values arrive in canonical metric units and are converted here, right
//! before printing. Comfort is classified on the canonical value.

use crate::app::pipeline::{QueryReport, RangeReport};
use crate::data::Place;
use crate::domain::{Preferences, Variable, VariableSet};
use crate::units::{classify, convert, convert_opt, unit_symbol};

/// Header block: where, when, and how complete the history was.
pub fn format_query_summary(report: &QueryReport, place: Option<&str>) -> String {
    let mut out = String::new();

    out.push_str("=== sky - Climate Outlook ===\n");
    if let Some(name) = place {
        out.push_str(&format!("Place: {name}\n"));
    }
    match &report.request {
        Some(request) => {
            out.push_str(&format!(
                "Location: {:.4}, {:.4}\n",
                request.location.latitude, request.location.longitude
            ));
            out.push_str(&format!("Date: {}\n", request.date.format("%B %-d")));
        }
        None => out.push_str("Source: offline series\n"),
    }
    if let Some(window) = &report.window {
        out.push_str(&format!("Years: {}-{}\n", window.start_year, window.end_year));
    }

    let failed = report.failed_years();
    if !failed.is_empty() {
        let years: Vec<String> = failed.iter().map(|y| y.to_string()).collect();
        out.push_str(&format!("Missing years: {}\n", years.join(", ")));
    }
    if report.clamped_precipitation > 0 {
        out.push_str(&format!(
            "Note: {} negative precipitation value(s) clamped to 0\n",
            report.clamped_precipitation
        ));
    }
    out
}

/// Prediction table for the variables the user chose to display.
pub fn format_predictions(report: &QueryReport, prefs: &Preferences) -> String {
    let units = &prefs.units;
    let mut out = String::new();

    out.push_str("Predictions:\n");
    out.push_str(
        format!(
            "{:<14} {:>10} {:<5} {:<14} {:>10} {:>5}  {}\n",
            "variable", "value", "unit", "comfort", "trend", "rows", "predictors"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<14} {:-<10} {:-<5} {:-<14} {:-<10} {:-<5}  {:-<10}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for var in prefs.display_data.shown() {
        let Some(p) = report.predictions.get(var) else {
            continue;
        };
        let predictors = if p.predictors.is_empty() {
            p.failure.clone().unwrap_or_default()
        } else {
            p.predictors.iter().map(|v| v.key()).collect::<Vec<_>>().join(",")
        };
        out.push_str(
            format!(
                "{:<14} {:>10} {:<5} {:<14} {:>10} {:>5}  {}\n",
                var.display_name(),
                fmt_opt(convert_opt(var, p.value, units)),
                unit_symbol(var, units),
                classify(var, p.value).label(),
                fmt_opt(convert_opt(var, p.trend, units)),
                p.rows_used,
                predictors,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    if !report.extremes.is_empty() {
        let labels: Vec<&str> = report.extremes.iter().map(|f| f.label()).collect();
        out.push_str(&format!("Alerts: {}\n", labels.join(", ")));
    }
    out
}

/// Label column plus one column per displayed variable, in display units.
pub fn format_series_table(set: &VariableSet, prefs: &Preferences) -> String {
    let units = &prefs.units;
    let vars: Vec<Variable> = prefs
        .display_data
        .shown()
        .into_iter()
        .filter(|v| set.get(*v).is_some())
        .collect();

    let mut out = String::new();
    let mut header = format!("{:<8}", "label");
    for var in &vars {
        let symbol = unit_symbol(*var, units);
        let name = if symbol.is_empty() {
            var.key().to_string()
        } else {
            format!("{} ({symbol})", var.key())
        };
        header.push_str(&format!(" {name:>18}"));
    }
    out.push_str(header.trim_end());
    out.push('\n');

    for (idx, label) in set.labels().iter().enumerate() {
        let mut row = format!("{label:<8}");
        for var in &vars {
            let value = set.get(*var).and_then(|s| s.get(idx)).map(|v| convert(*var, v, units));
            row.push_str(&format!(" {:>18}", fmt_opt(value)));
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

pub fn format_range_summary(report: &RangeReport) -> String {
    let mut out = format!(
        "=== sky - Daily Range ===\nLocation: {:.4}, {:.4}\nDays: {} to {} ({} days)\n",
        report.location.latitude,
        report.location.longitude,
        report.start,
        report.end,
        report.series.len()
    );
    if report.clamped_precipitation > 0 {
        out.push_str(&format!(
            "Note: {} negative precipitation value(s) clamped to 0\n",
            report.clamped_precipitation
        ));
    }
    out
}

/// Numbered candidate list (1-based).
pub fn format_places(places: &[Place]) -> String {
    if places.is_empty() {
        return "No places found.\n".to_string();
    }
    let mut out = String::new();
    for (idx, place) in places.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}) {} ({:.4}, {:.4})\n",
            idx + 1,
            truncate(&place.display_name, 70),
            place.latitude,
            place.longitude
        ));
    }
    out
}

pub fn format_preferences(prefs: &Preferences) -> String {
    let units = &prefs.units;
    let shown: Vec<&str> = prefs.display_data.shown().into_iter().map(|v| v.key()).collect();
    let t = &prefs.thresholds;
    format!(
        "Units: temperature={} rainfall={} wind={}\nGraph: {:?}\nShown: {}\nThresholds: veryHot={} veryCold={} veryWet={} veryWindy={} veryUncomfortable={}\n",
        unit_symbol(Variable::Temperature, units),
        unit_symbol(Variable::Rainfall, units),
        unit_symbol(Variable::Wind, units),
        prefs.display.graph_type,
        shown.join(", "),
        t.very_hot,
        t.very_cold,
        t.very_wet,
        t.very_windy,
        t.very_uncomfortable,
    )
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}"),
        None => "n/a".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PredictionMap, Series, TargetPrediction, TemperatureUnit};
    use crate::units::ExtremeFlag;

    fn report() -> QueryReport {
        let set = VariableSet::from_columns(
            vec!["2025".to_string(), "2026".to_string()],
            [
                (Variable::Temperature, Series::observed(&[20.0, 30.0])),
                (Variable::Rainfall, Series::new(vec![None, Some(1.5)])),
            ],
        )
        .unwrap();

        let mut predictions = PredictionMap::default();
        predictions.insert(
            Variable::Temperature,
            TargetPrediction {
                value: Some(25.0),
                raw: Some(25.0),
                coefficients: None,
                predictors: vec![Variable::Humidity, Variable::Wind],
                rows_used: 6,
                trend: Some(26.0),
                failure: None,
            },
        );
        predictions.insert(
            Variable::Rainfall,
            TargetPrediction::degraded(1, None, "Insufficient samples"),
        );

        QueryReport {
            request: None,
            window: None,
            years: Vec::new(),
            clamped_precipitation: 2,
            series: set,
            predictions,
            extremes: vec![ExtremeFlag::VeryWet],
        }
    }

    #[test]
    fn prediction_table_converts_units_and_flags_nulls() {
        let mut prefs = Preferences::default();
        prefs.units.temperature = TemperatureUnit::Fahrenheit;
        let txt = format_predictions(&report(), &prefs);

        let temp_line = txt.lines().find(|l| l.starts_with("Temperature")).unwrap();
        assert!(temp_line.contains("77.00"));
        assert!(temp_line.contains("°F"));
        assert!(temp_line.contains("Comfortable"));
        assert!(temp_line.contains("78.80"));
        assert!(temp_line.ends_with("humidity,wind"));

        let rain_line = txt.lines().find(|l| l.starts_with("Precipitation")).unwrap();
        assert!(rain_line.contains("n/a"));
        assert!(rain_line.contains("Unknown"));
        assert!(rain_line.ends_with("Insufficient samples"));

        // Wind is shown by default but was never predicted here.
        assert!(!txt.contains("Wind Speed"));
        assert!(txt.contains("Alerts: very wet"));
    }

    #[test]
    fn series_table_respects_display_data() {
        let mut prefs = Preferences::default();
        prefs.display_data.set(Variable::Rainfall, false);
        let txt = format_series_table(&report().series, &prefs);
        let mut lines = txt.lines();
        let header = lines.next().unwrap();
        assert!(header.contains("temperature (°C)"));
        assert!(header.contains("wind (m/s)"));
        assert!(!header.contains("rainfall"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("2025"));
        assert!(row.contains("20.00"));
        assert!(row.ends_with("n/a"));
    }

    #[test]
    fn summary_mentions_clamps() {
        let txt = format_query_summary(&report(), Some("Lisbon, Portugal"));
        assert!(txt.contains("Place: Lisbon, Portugal"));
        assert!(txt.contains("Source: offline series"));
        assert!(txt.contains("2 negative precipitation"));
    }

    #[test]
    fn places_are_numbered() {
        let places = vec![Place {
            id: "1".to_string(),
            display_name: "Paris, France".to_string(),
            latitude: 48.8566,
            longitude: 2.3522,
        }];
        assert_eq!(format_places(&places), "  1) Paris, France (48.8566, 2.3522)\n");
        assert_eq!(format_places(&[]), "No places found.\n");
    }
}
