//! Display-unit conversion.
//!
//! Everything upstream of presentation works in canonical metric units
//! (°C, mm, m/s, %, UV index). Conversion happens only at the display edge;
//! comfort classification and extreme flags stay in the canonical domain.

pub mod comfort;

pub use comfort::*;

use crate::domain::{RainfallUnit, Series, TemperatureUnit, UnitSettings, Variable, WindUnit};

/// Convert one canonical value into the configured display unit.
///
/// The heat index is a temperature and follows the temperature unit; humidity
/// and UV have no alternative units.
pub fn convert(var: Variable, value: f64, units: &UnitSettings) -> f64 {
    match var {
        Variable::Temperature | Variable::HeatIndex => match units.temperature {
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Fahrenheit => value * 9.0 / 5.0 + 32.0,
        },
        Variable::Rainfall => match units.rainfall {
            RainfallUnit::Millimeters => value,
            RainfallUnit::Inches => value / 25.4,
        },
        Variable::Wind => match units.wind {
            WindUnit::MetersPerSecond => value,
            WindUnit::KilometersPerHour => value * 3.6,
            WindUnit::MilesPerHour => value * 2.237,
        },
        Variable::Humidity | Variable::UvIndex => value,
    }
}

/// Inverse of [`convert`]: a display-unit value back to canonical metric.
pub fn to_canonical(var: Variable, value: f64, units: &UnitSettings) -> f64 {
    match var {
        Variable::Temperature | Variable::HeatIndex => match units.temperature {
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        },
        Variable::Rainfall => match units.rainfall {
            RainfallUnit::Millimeters => value,
            RainfallUnit::Inches => value * 25.4,
        },
        Variable::Wind => match units.wind {
            WindUnit::MetersPerSecond => value,
            WindUnit::KilometersPerHour => value / 3.6,
            WindUnit::MilesPerHour => value / 2.237,
        },
        Variable::Humidity | Variable::UvIndex => value,
    }
}

pub fn convert_opt(var: Variable, value: Option<f64>, units: &UnitSettings) -> Option<f64> {
    value.map(|v| convert(var, v, units))
}

/// Convert every present entry; missing stays missing.
pub fn convert_series(var: Variable, series: &Series, units: &UnitSettings) -> Series {
    series.map(|v| convert(var, v, units))
}

/// Display symbol for a variable under the configured units (empty for UV).
pub fn unit_symbol(var: Variable, units: &UnitSettings) -> &'static str {
    match var {
        Variable::Temperature | Variable::HeatIndex => match units.temperature {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        },
        Variable::Rainfall => match units.rainfall {
            RainfallUnit::Millimeters => "mm",
            RainfallUnit::Inches => "in",
        },
        Variable::Wind => match units.wind {
            WindUnit::MetersPerSecond => "m/s",
            WindUnit::KilometersPerHour => "km/h",
            WindUnit::MilesPerHour => "mph",
        },
        Variable::Humidity => "%",
        Variable::UvIndex => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imperial() -> UnitSettings {
        UnitSettings {
            temperature: TemperatureUnit::Fahrenheit,
            rainfall: RainfallUnit::Inches,
            wind: WindUnit::MilesPerHour,
        }
    }

    #[test]
    fn metric_is_identity() {
        let units = UnitSettings::default();
        for var in Variable::ALL {
            assert_eq!(convert(var, 12.5, &units), 12.5);
        }
    }

    #[test]
    fn converts_to_imperial() {
        let units = imperial();
        assert!((convert(Variable::Temperature, 100.0, &units) - 212.0).abs() < 1e-9);
        assert!((convert(Variable::HeatIndex, 0.0, &units) - 32.0).abs() < 1e-9);
        assert!((convert(Variable::Rainfall, 25.4, &units) - 1.0).abs() < 1e-9);
        assert!((convert(Variable::Wind, 10.0, &units) - 22.37).abs() < 1e-9);
        assert_eq!(convert(Variable::Humidity, 55.0, &units), 55.0);
    }

    #[test]
    fn canonical_undoes_display_conversion() {
        let units = imperial();
        assert!((to_canonical(Variable::Temperature, 95.0, &units) - 35.0).abs() < 1e-9);
        assert!((to_canonical(Variable::Rainfall, 2.0, &units) - 50.8).abs() < 1e-9);
        for var in Variable::ALL {
            let back = to_canonical(var, convert(var, 17.3, &units), &units);
            assert!((back - 17.3).abs() < 1e-9, "{var:?}: {back}");
        }
    }

    #[test]
    fn kmh_and_symbols() {
        let units = UnitSettings {
            wind: WindUnit::KilometersPerHour,
            ..UnitSettings::default()
        };
        assert!((convert(Variable::Wind, 5.0, &units) - 18.0).abs() < 1e-9);
        assert_eq!(unit_symbol(Variable::Wind, &units), "km/h");
        assert_eq!(unit_symbol(Variable::HeatIndex, &imperial()), "°F");
        assert_eq!(unit_symbol(Variable::Humidity, &units), "%");
        assert_eq!(unit_symbol(Variable::UvIndex, &units), "");
    }

    #[test]
    fn series_conversion_keeps_gaps() {
        let s = Series::new(vec![Some(0.0), None, Some(10.0)]);
        let out = convert_series(Variable::Temperature, &s, &imperial());
        assert_eq!(out.values(), &[Some(32.0), None, Some(50.0)]);
    }
}
