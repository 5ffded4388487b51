//! Heat index (apparent temperature) from air temperature and relative humidity.
//!
//! Below 80 °F the Rothfusz regression is not defined and the air temperature
//! is returned unchanged. Above it we evaluate the NOAA 9-term polynomial in °F
//! with the standard low/high humidity adjustments, then convert back to °C.

use crate::domain::Series;
use crate::math::round2;

/// °F threshold below which apparent temperature equals air temperature.
const ROTHFUSZ_MIN_F: f64 = 80.0;

/// Heat index in °C. Polynomial results are rounded to 2 decimals; below the
/// threshold the air temperature passes through untouched.
pub fn heat_index(temp_c: Option<f64>, humidity_pct: Option<f64>) -> Option<f64> {
    let (t, r) = (temp_c?, humidity_pct?);
    if !(t.is_finite() && r.is_finite()) {
        return None;
    }

    let tf = celsius_to_fahrenheit(t);
    if tf < ROTHFUSZ_MIN_F {
        return Some(t);
    }

    let mut hi_f = rothfusz(tf, r);

    if r < 13.0 && (80.0..=112.0).contains(&tf) {
        hi_f -= ((13.0 - r) / 4.0) * ((17.0 - (tf - 95.0).abs()) / 17.0).sqrt();
    }
    if r > 85.0 && (80.0..=87.0).contains(&tf) {
        hi_f += ((r - 85.0) / 10.0) * ((87.0 - tf) / 5.0);
    }

    Some(round2((hi_f - 32.0) * 5.0 / 9.0))
}

/// Pointwise heat index; missing wherever either input is missing.
pub fn heat_index_series(temperature: &Series, humidity: &Series) -> Series {
    temperature.zip_with(humidity, |t, h| heat_index(Some(t), Some(h)))
}

fn rothfusz(tf: f64, r: f64) -> f64 {
    -42.379 + 2.04901523 * tf + 10.14333127 * r
        - 0.22475541 * tf * r
        - 0.00683783 * tf * tf
        - 0.05481717 * r * r
        + 0.00122874 * tf * tf * r
        + 0.00085282 * tf * r * r
        - 0.00000199 * tf * tf * r * r
}

fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}
