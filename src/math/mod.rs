//! Mathematical utilities: dense linear algebra, least squares and trends.

pub mod linalg;
pub mod ols;
pub mod trend;

pub use linalg::*;
pub use ols::*;
pub use trend::*;

/// Round to 2 decimal places (half away from zero).
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
