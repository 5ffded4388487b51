//! Error types.
//!
//! Two layers:
//! - `EngineError`: typed failures raised by the library (fetching, algebra, fitting).
//!   Most of them are *local*: the pipeline degrades a single year or a single
//!   target instead of aborting.
//! - `AppError`: what the binary reports, carrying the process exit code.

use thiserror::Error;

/// Library-level failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Query input rejected before any fetch or fit.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Provider had nothing for this year.
    #[error("No data for {year}: {reason}")]
    DataUnavailable { year: i32, reason: String },

    /// Provider payload did not have the expected shape.
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// Transport-level failure (timeout, connection, HTTP status).
    #[error("Request failed: {0}")]
    Request(String),

    /// Fewer complete rows than a regression needs.
    #[error("Insufficient samples: {rows} complete row(s), need at least 2")]
    InsufficientSamples { rows: usize },

    /// Zero (or numerically zero) pivot during Gauss-Jordan inversion.
    #[error("Singular matrix: zero pivot at column {pivot}")]
    SingularMatrix { pivot: usize },

    /// Matrix product with incompatible shapes.
    #[error("Dimension mismatch: {}x{} * {}x{}", left.0, left.1, right.0, right.1)]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    /// Vector/series lengths disagree.
    #[error("Shape mismatch: expected length {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    /// A computation produced a non-finite value.
    #[error("Numerical failure: {0}")]
    NumericalFailure(String),

    /// Environment or preferences could not be interpreted.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker pool or other runtime setup failed.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl EngineError {
    /// Exit code used when this error surfaces at the process boundary.
    pub fn exit_code(&self) -> u8 {
        match self {
            EngineError::Config(_) => 2,
            EngineError::InvalidQuery(_) => 3,
            _ => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_render_readable_messages() {
        let err = EngineError::DimensionMismatch {
            left: (2, 3),
            right: (2, 2),
        };
        assert_eq!(err.to_string(), "Dimension mismatch: 2x3 * 2x2");

        let err = EngineError::InsufficientSamples { rows: 1 };
        assert_eq!(
            err.to_string(),
            "Insufficient samples: 1 complete row(s), need at least 2"
        );
    }

    #[test]
    fn invalid_query_maps_to_input_exit_code() {
        let app: AppError = EngineError::InvalidQuery("latitude out of range".to_string()).into();
        assert_eq!(app.exit_code(), 3);
        assert_eq!(app.to_string(), "Invalid query: latitude out of range");
    }
}
