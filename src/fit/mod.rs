//! Regression orchestration.
//!
//! Responsibilities:
//!
//! - build complete-case design matrices per target
//! - fit each target on its fixed predictors (dropping redundant ones)
//! - sanitize predictions into physical ranges

pub mod design;
pub mod predictor;

pub use design::*;
pub use predictor::*;
