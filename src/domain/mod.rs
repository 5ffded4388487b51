//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - climate variables, aligned series and variable sets (`Variable`, `Series`, `VariableSet`)
//! - query inputs (`Location`, `QueryRequest`, `LookbackWindow`)
//! - prediction outputs (`Coefficients`, `TargetPrediction`, `PredictionMap`)
//! - user preferences read by the display layer (`Preferences`)

pub mod preferences;
pub mod types;

pub use preferences::*;
pub use types::*;
