//! Reporting utilities: prediction tables, series tables and summaries.

pub mod format;

pub use format::*;
