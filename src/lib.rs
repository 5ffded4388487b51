//! `sky-outlook` library crate.
//!
//! The binary (`sky`) is a thin wrapper around this library so that:
//!
//! - the fetch/regression pipeline is testable without spawning processes
//! - provider clients can be swapped for in-memory sources in tests
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod units;
