//! Input/output helpers.
//!
//! - series CSV ingest (`ingest`)
//! - series CSV + JSON report exports (`export`)
//! - preferences file read/write (`settings`)

pub mod export;
pub mod ingest;
pub mod settings;

pub use export::*;
pub use ingest::*;
pub use settings::*;
