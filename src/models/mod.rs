//! Physical models derived from base climate variables.
//!
//! Models are implemented as small, pure functions so the prediction pipeline
//! can derive series without side effects.

pub mod heat_index;

pub use heat_index::*;
