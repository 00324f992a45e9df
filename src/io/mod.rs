//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - aggregate table exports (CSV) and run summary (JSON) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
