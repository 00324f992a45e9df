//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - pollutant / season / AQI-band enums with their fixed tables
//! - normalized measurement rows (`Reading`)
//! - run configuration (`ReportConfig`)

pub mod types;

pub use types::*;
