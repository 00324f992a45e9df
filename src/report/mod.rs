//! Reporting: terminal summary and the static HTML dashboard.

pub mod format;
pub mod html;

pub use format::*;
pub use html::*;
