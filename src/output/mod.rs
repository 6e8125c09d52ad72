//! Output writers for stream summaries.
//!
//! This module handles the JSON metrics summary produced by `inspect`.

pub mod json;
pub mod schema;

// Re-export main types and functions
pub use json::{load_summary, save_summary, write_summary};
pub use schema::{StreamSummary, SubTraceSummary, TraceSummary};
