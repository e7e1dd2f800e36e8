//! Output writers for run results.
//!
//! This module handles writing data to disk:
//! - CSV element, duration and rollup reports
//! - The JSON run summary
//! - Timestamped file naming

pub mod csv;
pub mod json;
pub mod naming;
pub mod schema;

// Re-export main functions
pub use self::csv::{write_duration_report, write_element_report, write_rollup};
pub use json::{read_summary, summary_to_string, write_summary};
pub use naming::{prepare_path, validate_path, OutputNaming};
pub use schema::{GroupSummary, RunSummary, SkippedGroup};
