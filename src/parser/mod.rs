//! Event ingestion and grouping configuration.
//!
//! This module handles:
//! - The in-memory event model and per-run context
//! - Loading Learning Locker CSV exports
//! - Parsing and validating the grouping configuration

pub mod event;
pub mod grouping_config;
pub mod xapi_csv;

// Re-export main types
pub use event::{AnalysisContext, ElementId, Event, EventTable, StudentId, Verb};
pub use grouping_config::{load_grouping_config, parse_grouping_config, DayConfig, GroupingConfig};
pub use xapi_csv::{load_events, read_events, DropStats, LoadedTable};
