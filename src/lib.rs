//! xAPI Engagement
//!
//! Interaction and active-time statistics for interactive course content,
//! computed from cleaned Learning Locker xAPI exports.
//!
//! This crate provides the core implementation for the
//! `xapi-analyzer` CLI tool: event loading, grouping of elements into days
//! and units, per-element interaction percentages, gap-based duration
//! estimates, and the per-student rollup.
//!
//! ## Getting Started
//!
//! ```bash
//! xapi-analyzer analyze --data cleaned.csv --config DayElement.json --days 1-4
//! xapi-analyzer analyze --data cleaned.csv --ids 101,102 --summary
//! ```

pub mod aggregator;
pub mod commands;
pub mod engine;
pub mod grouping;
pub mod output;
pub mod parser;
pub mod utils;
