//! Aggregation of grouped events into engagement statistics.
//!
//! This module transforms a group's events into:
//! - Per-element interaction sets and class percentages
//! - Per-student active-time estimates
//! - The run-wide rollup of minutes by day, unit and total

pub mod duration;
pub mod interaction;
pub mod metrics;
pub mod rollup;

// Re-export main types and functions
pub use duration::{active_time, estimate_durations, DurationResult, GapThreshold};
pub use interaction::{aggregate_interactions, ElementRow, InteractionResult};
pub use metrics::{calculate_duration_distribution, DurationDistribution};
pub use rollup::{build_rollup, ColumnKind, RollupBuilder, RollupColumn, RollupTable};
