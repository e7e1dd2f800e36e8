//! Grouping of elements into days (chapters) and units.
//!
//! A run is driven by exactly one `GroupingStrategy`:
//! - an explicit element-id list
//! - a grouping configuration (day → unit → elements)
//! - label prefixes ("D3", "Day03") in the legacy pattern mode

pub mod pattern;
pub mod resolver;

pub use pattern::{assign_elements_by_label, label_group_number, label_matches_group};
pub use resolver::{DaySelector, Group, GroupingStrategy, Resolution, RunMode};
