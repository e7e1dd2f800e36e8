//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use crate::parser::event::ElementId;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by the aggregation engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid grouping configuration: {0}")]
    Configuration(String),

    #[error("Student population is empty; percentages are undefined")]
    EmptyPopulation,

    #[error("Element {0} has no matching rows in the event table")]
    UnknownElement(ElementId),

    #[error(
        "Negative time delta for student {student} in {group}: {next} precedes {previous}"
    )]
    InvalidTimestampOrder {
        student: String,
        group: String,
        previous: DateTime<Utc>,
        next: DateTime<Utc>,
    },
}

impl EngineError {
    /// Errors that only invalidate a single group in a multi-group run
    pub fn is_group_local(&self) -> bool {
        matches!(self, EngineError::InvalidTimestampOrder { .. })
    }
}

/// Errors that can occur while loading the event table
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("CSV read failed: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Missing required column (expected one of: {0})")]
    MissingColumn(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to write CSV: {0}")]
    CsvFailed(#[from] csv::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
