//! Output file naming and path validation.
//!
//! Every run stamps its files with the local time so repeated runs never
//! overwrite each other.

use crate::grouping::Group;
use crate::utils::error::OutputError;
use chrono::{DateTime, Local};
use log::debug;
use std::path::{Path, PathBuf};

/// File names for one run's outputs
#[derive(Debug, Clone)]
pub struct OutputNaming {
    dir: PathBuf,
    stamp: String,
}

impl OutputNaming {
    /// Names under `dir`, stamped with the current local time
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_time(dir, Local::now())
    }

    pub fn with_time(dir: impl Into<PathBuf>, time: DateTime<Local>) -> Self {
        Self {
            dir: dir.into(),
            stamp: time.format("%Y-%m-%d_%H-%M-%S").to_string(),
        }
    }

    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    /// Element report of an explicit-id run
    pub fn selection_report(&self) -> PathBuf {
        self.dir.join(format!("xAPI-Data-Analyzer_{}.csv", self.stamp))
    }

    /// Element report of one day
    pub fn group_report(&self, group: &Group) -> PathBuf {
        self.dir.join(format!("Day{}_{}.csv", group.number, self.stamp))
    }

    /// Student durations of one day
    pub fn group_durations(&self, group: &Group) -> PathBuf {
        self.dir
            .join(format!("StudentDurations_Day{}_{}.csv", group.number, self.stamp))
    }

    /// Student durations of the whole run (rollup, or the explicit selection)
    pub fn run_durations(&self) -> PathBuf {
        self.dir.join(format!("StudentDurations_{}.csv", self.stamp))
    }
}

/// Validate that output path is writable
///
/// **Public** - shared by the CSV and JSON writers
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    // Check if we're trying to overwrite a directory
    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Validate `path` and create its parent directories
pub fn prepare_path(path: &Path) -> Result<(), OutputError> {
    validate_path(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    Ok(())
}

/// Calculate file size in bytes
pub(crate) fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
