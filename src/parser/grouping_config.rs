//! Grouping configuration (`DayElement.json`) schema and validation.
//!
//! ```json
//! {
//!   "Time_Delta": 10,
//!   "Filter_Emails": ["instructor@wisc.edu"],
//!   "Days": {
//!     "Day1": { "DayNumber": 1, "Unit": 1, "Elements": [101, 102] }
//!   }
//! }
//! ```
//!
//! Every structural problem surfaces as `EngineError::Configuration` before
//! any aggregation starts.

use super::event::{ElementId, StudentId};
use super::xapi_csv::normalize_student_id;
use crate::utils::error::EngineError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Top-level grouping configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Gap threshold in minutes
    #[serde(rename = "Time_Delta", default, skip_serializing_if = "Option::is_none")]
    pub time_delta: Option<f64>,

    /// Students (staff, test accounts) excluded from the run
    #[serde(rename = "Filter_Emails", default)]
    pub filter_emails: Vec<String>,

    /// Whether one element may be listed under several days
    #[serde(rename = "Allow_Shared_Elements", default)]
    pub allow_shared_elements: bool,

    #[serde(rename = "Days")]
    pub days: BTreeMap<String, DayConfig>,
}

/// One day (chapter) entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayConfig {
    #[serde(rename = "DayNumber")]
    pub day_number: u32,

    #[serde(rename = "Unit")]
    pub unit: u32,

    #[serde(rename = "Elements")]
    pub elements: Vec<ElementId>,
}

impl GroupingConfig {
    /// Check the invariants serde cannot express
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.days.is_empty() {
            return Err(EngineError::Configuration(
                "\"Days\" must list at least one day".to_string(),
            ));
        }

        if let Some(delta) = self.time_delta {
            if !delta.is_finite() || delta <= 0.0 {
                return Err(EngineError::Configuration(format!(
                    "\"Time_Delta\" must be a positive number of minutes, got {}",
                    delta
                )));
            }
        }

        let mut seen_numbers: HashMap<u32, &str> = HashMap::new();
        let mut element_owner: HashMap<ElementId, u32> = HashMap::new();

        for (key, day) in &self.days {
            if day.elements.is_empty() {
                return Err(EngineError::Configuration(format!(
                    "day \"{}\" references no elements",
                    key
                )));
            }

            if let Some(other) = seen_numbers.insert(day.day_number, key.as_str()) {
                return Err(EngineError::Configuration(format!(
                    "DayNumber {} is used by both \"{}\" and \"{}\"",
                    day.day_number, other, key
                )));
            }

            if self.allow_shared_elements {
                continue;
            }
            for &element in &day.elements {
                match element_owner.get(&element) {
                    Some(&owner) if owner != day.day_number => {
                        return Err(EngineError::Configuration(format!(
                            "element {} is listed under days {} and {}; \
                             set \"Allow_Shared_Elements\" to permit this",
                            element, owner, day.day_number
                        )));
                    }
                    _ => {
                        element_owner.insert(element, day.day_number);
                    }
                }
            }
        }

        Ok(())
    }

    /// Days sorted by day number
    pub fn days_in_order(&self) -> Vec<&DayConfig> {
        let mut days: Vec<&DayConfig> = self.days.values().collect();
        days.sort_by_key(|d| d.day_number);
        days
    }

    /// Filter list normalized the same way the loader normalizes identities
    pub fn filter_students(&self) -> Vec<StudentId> {
        self.filter_emails
            .iter()
            .filter_map(|s| normalize_student_id(s))
            .collect()
    }

    /// Distinct unit ids in first-seen day order
    pub fn units(&self) -> Vec<u32> {
        let mut units = Vec::new();
        for day in self.days_in_order() {
            if !units.contains(&day.unit) {
                units.push(day.unit);
            }
        }
        units
    }
}

/// Parse and validate a grouping configuration from a JSON string
pub fn parse_grouping_config(json: &str) -> Result<GroupingConfig, EngineError> {
    let config: GroupingConfig = serde_json::from_str(json)
        .map_err(|e| EngineError::Configuration(e.to_string()))?;

    config.validate()?;
    debug!(
        "Grouping config: {} days, {} filtered students",
        config.days.len(),
        config.filter_emails.len()
    );

    Ok(config)
}

/// Read, parse and validate a grouping configuration file
pub fn load_grouping_config(path: impl AsRef<Path>) -> Result<GroupingConfig, EngineError> {
    let path = path.as_ref();
    info!("Loading grouping configuration from: {}", path.display());

    let json = std::fs::read_to_string(path).map_err(|e| {
        EngineError::Configuration(format!("cannot read {}: {}", path.display(), e))
    })?;

    parse_grouping_config(&json)
}
