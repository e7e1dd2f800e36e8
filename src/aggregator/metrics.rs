//! Summary statistics over a group's duration results.
//!
//! These feed the run log and the `--summary` printout; they are not part of
//! the exported tables.

use super::duration::DurationResult;
use log::debug;
use serde::{Deserialize, Serialize};

/// Distribution of estimated minutes across the population
///
/// **Public** - returned from calculate_duration_distribution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DurationDistribution {
    /// Students in the population
    pub student_count: usize,

    /// Sum of all students' minutes
    pub total_minutes: f64,

    pub mean_minutes: f64,
    pub median_minutes: f64,
    pub max_minutes: f64,

    /// Students with no estimated active time
    pub zero_count: usize,
}

impl DurationDistribution {
    /// Percentage of the population with any estimated active time
    pub fn engaged_percentage(&self) -> f64 {
        if self.student_count == 0 {
            return 0.0;
        }
        (self.student_count - self.zero_count) as f64 / self.student_count as f64 * 100.0
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Students: {} | Mean: {:.1} min | Median: {:.1} min | Max: {:.1} min | Active: {:.1}%",
            self.student_count,
            self.mean_minutes,
            self.median_minutes,
            self.max_minutes,
            self.engaged_percentage()
        )
    }
}

/// Calculate the minutes distribution of one group
///
/// **Public** - main entry point for duration statistics
pub fn calculate_duration_distribution(durations: &DurationResult) -> DurationDistribution {
    if durations.minutes.is_empty() {
        return DurationDistribution::default();
    }

    let mut values: Vec<f64> = durations.minutes.values().copied().collect();
    values.sort_by(|a, b| a.total_cmp(b));

    let count = values.len();
    let total: f64 = values.iter().sum();
    let median = if count % 2 == 1 {
        values[count / 2]
    } else {
        (values[count / 2 - 1] + values[count / 2]) / 2.0
    };

    let distribution = DurationDistribution {
        student_count: count,
        total_minutes: total,
        mean_minutes: total / count as f64,
        median_minutes: median,
        max_minutes: values[count - 1],
        zero_count: values.iter().filter(|v| **v == 0.0).count(),
    };

    debug!("Duration distribution: {}", distribution.summary());
    distribution
}
