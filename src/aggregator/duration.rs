//! Per-student active time, estimated from event timestamps.
//!
//! Session-chaining heuristic: sort a student's events in the group by time
//! and walk consecutive pairs. A delta shorter than the gap threshold is
//! continuous engagement and is added to the total. A delta at or above the
//! threshold is a session break and contributes nothing; the gap is dropped,
//! not capped at the threshold.
//!
//! The estimate never exceeds the wall-clock span of a student's events and
//! can only grow as the threshold grows.

use crate::grouping::Group;
use crate::parser::event::{Event, StudentId};
use crate::utils::config::DEFAULT_GAP_MINUTES;
use crate::utils::error::EngineError;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Maximum inter-event delta treated as continuous engagement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapThreshold {
    minutes: f64,
}

impl GapThreshold {
    /// Threshold of `minutes`; must be positive and finite
    pub fn from_minutes(minutes: f64) -> Result<Self, EngineError> {
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(EngineError::Configuration(format!(
                "gap threshold must be a positive number of minutes, got {}",
                minutes
            )));
        }
        Ok(Self { minutes })
    }

    pub fn minutes(&self) -> f64 {
        self.minutes
    }

    pub fn as_duration(&self) -> Duration {
        Duration::milliseconds((self.minutes * 60_000.0).round() as i64)
    }
}

impl Default for GapThreshold {
    fn default() -> Self {
        Self {
            minutes: DEFAULT_GAP_MINUTES,
        }
    }
}

/// Minutes of estimated active time per student for one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationResult {
    /// Every population member, zero when they had no usable events
    pub minutes: BTreeMap<StudentId, f64>,

    /// Events the group contained; zero means the group was empty
    pub event_count: usize,
}

impl DurationResult {
    pub fn minutes_for(&self, student: &str) -> f64 {
        self.minutes.get(student).copied().unwrap_or(0.0)
    }

    pub fn is_empty_group(&self) -> bool {
        self.event_count == 0
    }
}

/// Estimate active minutes for every population member within `group`.
///
/// # Arguments
/// * `group` - Group being processed (used for error context)
/// * `events` - Events restricted to the group's elements
/// * `population` - The run's student population
/// * `gap` - Session-break threshold
///
/// # Errors
/// * `EngineError::InvalidTimestampOrder` - a negative delta was produced
pub fn estimate_durations(
    group: &Group,
    events: &[&Event],
    population: &BTreeSet<StudentId>,
    gap: GapThreshold,
) -> Result<DurationResult, EngineError> {
    let mut per_student: BTreeMap<&str, Vec<DateTime<Utc>>> = BTreeMap::new();
    for event in events {
        if population.contains(&event.student_id) {
            per_student
                .entry(event.student_id.as_str())
                .or_default()
                .push(event.timestamp);
        }
    }

    let mut minutes: BTreeMap<StudentId, f64> =
        population.iter().map(|s| (s.clone(), 0.0)).collect();

    for (student, mut timestamps) in per_student {
        timestamps.sort();
        let active = active_time(&timestamps, gap).map_err(|(previous, next)| {
            EngineError::InvalidTimestampOrder {
                student: student.to_string(),
                group: group.name.clone(),
                previous,
                next,
            }
        })?;
        minutes.insert(student.to_string(), to_minutes(active));
    }

    debug!(
        "{}: estimated durations for {} students from {} events (gap {} min)",
        group.name,
        minutes.len(),
        events.len(),
        gap.minutes()
    );

    Ok(DurationResult {
        minutes,
        event_count: events.len(),
    })
}

/// Sum of consecutive deltas shorter than `gap`.
///
/// Expects ascending timestamps; returns the offending pair if a delta is
/// negative.
pub fn active_time(
    timestamps: &[DateTime<Utc>],
    gap: GapThreshold,
) -> Result<Duration, (DateTime<Utc>, DateTime<Utc>)> {
    let gap = gap.as_duration();
    let mut total = Duration::zero();

    for pair in timestamps.windows(2) {
        let delta = pair[1] - pair[0];
        if delta < Duration::zero() {
            return Err((pair[0], pair[1]));
        }
        if delta < gap {
            total = total + delta;
        }
    }

    Ok(total)
}

fn to_minutes(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 60_000.0
}
