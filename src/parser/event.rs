//! Core event model shared by every stage of the engine.
//!
//! The event table is built once per run and never mutated afterwards.
//! `AnalysisContext` bundles it with the student population so components
//! receive one read-only handle instead of reaching for globals.

use crate::utils::config::POSITIVE_VERBS;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Stable student identity (normalized email or actor UUID)
pub type StudentId = String;

/// Integer H5P id of an embedded interactive element
pub type ElementId = u64;

/// xAPI verb vocabulary understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    Interacted,
    Attempted,
    Progressed,
    Completed,
    Experienced,
    Consumed,
    Other,
}

impl Verb {
    /// Parse a verb from its display name or its xAPI IRI.
    ///
    /// `http://adlnet.gov/expapi/verbs/completed` and `completed` both map to
    /// `Verb::Completed`. Anything unrecognised becomes `Verb::Other`.
    pub fn parse(raw: &str) -> Self {
        let name = raw
            .trim()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();

        match name.as_str() {
            "interacted" => Verb::Interacted,
            "attempted" => Verb::Attempted,
            "progressed" => Verb::Progressed,
            "completed" => Verb::Completed,
            "experienced" => Verb::Experienced,
            "consumed" => Verb::Consumed,
            _ => Verb::Other,
        }
    }

    /// Lowercase display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Interacted => "interacted",
            Verb::Attempted => "attempted",
            Verb::Progressed => "progressed",
            Verb::Completed => "completed",
            Verb::Experienced => "experienced",
            Verb::Consumed => "consumed",
            Verb::Other => "other",
        }
    }

    /// Whether this verb means the student actively interacted
    pub fn is_positive(&self) -> bool {
        POSITIVE_VERBS.contains(&self.as_str())
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One interaction record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub student_id: StudentId,
    pub element_id: ElementId,
    pub verb: Verb,
    pub timestamp: DateTime<Utc>,

    /// Title or slide name, when the statement carried one
    pub label: Option<String>,

    /// Reported duration in seconds. Unreliable; only ever a fallback signal.
    pub duration_hint: Option<f64>,
}

impl Event {
    pub fn new(
        student_id: impl Into<StudentId>,
        element_id: ElementId,
        verb: Verb,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            element_id,
            verb,
            timestamp,
            label: None,
            duration_hint: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_duration_hint(mut self, seconds: f64) -> Self {
        self.duration_hint = Some(seconds);
        self
    }

    /// Label if present and not blank
    pub fn non_empty_label(&self) -> Option<&str> {
        self.label.as_deref().filter(|l| !l.trim().is_empty())
    }
}

/// In-memory table of events, in load order
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    events: Vec<Event>,
}

impl EventTable {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events touching any of `element_ids`, preserving table order
    pub fn for_elements(&self, element_ids: &[ElementId]) -> Vec<&Event> {
        let wanted: HashSet<ElementId> = element_ids.iter().copied().collect();
        self.events
            .iter()
            .filter(|e| wanted.contains(&e.element_id))
            .collect()
    }

    /// Whether at least one row references `element_id`
    pub fn contains_element(&self, element_id: ElementId) -> bool {
        self.events.iter().any(|e| e.element_id == element_id)
    }

    /// Distinct students with at least one event
    pub fn distinct_students(&self) -> BTreeSet<StudentId> {
        self.events.iter().map(|e| e.student_id.clone()).collect()
    }
}

/// Immutable per-run context: the event table and the student population.
///
/// The population is fixed at construction and shared read-only by every
/// group processed in the run.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    table: EventTable,
    population: BTreeSet<StudentId>,
}

impl AnalysisContext {
    /// Build the context, dropping events from any student in `filter_students`
    /// (staff and test accounts) before the population is derived.
    pub fn new(table: EventTable, filter_students: &[StudentId]) -> Self {
        let filtered: HashSet<&str> = filter_students.iter().map(|s| s.as_str()).collect();

        let table = if filtered.is_empty() {
            table
        } else {
            let before = table.len();
            let kept: Vec<Event> = table
                .events
                .into_iter()
                .filter(|e| !filtered.contains(e.student_id.as_str()))
                .collect();
            debug!(
                "Filtered {} events from {} excluded students",
                before - kept.len(),
                filtered.len()
            );
            EventTable::new(kept)
        };

        let population = table.distinct_students();
        debug!(
            "Analysis context: {} events, {} students",
            table.len(),
            population.len()
        );

        Self { table, population }
    }

    pub fn table(&self) -> &EventTable {
        &self.table
    }

    pub fn population(&self) -> &BTreeSet<StudentId> {
        &self.population
    }

    pub fn population_size(&self) -> usize {
        self.population.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 1, 9, minute, 0).unwrap()
    }

    #[test]
    fn test_verb_parse_plain_and_iri() {
        assert_eq!(Verb::parse("completed"), Verb::Completed);
        assert_eq!(
            Verb::parse("http://adlnet.gov/expapi/verbs/interacted"),
            Verb::Interacted
        );
        assert_eq!(Verb::parse("Attempted "), Verb::Attempted);
        assert_eq!(Verb::parse("answered"), Verb::Other);
        assert_eq!(Verb::parse(""), Verb::Other);
    }

    #[test]
    fn test_consumed_is_not_positive() {
        assert!(!Verb::Consumed.is_positive());
        assert!(!Verb::Other.is_positive());
        assert!(Verb::Experienced.is_positive());
    }

    #[test]
    fn test_for_elements_keeps_table_order() {
        let table = EventTable::new(vec![
            Event::new("b", 2, Verb::Interacted, at(1)),
            Event::new("a", 1, Verb::Interacted, at(2)),
            Event::new("c", 3, Verb::Interacted, at(3)),
            Event::new("a", 2, Verb::Completed, at(4)),
        ]);

        let rows = table.for_elements(&[2, 3]);
        let students: Vec<&str> = rows.iter().map(|e| e.student_id.as_str()).collect();
        assert_eq!(students, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_context_filters_students_before_population() {
        let table = EventTable::new(vec![
            Event::new("alice", 1, Verb::Interacted, at(0)),
            Event::new("prof", 1, Verb::Interacted, at(1)),
            Event::new("bob", 2, Verb::Attempted, at(2)),
        ]);

        let ctx = AnalysisContext::new(table, &["prof".to_string()]);
        assert_eq!(ctx.population_size(), 2);
        assert!(!ctx.population().contains("prof"));
        assert_eq!(ctx.table().len(), 2);
    }

    #[test]
    fn test_blank_label_is_treated_as_absent() {
        let event = Event::new("a", 1, Verb::Interacted, at(0)).with_label("   ");
        assert!(event.non_empty_label().is_none());
    }
}
