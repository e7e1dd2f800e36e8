//! Per-element interaction sets and class percentages.
//!
//! For every element of a group we record who interacted with it (distinct
//! students with a positive verb), what share of the class that is, and the
//! element's first non-empty label.

use crate::grouping::Group;
use crate::parser::event::{ElementId, Event, StudentId};
use crate::utils::error::EngineError;
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Interaction statistics for one group.
///
/// All maps are keyed by exactly the group's element ids, so they iterate
/// in the same (ascending) order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResult {
    pub labels: BTreeMap<ElementId, Option<String>>,
    pub interactions: BTreeMap<ElementId, BTreeSet<StudentId>>,
    pub percentages: BTreeMap<ElementId, f64>,

    /// Mean reported duration (seconds) per element, when any was reported
    pub duration_hints: BTreeMap<ElementId, Option<f64>>,
}

/// One exportable row of an `InteractionResult`
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRow<'a> {
    pub element_id: ElementId,
    pub label: Option<&'a str>,
    pub students: &'a BTreeSet<StudentId>,
    pub percentage: f64,
    pub average_duration_hint: Option<f64>,
}

impl ElementRow<'_> {
    pub fn interaction_count(&self) -> usize {
        self.students.len()
    }
}

impl InteractionResult {
    /// Rows in ascending element order
    pub fn rows(&self) -> Vec<ElementRow<'_>> {
        self.interactions
            .iter()
            .map(|(&element_id, students)| ElementRow {
                element_id,
                label: self.labels.get(&element_id).and_then(|l| l.as_deref()),
                students,
                percentage: self.percentages.get(&element_id).copied().unwrap_or(0.0),
                average_duration_hint: self.duration_hints.get(&element_id).copied().flatten(),
            })
            .collect()
    }

    pub fn element_count(&self) -> usize {
        self.interactions.len()
    }

    /// Distinct students who interacted with at least one element
    pub fn engaged_students(&self) -> BTreeSet<&StudentId> {
        self.interactions.values().flatten().collect()
    }

    /// Mean of the per-element percentages (0 for a group without elements)
    pub fn mean_percentage(&self) -> f64 {
        if self.percentages.is_empty() {
            return 0.0;
        }
        self.percentages.values().sum::<f64>() / self.percentages.len() as f64
    }
}

/// Compute interaction sets and percentages for `group`.
///
/// # Arguments
/// * `group` - Resolved group; every element id appears in the result
/// * `events` - Events restricted to the group's elements, in table order
/// * `population` - The run's student population
///
/// # Errors
/// * `EngineError::EmptyPopulation` - percentages are undefined
pub fn aggregate_interactions(
    group: &Group,
    events: &[&Event],
    population: &BTreeSet<StudentId>,
) -> Result<InteractionResult, EngineError> {
    if population.is_empty() {
        return Err(EngineError::EmptyPopulation);
    }

    let mut labels: BTreeMap<ElementId, Option<String>> =
        group.element_ids.iter().map(|&id| (id, None)).collect();
    let mut interactions: BTreeMap<ElementId, BTreeSet<StudentId>> =
        group.element_ids.iter().map(|&id| (id, BTreeSet::new())).collect();
    let mut hint_sums: BTreeMap<ElementId, (f64, usize)> = BTreeMap::new();

    for event in events {
        let Some(students) = interactions.get_mut(&event.element_id) else {
            continue;
        };

        if let (Some(slot), Some(label)) = (labels.get_mut(&event.element_id), event.non_empty_label()) {
            if slot.is_none() {
                *slot = Some(label.to_string());
            }
        }

        if event.verb.is_positive() && population.contains(&event.student_id) {
            students.insert(event.student_id.clone());
        }

        if let Some(hint) = event.duration_hint {
            let entry = hint_sums.entry(event.element_id).or_insert((0.0, 0));
            entry.0 += hint;
            entry.1 += 1;
        }
    }

    let population_size = population.len() as f64;
    let percentages = interactions
        .iter()
        .map(|(&id, students)| (id, students.len() as f64 / population_size * 100.0))
        .collect();

    let duration_hints = group
        .element_ids
        .iter()
        .map(|&id| {
            let mean = hint_sums
                .get(&id)
                .filter(|(_, count)| *count > 0)
                .map(|(sum, count)| sum / *count as f64);
            (id, mean)
        })
        .collect();

    debug!(
        "{}: {} elements, {} events, population {}",
        group.name,
        interactions.len(),
        events.len(),
        population.len()
    );

    Ok(InteractionResult {
        labels,
        interactions,
        percentages,
        duration_hints,
    })
}
