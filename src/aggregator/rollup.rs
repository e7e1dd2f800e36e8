//! Fold per-group durations into the run-wide rollup table.
//!
//! Column layout: one column per group (group-number order), then one column
//! per unit (first-seen order), then `Total`. Unit columns accumulate the
//! groups that belong to them; `Total` sums the unit columns plus any group
//! that belongs to no unit, so no group is ever counted twice.

use super::duration::DurationResult;
use crate::grouping::Group;
use crate::parser::event::StudentId;
use crate::utils::config::{TOTAL_COLUMN, UNIT_COLUMN_PREFIX};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What a rollup column aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ColumnKind {
    Group(u32),
    Unit(u32),
    Total,
}

/// One named column of per-student minutes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupColumn {
    pub name: String,
    pub kind: ColumnKind,
    pub values: BTreeMap<StudentId, f64>,
}

impl RollupColumn {
    fn zeroed(name: String, kind: ColumnKind, students: &[StudentId]) -> Self {
        Self {
            name,
            kind,
            values: students.iter().map(|s| (s.clone(), 0.0)).collect(),
        }
    }

    fn add(&mut self, durations: &DurationResult) {
        for (student, value) in self.values.iter_mut() {
            *value += durations.minutes_for(student);
        }
    }
}

/// Student × column table of minutes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupTable {
    /// Row order (sorted student ids)
    pub students: Vec<StudentId>,
    pub columns: Vec<RollupColumn>,
}

impl RollupTable {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&RollupColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn value(&self, student: &str, column: &str) -> Option<f64> {
        self.column(column)?.values.get(student).copied()
    }

    pub fn total(&self, student: &str) -> Option<f64> {
        self.value(student, TOTAL_COLUMN)
    }

    /// At least one group column exists
    pub fn has_group_columns(&self) -> bool {
        self.columns
            .iter()
            .any(|c| matches!(c.kind, ColumnKind::Group(_)))
    }
}

/// Incremental rollup, one group at a time
#[derive(Debug, Clone)]
pub struct RollupBuilder {
    students: Vec<StudentId>,
    group_columns: Vec<RollupColumn>,
    unit_columns: Vec<RollupColumn>,
    unitless: RollupColumn,
}

impl RollupBuilder {
    pub fn new(population: &BTreeSet<StudentId>) -> Self {
        let students: Vec<StudentId> = population.iter().cloned().collect();
        let unitless = RollupColumn::zeroed(String::new(), ColumnKind::Total, &students);
        Self {
            students,
            group_columns: Vec::new(),
            unit_columns: Vec::new(),
            unitless,
        }
    }

    /// Add one group's durations. Empty groups are skipped entirely and
    /// do not touch their unit. Returns whether the group was folded in.
    pub fn fold(&mut self, group: &Group, durations: &DurationResult) -> bool {
        if durations.is_empty_group() {
            debug!("Rollup: skipping {} (no events)", group.name);
            return false;
        }

        let mut column =
            RollupColumn::zeroed(group.name.clone(), ColumnKind::Group(group.number), &self.students);
        column.add(durations);
        self.group_columns.push(column);

        match group.unit {
            Some(unit) => {
                let kind = ColumnKind::Unit(unit);
                match self.unit_columns.iter_mut().find(|c| c.kind == kind) {
                    Some(existing) => existing.add(durations),
                    None => {
                        let mut seeded = RollupColumn::zeroed(
                            format!("{} {}", UNIT_COLUMN_PREFIX, unit),
                            kind,
                            &self.students,
                        );
                        seeded.add(durations);
                        self.unit_columns.push(seeded);
                    }
                }
            }
            None => self.unitless.add(durations),
        }

        true
    }

    /// Finalize column order and append the total
    pub fn finish(self) -> RollupTable {
        let mut total = RollupColumn::zeroed(TOTAL_COLUMN.to_string(), ColumnKind::Total, &self.students);
        for (student, value) in total.values.iter_mut() {
            *value = self
                .unit_columns
                .iter()
                .chain(std::iter::once(&self.unitless))
                .map(|c| c.values.get(student).copied().unwrap_or(0.0))
                .sum();
        }

        let mut columns = self.group_columns;
        columns.extend(self.unit_columns);
        columns.push(total);

        info!(
            "Rollup table: {} students x {} columns",
            self.students.len(),
            columns.len()
        );

        RollupTable {
            students: self.students,
            columns,
        }
    }
}

/// Build a rollup from per-group durations.
///
/// Entries are folded in ascending group-number order regardless of the
/// order given; equal numbers keep their relative order.
pub fn build_rollup(
    population: &BTreeSet<StudentId>,
    entries: &[(&Group, &DurationResult)],
) -> RollupTable {
    let mut ordered: Vec<&(&Group, &DurationResult)> = entries.iter().collect();
    ordered.sort_by_key(|(group, _)| group.number);

    let mut builder = RollupBuilder::new(population);
    for (group, durations) in ordered {
        builder.fold(group, durations);
    }
    builder.finish()
}
