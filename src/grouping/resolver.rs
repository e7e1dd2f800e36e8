//! Resolve the groups a run will process.
//!
//! The three grouping modes are variants of one `GroupingStrategy`, chosen
//! once per run. Resolution is a read-only derivation over the event table.

use super::pattern::assign_elements_by_label;
use crate::parser::event::{ElementId, EventTable};
use crate::parser::grouping_config::GroupingConfig;
use crate::utils::config::GROUP_COLUMN_PREFIX;
use crate::utils::error::EngineError;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// A day (chapter) or an explicit element selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub number: u32,
    pub name: String,
    pub unit: Option<u32>,

    /// Sorted, distinct element ids
    pub element_ids: Vec<ElementId>,
}

impl Group {
    /// A numbered day, named "Day N"
    pub fn day(number: u32, unit: Option<u32>, element_ids: impl IntoIterator<Item = ElementId>) -> Self {
        Self {
            number,
            name: format!("{} {}", GROUP_COLUMN_PREFIX, number),
            unit,
            element_ids: sorted_distinct(element_ids),
        }
    }

    /// The single group of an explicit id-list run
    pub fn selection(element_ids: impl IntoIterator<Item = ElementId>) -> Self {
        Self {
            number: 0,
            name: "Selection".to_string(),
            unit: None,
            element_ids: sorted_distinct(element_ids),
        }
    }
}

fn sorted_distinct(ids: impl IntoIterator<Item = ElementId>) -> Vec<ElementId> {
    ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Which days a run should cover.
///
/// Ranges are kept as bounds; a selector never enumerates the numbers it
/// covers, so `1-4294967295` costs the same as `1-2`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DaySelector {
    #[default]
    All,

    /// Inclusive ranges, sorted by start; a single day is `n..=n`
    Ranges(Vec<RangeInclusive<u32>>),
}

impl DaySelector {
    pub fn includes(&self, number: u32) -> bool {
        match self {
            DaySelector::All => true,
            DaySelector::Ranges(ranges) => ranges.iter().any(|r| r.contains(&number)),
        }
    }

    /// Day numbers requested one by one (`5` in `1-3,5`)
    pub fn single_days(&self) -> Vec<u32> {
        match self {
            DaySelector::All => Vec::new(),
            DaySelector::Ranges(ranges) => ranges
                .iter()
                .filter(|r| r.start() == r.end())
                .map(|r| *r.start())
                .collect(),
        }
    }
}

impl FromStr for DaySelector {
    type Err = String;

    /// Accepts `all`, a comma-separated list, inclusive ranges, or a mix:
    /// `all`, `1,2,5`, `3-7`, `1,4-6`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(DaySelector::All);
        }

        let mut ranges = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let parse = |v: &str| {
                v.trim()
                    .parse::<u32>()
                    .map_err(|_| format!("'{}' is not a valid day number", v.trim()))
            };

            match part.split_once('-') {
                Some((lower, upper)) => {
                    let (lower, upper) = (parse(lower)?, parse(upper)?);
                    if lower > upper {
                        return Err(format!("day range {}-{} is reversed", lower, upper));
                    }
                    ranges.push(lower..=upper);
                }
                None => {
                    let day = parse(part)?;
                    ranges.push(day..=day);
                }
            }
        }

        if ranges.is_empty() {
            return Err("day selector is empty".to_string());
        }

        ranges.sort_by_key(|r| (*r.start(), *r.end()));
        ranges.dedup();
        Ok(DaySelector::Ranges(ranges))
    }
}

impl fmt::Display for DaySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaySelector::All => f.write_str("all"),
            DaySelector::Ranges(ranges) => {
                let parts: Vec<String> = ranges
                    .iter()
                    .map(|r| {
                        if r.start() == r.end() {
                            r.start().to_string()
                        } else {
                            format!("{}-{}", r.start(), r.end())
                        }
                    })
                    .collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

/// How groups are derived for a run
#[derive(Debug, Clone)]
pub enum GroupingStrategy {
    /// Exactly these elements, as one group
    ExplicitIds(Vec<ElementId>),

    /// Days and units from a grouping configuration
    Configured {
        config: GroupingConfig,
        selector: DaySelector,
    },

    /// Days discovered from "D<n>"/"Day<n>" label prefixes
    LabelPattern { selector: DaySelector },
}

/// Whether per-group data errors abort the run or only skip the group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    SingleGroup,
    MultiGroup,
}

/// Output of the resolver
#[derive(Debug, Clone)]
pub struct Resolution {
    pub groups: Vec<Group>,

    /// Requested day numbers with no counterpart, reported back to the caller
    pub ignored: Vec<u32>,

    pub mode: RunMode,
}

impl GroupingStrategy {
    pub fn run_mode(&self) -> RunMode {
        match self {
            GroupingStrategy::ExplicitIds(_) => RunMode::SingleGroup,
            _ => RunMode::MultiGroup,
        }
    }

    /// Short description for logs
    pub fn describe(&self) -> String {
        match self {
            GroupingStrategy::ExplicitIds(ids) => format!("explicit list of {} elements", ids.len()),
            GroupingStrategy::Configured { config, selector } => {
                format!("configuration with {} days (selected: {})", config.days.len(), selector)
            }
            GroupingStrategy::LabelPattern { selector } => {
                format!("label pattern (selected: {})", selector)
            }
        }
    }

    /// Resolve the ordered list of groups against the event table
    pub fn resolve(&self, table: &EventTable) -> Result<Resolution, EngineError> {
        info!("Resolving groups from {}", self.describe());

        let (groups, ignored) = match self {
            GroupingStrategy::ExplicitIds(ids) => (vec![resolve_explicit(ids, table)?], Vec::new()),
            GroupingStrategy::Configured { config, selector } => resolve_configured(config, selector)?,
            GroupingStrategy::LabelPattern { selector } => (resolve_pattern(selector, table), Vec::new()),
        };

        if !ignored.is_empty() {
            warn!("Ignoring unknown day numbers: {:?}", ignored);
        }
        debug!(
            "Resolved {} groups: {:?}",
            groups.len(),
            groups.iter().map(|g| g.name.as_str()).collect::<Vec<_>>()
        );

        Ok(Resolution {
            groups,
            ignored,
            mode: self.run_mode(),
        })
    }
}

/// **Private** - explicit id list; every id must have rows
fn resolve_explicit(ids: &[ElementId], table: &EventTable) -> Result<Group, EngineError> {
    if ids.is_empty() {
        return Err(EngineError::Configuration(
            "explicit element list is empty".to_string(),
        ));
    }

    let group = Group::selection(ids.iter().copied());
    if let Some(&missing) = group
        .element_ids
        .iter()
        .find(|&&id| !table.contains_element(id))
    {
        return Err(EngineError::UnknownElement(missing));
    }

    Ok(group)
}

/// **Private** - days from configuration, filtered by selector
fn resolve_configured(
    config: &GroupingConfig,
    selector: &DaySelector,
) -> Result<(Vec<Group>, Vec<u32>), EngineError> {
    config.validate()?;

    let days = config.days_in_order();
    let groups: Vec<Group> = days
        .iter()
        .filter(|d| selector.includes(d.day_number))
        .map(|d| Group::day(d.day_number, Some(d.unit), d.elements.iter().copied()))
        .collect();

    let ignored = selector
        .single_days()
        .into_iter()
        .filter(|n| !days.iter().any(|d| d.day_number == *n))
        .collect();

    Ok((groups, ignored))
}

/// **Private** - days from label tags. Days requested one by one without
/// any tagged element still produce an (empty) group so the run records
/// the skip; ranges only pick up days that exist.
fn resolve_pattern(selector: &DaySelector, table: &EventTable) -> Vec<Group> {
    let mut assigned = assign_elements_by_label(table);

    let mut numbers: BTreeSet<u32> = assigned
        .keys()
        .copied()
        .filter(|n| selector.includes(*n))
        .collect();
    numbers.extend(selector.single_days());

    numbers
        .into_iter()
        .map(|n| Group::day(n, None, assigned.remove(&n).unwrap_or_default()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::event::{Event, Verb};
    use crate::parser::grouping_config::parse_grouping_config;
    use chrono::{TimeZone, Utc};

    fn table() -> EventTable {
        let ts = Utc.with_ymd_and_hms(2021, 3, 1, 9, 0, 0).unwrap();
        EventTable::new(vec![
            Event::new("a", 10, Verb::Interacted, ts).with_label("D1 Intro"),
            Event::new("a", 11, Verb::Interacted, ts).with_label("Day01 Quiz"),
            Event::new("b", 20, Verb::Completed, ts).with_label("D2 Lab"),
            Event::new("b", 30, Verb::Completed, ts).with_label("D13 Review"),
        ])
    }

    fn config() -> GroupingConfig {
        parse_grouping_config(
            r#"{"Days": {
                "Day2": {"DayNumber": 2, "Unit": 1, "Elements": [20]},
                "Day1": {"DayNumber": 1, "Unit": 1, "Elements": [11, 10, 11]}
            }}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("all".parse::<DaySelector>(), Ok(DaySelector::All));
        assert_eq!("ALL".parse::<DaySelector>(), Ok(DaySelector::All));
        assert_eq!(
            "5, 1,3-4,5".parse::<DaySelector>(),
            Ok(DaySelector::Ranges(vec![1..=1, 3..=4, 5..=5]))
        );
        assert!("4-2".parse::<DaySelector>().is_err());
        assert!("x".parse::<DaySelector>().is_err());
        assert!("".parse::<DaySelector>().is_err());
    }

    #[test]
    fn test_explicit_ids_sorted_and_deduplicated() {
        let strategy = GroupingStrategy::ExplicitIds(vec![20, 10, 20]);
        let resolution = strategy.resolve(&table()).unwrap();

        assert_eq!(resolution.mode, RunMode::SingleGroup);
        assert_eq!(resolution.groups.len(), 1);
        assert_eq!(resolution.groups[0].element_ids, vec![10, 20]);
    }

    #[test]
    fn test_explicit_unknown_element() {
        let strategy = GroupingStrategy::ExplicitIds(vec![10, 99]);
        assert_eq!(
            strategy.resolve(&table()).unwrap_err(),
            EngineError::UnknownElement(99)
        );
    }

    #[test]
    fn test_configured_groups_in_day_order() {
        let strategy = GroupingStrategy::Configured {
            config: config(),
            selector: DaySelector::All,
        };
        let resolution = strategy.resolve(&table()).unwrap();

        let names: Vec<&str> = resolution.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Day 1", "Day 2"]);
        assert_eq!(resolution.groups[0].element_ids, vec![10, 11]);
        assert_eq!(resolution.groups[0].unit, Some(1));
        assert!(resolution.ignored.is_empty());
    }

    #[test]
    fn test_configured_unknown_days_are_ignored() {
        let strategy = GroupingStrategy::Configured {
            config: config(),
            selector: "2,7".parse().unwrap(),
        };
        let resolution = strategy.resolve(&table()).unwrap();

        assert_eq!(resolution.groups.len(), 1);
        assert_eq!(resolution.groups[0].number, 2);
        assert_eq!(resolution.ignored, vec![7]);
    }

    #[test]
    fn test_pattern_discovers_days() {
        let strategy = GroupingStrategy::LabelPattern {
            selector: DaySelector::All,
        };
        let resolution = strategy.resolve(&table()).unwrap();

        let numbers: Vec<u32> = resolution.groups.iter().map(|g| g.number).collect();
        assert_eq!(numbers, vec![1, 2, 13]);
        assert_eq!(resolution.groups[0].element_ids, vec![10, 11]);
        assert!(resolution.groups.iter().all(|g| g.unit.is_none()));
    }

    #[test]
    fn test_pattern_selected_day_without_tags_is_empty() {
        let strategy = GroupingStrategy::LabelPattern {
            selector: "3".parse().unwrap(),
        };
        let resolution = strategy.resolve(&table()).unwrap();

        assert_eq!(resolution.groups.len(), 1);
        assert!(resolution.groups[0].element_ids.is_empty());
    }

    #[test]
    fn test_full_width_range_is_not_expanded() {
        let selector: DaySelector = "1-4294967295".parse().unwrap();

        assert!(selector.includes(7));
        assert!(selector.includes(u32::MAX));
        assert!(!selector.includes(0));
        assert!(selector.single_days().is_empty());
        assert_eq!(selector.to_string(), "1-4294967295");
    }

    #[test]
    fn test_range_selects_known_days_only() {
        let strategy = GroupingStrategy::LabelPattern {
            selector: "2-100000000".parse().unwrap(),
        };
        let resolution = strategy.resolve(&table()).unwrap();

        let numbers: Vec<u32> = resolution.groups.iter().map(|g| g.number).collect();
        assert_eq!(numbers, vec![2, 13]);

        let strategy = GroupingStrategy::Configured {
            config: config(),
            selector: "0-4294967295".parse().unwrap(),
        };
        let resolution = strategy.resolve(&table()).unwrap();
        assert_eq!(resolution.groups.len(), 2);
        assert!(resolution.ignored.is_empty());
    }
}
