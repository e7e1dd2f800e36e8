//! Label-prefix matching for the legacy pattern grouping mode.
//!
//! Chapter titles in the course book start with a day tag: "D3 Warm-up",
//! "Day03 Titration". The tag is a `D` or `Day` prefix followed by the day
//! number, optionally zero-padded. Matching is case-sensitive.

use crate::parser::event::{ElementId, EventTable};
use crate::utils::config::GROUP_LABEL_PREFIXES;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

/// Day number a label is tagged with, if any.
///
/// All leading digits after the prefix are consumed, so "D13" is day 13 and
/// never day 1 or day 3.
pub fn label_group_number(label: &str) -> Option<u32> {
    GROUP_LABEL_PREFIXES.iter().find_map(|prefix| {
        let rest = label.strip_prefix(prefix)?;
        let digits: &str = &rest[..rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len())];
        if digits.is_empty() {
            None
        } else {
            digits.parse().ok()
        }
    })
}

/// Whether `label` is tagged with day `number`
pub fn label_matches_group(label: &str, number: u32) -> bool {
    label_group_number(label) == Some(number)
}

/// Assign each element to the single day its labels point at.
///
/// Elements whose labels carry different day numbers are ambiguous and are
/// left out of every day.
pub fn assign_elements_by_label(table: &EventTable) -> BTreeMap<u32, BTreeSet<ElementId>> {
    let mut tags: BTreeMap<ElementId, BTreeSet<u32>> = BTreeMap::new();

    for event in table.events() {
        if let Some(number) = event.non_empty_label().and_then(label_group_number) {
            tags.entry(event.element_id).or_default().insert(number);
        }
    }

    let mut days: BTreeMap<u32, BTreeSet<ElementId>> = BTreeMap::new();
    for (element, numbers) in tags {
        if numbers.len() > 1 {
            warn!(
                "Element {} has labels tagged with days {:?}; excluding it from every day",
                element, numbers
            );
            continue;
        }
        if let Some(&number) = numbers.iter().next() {
            days.entry(number).or_default().insert(element);
        }
    }

    debug!("Label tags found for {} days", days.len());
    days
}
