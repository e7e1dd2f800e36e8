//! Loader for cleaned Learning Locker CSV exports.
//!
//! Turns raw rows into `Event`s, dropping rows whose identity, element or
//! timestamp cannot be recovered. Nothing downstream ever sees a bad row.

use super::event::{ElementId, Event, EventTable, Verb};
use crate::utils::config::{
    DURATION_COLUMN_NAMES, ELEMENT_COLUMN_NAMES, LABEL_COLUMN_NAMES, MAILTO_PREFIX,
    STUDENT_COLUMN_NAMES, TIMESTAMP_COLUMN_NAMES, VERB_COLUMN_NAMES,
};
use crate::utils::error::ParseError;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::io::Read;
use std::path::Path;

/// Naive timestamp layouts accepted after RFC 3339 fails. Interpreted as UTC.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Counts of rows rejected during loading, by reason
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DropStats {
    pub bad_timestamp: usize,
    pub missing_student: usize,
    pub bad_element_id: usize,
    pub consumed: usize,
}

impl DropStats {
    /// Rows dropped because they were malformed (excludes `consumed`)
    pub fn malformed(&self) -> usize {
        self.bad_timestamp + self.missing_student + self.bad_element_id
    }

    pub fn total(&self) -> usize {
        self.malformed() + self.consumed
    }
}

/// Result of loading an event table
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: EventTable,
    pub rows_read: usize,
    pub dropped: DropStats,
}

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    student: usize,
    verb: usize,
    element: usize,
    timestamp: usize,
    label: Option<usize>,
    duration: Option<usize>,
}

/// Load an event table from a CSV file on disk
pub fn load_events(path: impl AsRef<Path>) -> Result<LoadedTable, ParseError> {
    let path = path.as_ref();
    info!("Loading xAPI events from: {}", path.display());

    let file = std::fs::File::open(path)?;
    read_events(file)
}

/// Load an event table from any CSV reader
pub fn read_events<R: Read>(reader: R) -> Result<LoadedTable, ParseError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = decode_fields(csv_reader.byte_headers()?);
    let columns = resolve_columns(&headers)?;
    debug!("Resolved CSV columns: {:?}", columns);

    let mut events = Vec::new();
    let mut dropped = DropStats::default();
    let mut rows_read = 0usize;

    // Byte records: an undecodable byte in one field must not fail the load
    for record in csv_reader.byte_records() {
        let record = decode_fields(&record?);
        rows_read += 1;

        let field = |idx: usize| record.get(idx).map(|f| f.trim()).unwrap_or("");

        let Some(timestamp) = parse_timestamp(field(columns.timestamp)) else {
            dropped.bad_timestamp += 1;
            continue;
        };

        let Some(student_id) = normalize_student_id(field(columns.student)) else {
            dropped.missing_student += 1;
            continue;
        };

        let Some(element_id) = parse_element_id(field(columns.element)) else {
            dropped.bad_element_id += 1;
            continue;
        };

        let verb = Verb::parse(field(columns.verb));
        if verb == Verb::Consumed {
            dropped.consumed += 1;
            continue;
        }

        let label = columns
            .label
            .map(field)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        let duration_hint = columns.duration.and_then(|idx| parse_duration_hint(field(idx)));

        events.push(Event {
            student_id,
            element_id,
            verb,
            timestamp,
            label,
            duration_hint,
        });
    }

    if dropped.malformed() > 0 {
        warn!(
            "Some data was dropped because of improper formatting: bad timestamp: {}, \
             no student identity: {}, bad object id: {}",
            dropped.bad_timestamp, dropped.missing_student, dropped.bad_element_id
        );
    }
    debug!("Dropped {} consumed statements", dropped.consumed);
    info!("Loaded {} events from {} rows", events.len(), rows_read);

    Ok(LoadedTable {
        table: EventTable::new(events),
        rows_read,
        dropped,
    })
}

/// Decode every field, replacing invalid UTF-8 with U+FFFD
fn decode_fields(record: &csv::ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|f| String::from_utf8_lossy(f).into_owned())
        .collect()
}

/// Map header names to column positions
///
/// **Private** - internal helper for read_events
fn resolve_columns(headers: &[String]) -> Result<ColumnMap, ParseError> {
    let find = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
    };
    let require = |names: &[&str]| {
        find(names).ok_or_else(|| ParseError::MissingColumn(names.join(", ")))
    };

    Ok(ColumnMap {
        student: require(STUDENT_COLUMN_NAMES)?,
        verb: require(VERB_COLUMN_NAMES)?,
        element: require(ELEMENT_COLUMN_NAMES)?,
        timestamp: require(TIMESTAMP_COLUMN_NAMES)?,
        label: find(LABEL_COLUMN_NAMES),
        duration: find(DURATION_COLUMN_NAMES),
    })
}

/// Normalize an actor identity: strip `mailto:`, trim, lowercase.
///
/// Returns None for blank identities.
pub fn normalize_student_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let without_scheme = match trimmed.get(..MAILTO_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(MAILTO_PREFIX) => {
            &trimmed[MAILTO_PREFIX.len()..]
        }
        _ => trimmed,
    };

    let normalized = without_scheme.trim().to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Extract the integer element id from a bare number or an object URL.
///
/// `https://pressbooks.example.edu/wp-admin/admin-ajax.php?action=h5p_embed&id=42`
/// yields 42.
pub fn parse_element_id(raw: &str) -> Option<ElementId> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<ElementId>() {
        return Some(id);
    }

    let start = find_id_param(raw)? + "id=".len();
    let rest = &raw[start..];
    let end = rest
        .find(|c: char| matches!(c, '?' | '&' | '#'))
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

/// Byte offset of an `id=` query parameter (not e.g. `uuid=`)
fn find_id_param(raw: &str) -> Option<usize> {
    raw.match_indices("id=")
        .map(|(idx, _)| idx)
        .find(|&idx| idx == 0 || matches!(raw.as_bytes()[idx - 1], b'?' | b'&'))
}

/// Parse a timestamp in any of the layouts Learning Locker exports have used
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Parse a duration hint in seconds: plain number or ISO-8601 `PT#H#M#S`
pub fn parse_duration_hint(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(seconds) = raw.parse::<f64>() {
        return seconds.is_finite().then_some(seconds).filter(|s| *s >= 0.0);
    }

    let body = raw.strip_prefix("PT").or_else(|| raw.strip_prefix("pt"))?;
    let mut seconds = 0.0;
    let mut number = String::new();
    for c in body.chars() {
        match c.to_ascii_uppercase() {
            '0'..='9' | '.' => number.push(c),
            unit @ ('H' | 'M' | 'S') => {
                let value: f64 = number.parse().ok()?;
                number.clear();
                seconds += match unit {
                    'H' => value * 3600.0,
                    'M' => value * 60.0,
                    _ => value,
                };
            }
            _ => return None,
        }
    }

    number.is_empty().then_some(seconds)
}
