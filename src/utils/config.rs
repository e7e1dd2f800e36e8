//! Configuration and constants for the analyzer.

/// Current run-summary schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Gap threshold used when neither the CLI nor the grouping config sets one.
/// Consecutive events further apart than this count as a session break.
pub const DEFAULT_GAP_MINUTES: f64 = 10.0;

// Verbs that count as a student interacting with an element.
// "consumed" is deliberately absent.
pub const POSITIVE_VERBS: &[&str] = &[
    "interacted",
    "attempted",
    "progressed",
    "completed",
    "experienced",
];

// Header names for CSV parsing (Learning Locker exports have used several)
pub const STUDENT_COLUMN_NAMES: &[&str] = &["Name", "Email", "Actor"];
pub const VERB_COLUMN_NAMES: &[&str] = &["Verb"];
pub const ELEMENT_COLUMN_NAMES: &[&str] = &["object id", "H5P ID", "Object"];
pub const LABEL_COLUMN_NAMES: &[&str] = &["Question/Slide", "Label"];
pub const TIMESTAMP_COLUMN_NAMES: &[&str] = &["Timestamp"];
pub const DURATION_COLUMN_NAMES: &[&str] = &["Duration"];

/// Prefix stripped from actor identities ("mailto:jane@wisc.edu")
pub const MAILTO_PREFIX: &str = "mailto:";

// Label prefixes recognised by the pattern grouping mode, longest first
pub const GROUP_LABEL_PREFIXES: &[&str] = &["Day", "D"];

// Rollup column naming
pub const GROUP_COLUMN_PREFIX: &str = "Day";
pub const UNIT_COLUMN_PREFIX: &str = "Unit";
pub const TOTAL_COLUMN: &str = "Total";
