use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;
use xapi_engagement::parser::{load_events, load_grouping_config, read_events, DropStats, Verb};
use xapi_engagement::utils::{EngineError, ParseError};

const EXPORT: &str = "\
Name,Verb,object id,Question/Slide,Timestamp,Duration
mailto:Alice@Wisc.edu,http://adlnet.gov/expapi/verbs/interacted,https://book.example.edu/wp-admin/admin-ajax.php?action=h5p_embed&id=42,D1 Warm-up,2021-03-01T09:00:00Z,PT1M30S
bob@wisc.edu,completed,42,,2021-03-01 09:02:00,45
bob@wisc.edu,consumed,42,D1 Warm-up,2021-03-01 09:03:00,
carol@wisc.edu,interacted,43,D1 Video,not a time,
,interacted,43,D1 Video,2021-03-01 09:05:00,
carol@wisc.edu,interacted,uuid=7,D1 Video,2021-03-01 09:06:00,
carol@wisc.edu,attempted,43,D1 Video,03/01/2021 09:07,
";

fn export_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_export() {
    let file = export_file(EXPORT);
    let loaded = load_events(file.path()).unwrap();

    assert_eq!(loaded.rows_read, 7);
    assert_eq!(loaded.table.len(), 3);
    assert_eq!(
        loaded.dropped,
        DropStats {
            bad_timestamp: 1,
            missing_student: 1,
            bad_element_id: 1,
            consumed: 1,
        }
    );

    let first = &loaded.table.events()[0];
    assert_eq!(first.student_id, "alice@wisc.edu");
    assert_eq!(first.element_id, 42);
    assert_eq!(first.verb, Verb::Interacted);
    assert_eq!(first.label.as_deref(), Some("D1 Warm-up"));
    assert_eq!(first.duration_hint, Some(90.0));

    let second = &loaded.table.events()[1];
    assert_eq!(second.label, None);
    assert_eq!(second.duration_hint, Some(45.0));

    let students: Vec<String> = loaded.table.distinct_students().into_iter().collect();
    assert_eq!(students, vec!["alice@wisc.edu", "bob@wisc.edu", "carol@wisc.edu"]);
}

#[test]
fn test_header_aliases() {
    let csv = "Actor,Verb,H5P ID,Timestamp\nmailto:dan@wisc.edu,progressed,9,2021-03-01 10:00:00\n";
    let loaded = read_events(csv.as_bytes()).unwrap();

    assert_eq!(loaded.table.len(), 1);
    assert_eq!(loaded.table.events()[0].student_id, "dan@wisc.edu");
    assert_eq!(loaded.table.events()[0].label, None);
}

#[test]
fn test_missing_required_column() {
    let csv = "Name,Verb,Timestamp\nalice,interacted,2021-03-01 10:00:00\n";
    let result = read_events(csv.as_bytes());

    assert!(matches!(result, Err(ParseError::MissingColumn(_))));
}

#[test]
fn test_load_missing_file() {
    let result = load_events("/nonexistent/export.csv");
    assert!(matches!(result, Err(ParseError::IoError(_))));
}

#[test]
fn test_load_grouping_config_file() {
    let file = export_file(
        r#"{
            "Filter_Emails": ["mailto:TA@wisc.edu"],
            "Days": {
                "Day2": {"DayNumber": 2, "Unit": 1, "Elements": [3]},
                "Day1": {"DayNumber": 1, "Unit": 1, "Elements": [1, 2]}
            }
        }"#,
    );

    let config = load_grouping_config(file.path()).unwrap();

    assert_eq!(config.time_delta, None);
    assert_eq!(config.filter_students(), vec!["ta@wisc.edu".to_string()]);
    let numbers: Vec<u32> = config.days_in_order().iter().map(|d| d.day_number).collect();
    assert_eq!(numbers, vec![1, 2]);
}

#[test]
fn test_grouping_config_rejects_shared_elements() {
    let file = export_file(
        r#"{"Days": {
            "Day1": {"DayNumber": 1, "Unit": 1, "Elements": [1, 2]},
            "Day2": {"DayNumber": 2, "Unit": 1, "Elements": [2]}
        }}"#,
    );

    let result = load_grouping_config(file.path());
    assert!(matches!(result, Err(EngineError::Configuration(_))));
}

#[test]
fn test_grouping_config_missing_field() {
    let file = export_file(r#"{"Days": {"Day1": {"DayNumber": 1, "Elements": [1]}}}"#);

    let result = load_grouping_config(file.path());
    assert!(matches!(result, Err(EngineError::Configuration(_))));
}
