//! CSV report writers.
//!
//! Three tables leave the engine as CSV: the per-element interaction report
//! of a group, the per-student duration report of a group, and the rollup.

use super::naming::{file_size, prepare_path};
use crate::aggregator::{DurationResult, InteractionResult, RollupTable};
use crate::utils::error::OutputError;
use log::info;
use std::io::Write;
use std::path::Path;

/// Element report header
pub const ELEMENT_REPORT_HEADER: [&str; 6] = [
    "object id",
    "Element Name",
    "List of users who interacted",
    "Number of users who interacted",
    "% of users who interacted",
    "Average duration hint (sec)",
];

/// Write the per-element report of one group
///
/// **Public** - one row per element, ascending element id
///
/// # Errors
/// * `OutputError::InvalidPath` - path is empty, a directory, or its parent cannot be created
/// * `OutputError::CsvFailed` - CSV encoding or write error
pub fn write_element_report(
    result: &InteractionResult,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    prepare_path(output_path)?;

    let writer = csv::Writer::from_path(output_path)?;
    element_report_to_writer(result, writer)?;

    info!(
        "Element report written: {} ({} bytes)",
        output_path.display(),
        file_size(output_path)
    );
    Ok(())
}

/// Encode the element report into any writer
pub fn element_report_to_writer<W: Write>(
    result: &InteractionResult,
    mut writer: csv::Writer<W>,
) -> Result<(), OutputError> {
    writer.write_record(ELEMENT_REPORT_HEADER)?;

    for row in result.rows() {
        let students: Vec<&str> = row.students.iter().map(String::as_str).collect();
        let hint = row
            .average_duration_hint
            .map(|h| format!("{:.2}", h))
            .unwrap_or_else(|| "N/A".to_string());

        writer.write_record([
            row.element_id.to_string(),
            row.label.unwrap_or_default().to_string(),
            students.join(";"),
            row.interaction_count().to_string(),
            format!("{:.2}", row.percentage),
            hint,
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the per-student minutes of one group
///
/// # Errors
/// * `OutputError::InvalidPath` - see `write_element_report`
/// * `OutputError::CsvFailed` - CSV encoding or write error
pub fn write_duration_report(
    durations: &DurationResult,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    prepare_path(output_path)?;

    let mut writer = csv::Writer::from_path(output_path)?;
    writer.write_record(["Student", "Minutes"])?;
    for (student, minutes) in &durations.minutes {
        writer.write_record([student.clone(), format_minutes(*minutes)])?;
    }
    writer.flush()?;

    info!(
        "Duration report written: {} ({} students)",
        output_path.display(),
        durations.minutes.len()
    );
    Ok(())
}

/// Write the rollup table: `Student`, then one column per rollup column
///
/// # Errors
/// * `OutputError::InvalidPath` - see `write_element_report`
/// * `OutputError::CsvFailed` - CSV encoding or write error
pub fn write_rollup(table: &RollupTable, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    prepare_path(output_path)?;

    let mut writer = csv::Writer::from_path(output_path)?;

    let mut header = vec!["Student"];
    header.extend(table.column_names());
    writer.write_record(&header)?;

    for student in &table.students {
        let mut record = vec![student.clone()];
        record.extend(table.columns.iter().map(|column| {
            format_minutes(column.values.get(student).copied().unwrap_or(0.0))
        }));
        writer.write_record(&record)?;
    }
    writer.flush()?;

    info!(
        "Rollup written: {} ({} students x {} columns)",
        output_path.display(),
        table.students.len(),
        table.columns.len()
    );
    Ok(())
}

fn format_minutes(minutes: f64) -> String {
    format!("{:.2}", minutes)
}
