use crate::parser::load_grouping_config;
use crate::utils::config::{DEFAULT_GAP_MINUTES, SCHEMA_VERSION};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Validate a grouping configuration file and print its layout
pub fn validate_config_file(file_path: PathBuf) -> Result<()> {
    println!("Validating grouping configuration: {}", file_path.display());

    let config = load_grouping_config(&file_path).context("Configuration is invalid")?;

    println!("✓ Valid grouping configuration");
    println!("  Days: {}", config.days.len());
    println!("  Units: {:?}", config.units());
    match config.time_delta {
        Some(minutes) => println!("  Time_Delta: {} min", minutes),
        None => println!("  Time_Delta: default ({} min)", DEFAULT_GAP_MINUTES),
    }
    println!("  Filtered students: {}", config.filter_emails.len());
    println!("  Shared elements allowed: {}", config.allow_shared_elements);

    for day in config.days_in_order() {
        println!(
            "    Day {:<3} unit {:<3} {} elements",
            day.day_number,
            day.unit,
            day.elements.len()
        );
    }

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("xAPI Engagement Grouping Schema");
    println!("Run Summary Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Grouping configuration (JSON):");
        println!("  Time_Delta: number?           - Gap threshold in minutes (default {})", DEFAULT_GAP_MINUTES);
        println!("  Filter_Emails: array?         - Student ids excluded from the run");
        println!("  Allow_Shared_Elements: bool?  - Permit one element under several days");
        println!("  Days: object                  - Day entries keyed by name");
        println!("    DayNumber: number           - Unique day number");
        println!("    Unit: number                - Unit the day rolls up into");
        println!("    Elements: array             - Element ids of the day");
        println!();
        println!("Run summary (JSON):");
        println!("  version: string               - Schema version");
        println!("  generated_at: string          - RFC 3339 timestamp");
        println!("  mode: string                  - single_group | multi_group");
        println!("  gap_minutes: number           - Gap threshold used");
        println!("  population_size: number       - Students in the run");
        println!("  groups: array                 - Per-group statistics");
        println!("  skipped: array                - Groups without a report");
        println!("  ignored_days: array           - Unknown requested day numbers");
        println!("  rollup_columns: array         - Rollup column names");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("xAPI Analyzer v{}", env!("CARGO_PKG_VERSION"));
    println!("Run Summary Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Per-element interaction and per-student active-time statistics from xAPI exports.");
}
