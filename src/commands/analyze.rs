//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Loads the event table
//! 2. Builds the grouping strategy and analysis context
//! 3. Resolves the gap threshold
//! 4. Runs the engine over every group
//! 5. Writes output files

use super::models::{AnalyzeArgs, GroupingSource};
use crate::aggregator::{calculate_duration_distribution, GapThreshold};
use crate::engine::{run_analysis, AnalysisRun};
use crate::grouping::{GroupingStrategy, RunMode};
use crate::output::{
    write_duration_report, write_element_report, write_rollup, write_summary, OutputNaming,
    RunSummary,
};
use crate::parser::event::{AnalysisContext, StudentId};
use crate::parser::{load_events, load_grouping_config};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Analyze command arguments
///
/// # Returns
/// Paths of every file written, in write order
///
/// # Errors
/// * Unreadable or malformed CSV export
/// * Invalid grouping configuration or gap threshold
/// * Engine errors (empty population, unknown element)
/// * File write errors
///
/// # Example
/// ```ignore
/// let args = AnalyzeArgs {
///     data_path: PathBuf::from("cleaned.csv"),
///     source: GroupingSource::Config(PathBuf::from("DayElement.json")),
///     ..Default::default()
/// };
///
/// let written = execute_analyze(args)?;
/// ```
pub fn execute_analyze(args: AnalyzeArgs) -> Result<Vec<PathBuf>> {
    let start_time = Instant::now();

    info!("Starting analysis of: {}", args.data_path.display());

    // Step 1: Load events
    info!("Step 1/5: Loading event table...");
    let loaded = load_events(&args.data_path)
        .with_context(|| format!("Failed to load events from {}", args.data_path.display()))?;

    if loaded.dropped.malformed() > 0 {
        warn!(
            "Dropped {} malformed rows ({} bad timestamps, {} missing students, {} bad element ids)",
            loaded.dropped.malformed(),
            loaded.dropped.bad_timestamp,
            loaded.dropped.missing_student,
            loaded.dropped.bad_element_id
        );
    }
    debug!(
        "Loaded {} events from {} rows ({} consumed rows dropped)",
        loaded.table.len(),
        loaded.rows_read,
        loaded.dropped.consumed
    );

    // Step 2: Grouping strategy and context
    info!("Step 2/5: Preparing grouping...");
    let (strategy, time_delta, filter) = build_strategy(&args)?;
    let ctx = AnalysisContext::new(loaded.table, &filter);
    info!(
        "Population: {} students, {} events",
        ctx.population_size(),
        ctx.table().len()
    );

    // Step 3: Gap threshold (CLI flag, then Time_Delta, then default)
    info!("Step 3/5: Resolving gap threshold...");
    let gap = match args.gap_minutes.or(time_delta) {
        Some(minutes) => {
            GapThreshold::from_minutes(minutes).context("Invalid gap threshold")?
        }
        None => GapThreshold::default(),
    };
    info!("Gap threshold: {} minutes", gap.minutes());

    // Step 4: Run engine
    info!("Step 4/5: Aggregating {}...", strategy.describe());
    let run = run_analysis(&ctx, &strategy, gap).context("Analysis failed")?;

    for report in &run.reports {
        let distribution = calculate_duration_distribution(&report.durations);
        info!("{}: {}", report.group.name, distribution.summary());
    }

    // Step 5: Write outputs
    info!("Step 5/5: Writing output files...");
    let written = write_outputs(&run, &args)?;

    if args.print_summary {
        print_summary(&run);
    }

    let elapsed = start_time.elapsed();
    info!(
        "Analysis completed in {:.2}s ({} files written)",
        elapsed.as_secs_f64(),
        written.len()
    );

    Ok(written)
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if !args.data_path.is_file() {
        anyhow::bail!("Data file not found: {}", args.data_path.display());
    }

    match &args.source {
        GroupingSource::Ids(ids) if ids.is_empty() => {
            anyhow::bail!("At least one element id is required");
        }
        GroupingSource::Config(path) if !path.is_file() => {
            anyhow::bail!("Grouping configuration not found: {}", path.display());
        }
        _ => {}
    }

    if let Some(minutes) = args.gap_minutes {
        if !minutes.is_finite() || minutes <= 0.0 {
            anyhow::bail!("Gap threshold must be a positive number of minutes");
        }
    }

    if args.output_dir.is_file() {
        anyhow::bail!(
            "Output directory is a file: {}",
            args.output_dir.display()
        );
    }

    Ok(())
}

/// Strategy, configured Time_Delta and student filter for a run
///
/// **Private** - internal helper for execute_analyze
fn build_strategy(
    args: &AnalyzeArgs,
) -> Result<(GroupingStrategy, Option<f64>, Vec<StudentId>)> {
    Ok(match &args.source {
        GroupingSource::Ids(ids) => (GroupingStrategy::ExplicitIds(ids.clone()), None, Vec::new()),
        GroupingSource::Config(path) => {
            let config = load_grouping_config(path).context("Failed to load grouping configuration")?;
            let time_delta = config.time_delta;
            let filter = config.filter_students();
            let strategy = GroupingStrategy::Configured {
                config,
                selector: args.days.clone(),
            };
            (strategy, time_delta, filter)
        }
        GroupingSource::Pattern => (
            GroupingStrategy::LabelPattern {
                selector: args.days.clone(),
            },
            None,
            Vec::new(),
        ),
    })
}

/// Write the CSV reports and optional JSON summary
///
/// **Private** - internal helper for execute_analyze
fn write_outputs(run: &AnalysisRun, args: &AnalyzeArgs) -> Result<Vec<PathBuf>> {
    let naming = OutputNaming::new(&args.output_dir);
    let mut written = Vec::new();

    match run.mode {
        RunMode::SingleGroup => {
            for report in &run.reports {
                let path = naming.selection_report();
                write_element_report(&report.interactions, &path)
                    .context("Failed to write element report")?;
                written.push(path);

                let path = naming.run_durations();
                write_duration_report(&report.durations, &path)
                    .context("Failed to write duration report")?;
                written.push(path);
            }
        }
        RunMode::MultiGroup => {
            for report in &run.reports {
                let path = naming.group_report(&report.group);
                write_element_report(&report.interactions, &path)
                    .with_context(|| format!("Failed to write report for {}", report.group.name))?;
                written.push(path);

                let path = naming.group_durations(&report.group);
                write_duration_report(&report.durations, &path)
                    .with_context(|| format!("Failed to write durations for {}", report.group.name))?;
                written.push(path);
            }

            if run.rollup.has_group_columns() {
                let path = naming.run_durations();
                write_rollup(&run.rollup, &path).context("Failed to write rollup")?;
                written.push(path);
            } else {
                warn!("No group produced events; rollup not written");
            }
        }
    }

    if let Some(json_path) = &args.json_summary {
        let summary = RunSummary::from_run(run);
        write_summary(&summary, json_path).context("Failed to write run summary")?;
        written.push(json_path.clone());
    }

    for path in &written {
        info!("✓ Written: {}", path.display());
    }

    Ok(written)
}

/// Print the text summary to stdout
///
/// **Private** - internal helper for execute_analyze
fn print_summary(run: &AnalysisRun) {
    println!("\n{}", "=".repeat(80));
    println!("ENGAGEMENT SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Students:      {}", run.population_size);
    println!("Gap threshold: {} min", run.gap.minutes());
    println!("Groups:        {}", run.reports.len());
    println!();

    for report in &run.reports {
        let distribution = calculate_duration_distribution(&report.durations);
        println!(
            "{:<10} {:>4} elements | interaction {:>6.1}% | {}",
            report.group.name,
            report.interactions.element_count(),
            report.interactions.mean_percentage(),
            distribution.summary()
        );
    }

    for notice in &run.skipped {
        println!("{:<10} skipped ({})", notice.group.name, notice.reason);
    }
    if !run.ignored.is_empty() {
        println!("Ignored day numbers: {:?}", run.ignored);
    }
    println!("{}", "=".repeat(80));
}
