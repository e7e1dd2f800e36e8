//! Run orchestration for the aggregation engine.
//!
//! A run resolves its groups once, processes each group against the shared
//! read-only context, and folds the duration results into one rollup table.
//! No file I/O happens here; exporters receive the in-memory results.

use crate::aggregator::{
    aggregate_interactions, estimate_durations, DurationResult, GapThreshold, InteractionResult,
    RollupBuilder, RollupTable,
};
use crate::grouping::{Group, GroupingStrategy, RunMode};
use crate::parser::event::AnalysisContext;
use crate::utils::error::EngineError;
use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;

/// Results for one processed group
#[derive(Debug, Clone)]
pub struct GroupReport {
    pub group: Group,
    pub interactions: InteractionResult,
    pub durations: DurationResult,
}

/// Why a group produced no report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// No rows after filtering
    NoEvents,
    /// Duration estimation hit a negative delta
    InvalidTimestampOrder(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoEvents => f.write_str("no events"),
            SkipReason::InvalidTimestampOrder(detail) => f.write_str(detail),
        }
    }
}

/// A group that was skipped, with the reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupNotice {
    pub group: Group,
    pub reason: SkipReason,
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub mode: RunMode,
    pub gap: GapThreshold,
    pub population_size: usize,
    pub reports: Vec<GroupReport>,
    pub skipped: Vec<GroupNotice>,

    /// Requested day numbers the grouping did not know
    pub ignored: Vec<u32>,

    pub rollup: RollupTable,
}

/// Process one group.
///
/// Returns `Ok(None)` when the group has no events.
pub fn process_group(
    ctx: &AnalysisContext,
    group: &Group,
    gap: GapThreshold,
) -> Result<Option<GroupReport>, EngineError> {
    let events = ctx.table().for_elements(&group.element_ids);
    if events.is_empty() {
        return Ok(None);
    }

    let interactions = aggregate_interactions(group, &events, ctx.population())?;
    let durations = estimate_durations(group, &events, ctx.population(), gap)?;

    Ok(Some(GroupReport {
        group: group.clone(),
        interactions,
        durations,
    }))
}

/// Decide whether a group's error skips the group or aborts the run.
///
/// Group-local errors become a skip reason in multi-group runs; everything
/// else, and any error in a single-group run, is returned as-is. The
/// estimator sorts timestamps first, so a timestamp-order error only
/// arrives here if that guarantee is ever broken.
pub fn recover_group_error(mode: RunMode, error: EngineError) -> Result<SkipReason, EngineError> {
    match mode {
        RunMode::MultiGroup if error.is_group_local() => {
            Ok(SkipReason::InvalidTimestampOrder(error.to_string()))
        }
        _ => Err(error),
    }
}

/// Run the engine over every group the strategy resolves.
///
/// # Errors
/// * `EngineError::EmptyPopulation` - no students in the context
/// * `EngineError::Configuration` / `EngineError::UnknownElement` - from resolution
/// * `EngineError::InvalidTimestampOrder` - single-group runs only; multi-group
///   runs record the group as skipped and continue
pub fn run_analysis(
    ctx: &AnalysisContext,
    strategy: &GroupingStrategy,
    gap: GapThreshold,
) -> Result<AnalysisRun, EngineError> {
    if ctx.population_size() == 0 {
        return Err(EngineError::EmptyPopulation);
    }

    let resolution = strategy.resolve(ctx.table())?;
    let mode = resolution.mode;

    let mut reports = Vec::with_capacity(resolution.groups.len());
    let mut skipped = Vec::new();
    let mut rollup = RollupBuilder::new(ctx.population());

    for group in &resolution.groups {
        debug!("Processing {} ({} elements)", group.name, group.element_ids.len());

        let report = match process_group(ctx, group, gap) {
            Ok(Some(report)) => report,
            Ok(None) => {
                info!("Skipping {}: no matching events", group.name);
                skipped.push(GroupNotice {
                    group: group.clone(),
                    reason: SkipReason::NoEvents,
                });
                continue;
            }
            Err(e) => {
                let reason = recover_group_error(mode, e)?;
                warn!("Skipping {}: {}", group.name, reason);
                skipped.push(GroupNotice {
                    group: group.clone(),
                    reason,
                });
                continue;
            }
        };

        rollup.fold(&report.group, &report.durations);
        reports.push(report);
    }

    info!(
        "Processed {} groups ({} skipped, {} ignored selectors)",
        reports.len(),
        skipped.len(),
        resolution.ignored.len()
    );

    Ok(AnalysisRun {
        mode,
        gap,
        population_size: ctx.population_size(),
        reports,
        skipped,
        ignored: resolution.ignored,
        rollup: rollup.finish(),
    })
}
