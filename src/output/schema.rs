//! Run summary schema.
//!
//! The JSON summary is the machine-readable side of a run: what was
//! processed, what was skipped, and which rollup columns were produced.
//! Tables themselves go to CSV.

use crate::aggregator::calculate_duration_distribution;
use crate::aggregator::metrics::DurationDistribution;
use crate::engine::{AnalysisRun, GroupReport};
use crate::grouping::RunMode;
use crate::utils::config::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};

/// Top-level run summary
///
/// **Public** - serialized by `write_summary`, read back by `read_summary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Schema version for compatibility
    pub version: String,

    /// Generation time (RFC 3339)
    pub generated_at: String,

    /// "single_group" or "multi_group"
    pub mode: String,

    pub gap_minutes: f64,
    pub population_size: usize,

    pub groups: Vec<GroupSummary>,

    #[serde(default)]
    pub skipped: Vec<SkippedGroup>,

    /// Requested day numbers the grouping did not know
    #[serde(default)]
    pub ignored_days: Vec<u32>,

    pub rollup_columns: Vec<String>,
}

/// One processed group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub number: u32,
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<u32>,

    pub element_count: usize,
    pub event_count: usize,

    /// Students who interacted with at least one element
    pub engaged_students: usize,

    /// Mean of the per-element interaction percentages
    pub mean_interaction_percentage: f64,

    pub durations: DurationDistribution,
}

/// One group that produced no report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedGroup {
    pub number: u32,
    pub name: String,
    pub reason: String,
}

impl GroupSummary {
    pub fn from_report(report: &GroupReport) -> Self {
        Self {
            number: report.group.number,
            name: report.group.name.clone(),
            unit: report.group.unit,
            element_count: report.interactions.element_count(),
            event_count: report.durations.event_count,
            engaged_students: report.interactions.engaged_students().len(),
            mean_interaction_percentage: report.interactions.mean_percentage(),
            durations: calculate_duration_distribution(&report.durations),
        }
    }
}

impl RunSummary {
    /// Summarize a finished run
    pub fn from_run(run: &AnalysisRun) -> Self {
        let mode = match run.mode {
            RunMode::SingleGroup => "single_group",
            RunMode::MultiGroup => "multi_group",
        };

        let skipped = run
            .skipped
            .iter()
            .map(|notice| SkippedGroup {
                number: notice.group.number,
                name: notice.group.name.clone(),
                reason: notice.reason.to_string(),
            })
            .collect();

        Self {
            version: SCHEMA_VERSION.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            mode: mode.to_string(),
            gap_minutes: run.gap.minutes(),
            population_size: run.population_size,
            groups: run.reports.iter().map(GroupSummary::from_report).collect(),
            skipped,
            ignored_days: run.ignored.clone(),
            rollup_columns: run
                .rollup
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}
