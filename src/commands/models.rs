use crate::grouping::DaySelector;
use crate::parser::event::ElementId;
use std::path::PathBuf;

/// Where a run's groups come from
#[derive(Debug, Clone, PartialEq)]
pub enum GroupingSource {
    /// Explicit element ids, analyzed as one group
    Ids(Vec<ElementId>),

    /// Grouping configuration file (day → unit → elements)
    Config(PathBuf),

    /// Day numbers taken from element label prefixes
    Pattern,
}

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Cleaned xAPI CSV export
    pub data_path: PathBuf,

    pub source: GroupingSource,

    /// Days to process (ignored for explicit ids)
    pub days: DaySelector,

    /// Overrides the configuration's Time_Delta
    pub gap_minutes: Option<f64>,

    /// Directory receiving the CSV reports
    pub output_dir: PathBuf,

    /// Optional path for the JSON run summary
    pub json_summary: Option<PathBuf>,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data.csv"),
            source: GroupingSource::Pattern,
            days: DaySelector::All,
            gap_minutes: None,
            output_dir: PathBuf::from("."),
            json_summary: None,
            print_summary: false,
        }
    }
}
