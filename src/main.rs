//! xAPI Analyzer CLI
//!
//! Per-element interaction percentages and per-student active time from
//! cleaned Learning Locker xAPI exports, grouped by day and unit.

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use xapi_engagement::commands::{
    display_schema, display_version, execute_analyze, validate_args, validate_config_file,
    AnalyzeArgs, GroupingSource,
};
use xapi_engagement::grouping::DaySelector;

/// xAPI Analyzer - engagement statistics for interactive course content
#[derive(Parser, Debug)]
#[command(name = "xapi-analyzer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze an xAPI export
    #[command(group(
        ArgGroup::new("grouping")
            .required(true)
            .args(["ids", "config", "pattern"]),
    ))]
    Analyze {
        /// Cleaned xAPI CSV export
        #[arg(short, long)]
        data: PathBuf,

        /// Explicit element ids, analyzed as one group
        #[arg(long, value_delimiter = ',')]
        ids: Option<Vec<u64>>,

        /// Grouping configuration (days, units, elements)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Group elements by "D<n>"/"Day<n>" label prefixes
        #[arg(long)]
        pattern: bool,

        /// Days to process: all, a list (1,2,5) or a range (3-7)
        #[arg(long, default_value = "all")]
        days: DaySelector,

        /// Gap threshold in minutes (overrides Time_Delta)
        #[arg(long, env = "XAPI_GAP_MINUTES")]
        gap_minutes: Option<f64>,

        /// Directory for the CSV reports
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Output path for the JSON run summary (optional)
        #[arg(long)]
        json: Option<PathBuf>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a grouping configuration file
    Validate {
        /// Path to grouping configuration JSON
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Analyze {
            data,
            ids,
            config,
            pattern: _,
            days,
            gap_minutes,
            output_dir,
            json,
            summary,
        } => {
            // The arg group guarantees exactly one source
            let source = match (ids, config) {
                (Some(ids), _) => GroupingSource::Ids(ids),
                (None, Some(path)) => GroupingSource::Config(path),
                (None, None) => GroupingSource::Pattern,
            };

            let args = AnalyzeArgs {
                data_path: data,
                source,
                days,
                gap_minutes,
                output_dir,
                json_summary: json,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_analyze(args)?;
        }

        Commands::Validate { config } => {
            validate_config_file(config)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
