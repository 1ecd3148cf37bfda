//! `lifetrack` CLI: expand, check and plan LifeTrack calendars from the command line.
//!
//! Every subcommand reads JSON (a list of scheduled items, or a plan request)
//! and writes pretty-printed JSON.
//!
//! ## Usage
//!
//! ```sh
//! # Occurrences for one week (stdin → stdout)
//! lifetrack expand --from 2026-03-02T00:00:00Z --to 2026-03-09T00:00:00Z < items.json
//!
//! # Conflict groups and resolution suggestions, file to file
//! lifetrack conflicts --from 2026-03-02T00:00:00Z --to 2026-03-09T00:00:00Z -i items.json -o conflicts.json
//!
//! # One-hour slots on a day, ranked against preferred times
//! lifetrack slots --day 2026-03-02 --duration 60 --prefer 10:00,15:30 -i items.json
//!
//! # Place a learning plan ({"plan": ..., "items": [...]})
//! lifetrack --config lifetrack.toml plan -i request.json
//!
//! # Debug logging on stderr
//! lifetrack -v expand --from ... --to ... -i items.json
//! ```

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use lifetrack_engine::{
    detect_conflicts, expand_all, find_available, find_best, schedule_plan, suggest_resolutions,
    ConflictGroup, ExpansionWarning, LearningPlan, Occurrence, PlanConflict, PlannerConfig,
    ResolutionOption, ScheduledItem, TimeSlot, TimeWindow,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "lifetrack",
    version,
    about = "Recurrence expansion, conflict detection and slot finding for LifeTrack calendars"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Planner configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log engine decisions at debug level on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Input and output files shared by every subcommand.
#[derive(clap::Args)]
struct Files {
    /// Input file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand items into occurrences within a window
    Expand {
        #[command(flatten)]
        files: Files,
        /// Window start (RFC 3339)
        #[arg(long)]
        from: DateTime<Utc>,
        /// Window end, exclusive (RFC 3339)
        #[arg(long)]
        to: DateTime<Utc>,
    },
    /// Group overlapping occurrences and suggest resolutions
    Conflicts {
        #[command(flatten)]
        files: Files,
        /// Window start (RFC 3339)
        #[arg(long)]
        from: DateTime<Utc>,
        /// Window end, exclusive (RFC 3339)
        #[arg(long)]
        to: DateTime<Utc>,
    },
    /// List free slots on a day and pick the best one
    Slots {
        #[command(flatten)]
        files: Files,
        /// Day to search (YYYY-MM-DD)
        #[arg(long)]
        day: NaiveDate,
        /// Slot length in minutes
        #[arg(long, allow_negative_numbers = true)]
        duration: i64,
        /// Comma-separated preferred start times (HH:MM)
        #[arg(long, value_delimiter = ',')]
        prefer: Vec<NaiveTime>,
    },
    /// Place a learning plan's sessions on the calendar
    Plan {
        #[command(flatten)]
        files: Files,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    debug!(?config, "loaded planner configuration");

    match cli.command {
        Commands::Expand { files, from, to } => {
            let items = read_items(files.input.as_deref())?;
            let window = TimeWindow::new(from, to).context("Invalid --from/--to window")?;
            let set = expand_all(&items, window).context("Failed to expand items")?;
            let report = ExpandReport {
                occurrences: set.occurrences,
                warnings: messages(&set.warnings),
            };
            write_json(files.output.as_deref(), &report)?;
        }
        Commands::Conflicts { files, from, to } => {
            let items = read_items(files.input.as_deref())?;
            let window = TimeWindow::new(from, to).context("Invalid --from/--to window")?;
            let set = expand_all(&items, window).context("Failed to expand items")?;
            let conflicts = detect_conflicts(&set.occurrences)
                .into_iter()
                .map(ConflictReport::new)
                .collect();
            let report = ConflictsReport {
                conflicts,
                warnings: messages(&set.warnings),
            };
            write_json(files.output.as_deref(), &report)?;
        }
        Commands::Slots {
            files,
            day,
            duration,
            prefer,
        } => {
            let items = read_items(files.input.as_deref())?;
            let window = config
                .working_hours
                .on(day)
                .context("Invalid working hours in configuration")?;
            let set = expand_all(&items, window).context("Failed to expand items")?;
            let busy: Vec<Occurrence> = set
                .occurrences
                .into_iter()
                .filter(|o| config.all_day_blocks_slots || !o.all_day)
                .collect();
            let slots = find_available(&busy, day, Duration::minutes(duration), config.working_hours)
                .context("Failed to find available slots")?;
            let report = SlotsReport {
                best: find_best(&slots, &prefer),
                slots,
                warnings: messages(&set.warnings),
            };
            write_json(files.output.as_deref(), &report)?;
        }
        Commands::Plan { files } => {
            let raw = read_input(files.input.as_deref())?;
            let request: PlanRequest =
                serde_json::from_str(&raw).context("Failed to parse plan request JSON")?;
            let outcome = schedule_plan(&request.plan, &request.items, &config)
                .with_context(|| format!("Failed to schedule plan '{}'", request.plan.id))?;
            let report = PlanReport {
                placed: outcome.placed,
                conflicts: outcome.conflicts,
                unplaced_days: outcome.unplaced_days,
                warnings: messages(&outcome.warnings),
            };
            write_json(files.output.as_deref(), &report)?;
        }
    }

    Ok(())
}

/// Log to stderr so JSON on stdout stays clean. `RUST_LOG` wins unless
/// `--verbose` is given.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Read the planner configuration, or fall back to defaults without a file.
fn load_config(path: Option<&Path>) -> Result<PlannerConfig> {
    let Some(path) = path else {
        return Ok(PlannerConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: PlannerConfig = toml::from_str(&raw)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    config
        .working_hours
        .validate()
        .with_context(|| format!("Invalid working hours in {}", path.display()))?;
    Ok(config)
}

fn read_items(path: Option<&Path>) -> Result<Vec<ScheduledItem>> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw).context("Failed to parse scheduled items JSON")
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    content.push('\n');
    match path {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write file: {}", path.display()))?,
        None => print!("{content}"),
    }
    Ok(())
}

fn messages(warnings: &[ExpansionWarning]) -> Vec<String> {
    warnings.iter().map(ToString::to_string).collect()
}

// ---------------------------------------------------------------------------
// Input and output documents
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PlanRequest {
    plan: LearningPlan,
    #[serde(default)]
    items: Vec<ScheduledItem>,
}

#[derive(Serialize)]
struct ExpandReport {
    occurrences: Vec<Occurrence>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct ConflictReport {
    #[serde(flatten)]
    group: ConflictGroup,
    suggestions: Vec<ResolutionOption>,
}

impl ConflictReport {
    fn new(group: ConflictGroup) -> Self {
        Self {
            suggestions: suggest_resolutions(&group),
            group,
        }
    }
}

#[derive(Serialize)]
struct ConflictsReport {
    conflicts: Vec<ConflictReport>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct SlotsReport {
    slots: Vec<TimeSlot>,
    best: Option<TimeSlot>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct PlanReport {
    placed: Vec<Occurrence>,
    conflicts: Vec<PlanConflict>,
    unplaced_days: Vec<NaiveDate>,
    warnings: Vec<String>,
}
