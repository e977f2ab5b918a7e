//! Recipe Stage CLI
//!
//! The `recipe` command loads a session seed and inspects or replays
//! edits against it.
//!
//! ## Commands
//!
//! - `replay`: Apply a JSON command script and print outcomes and final state
//! - `types`: List component types with their staged classification
//! - `knobs`: Show a step's overrides with validation and filter counts
//! - `parse-bulk`: Parse bulk override text into a JSON map

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use recipe_core::{
    CommandOutcome, FilterCounts, OverrideFilter, OverrideRow, Session, SessionCommand,
    SessionSnapshot, METRICS,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "recipe")]
#[command(author = "Recipe Stage Maintainers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Stage, diff and validate build recipe changes", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Log line format; `--json` takes precedence
    #[arg(
        long,
        global = true,
        env = "RECIPE_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Text
    )]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON command script against a session seed
    Replay {
        /// Session seed file (JSON)
        #[arg(long, env = "RECIPE_SEED")]
        seed: PathBuf,

        /// Command script file (JSON array of commands)
        #[arg(long)]
        commands: PathBuf,
    },

    /// List component types in display order
    Types {
        /// Session seed file (JSON)
        #[arg(long, env = "RECIPE_SEED")]
        seed: PathBuf,

        /// Command script to apply first
        #[arg(long)]
        commands: Option<PathBuf>,
    },

    /// Show overrides for a workflow step
    Knobs {
        /// Session seed file (JSON)
        #[arg(long, env = "RECIPE_SEED")]
        seed: PathBuf,

        /// Workflow step id
        #[arg(long)]
        step: String,

        /// Override filter: all, warnings, diff or user
        #[arg(long, default_value = "all")]
        filter: OverrideFilter,

        /// Case-insensitive search over name, category and value
        #[arg(long, default_value = "")]
        search: String,

        /// Command script to apply first
        #[arg(long)]
        commands: Option<PathBuf>,
    },

    /// Parse bulk override text (`KEY=VALUE` separated by newlines or commas)
    ParseBulk {
        /// Input file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    recipe_core::init_tracing(cli.json || cli.log_format == LogFormat::Json, level);

    let result = match cli.command {
        Commands::Replay { seed, commands } => cmd_replay(&seed, &commands),
        Commands::Types { seed, commands } => cmd_types(&seed, commands.as_deref()),
        Commands::Knobs {
            seed,
            step,
            filter,
            search,
            commands,
        } => cmd_knobs(&seed, &step, filter, &search, commands.as_deref()),
        Commands::ParseBulk { input } => cmd_parse_bulk(&input),
    };

    METRICS.flush();
    result
}

fn load_session(seed: &Path) -> Result<Session> {
    Session::from_seed_path(seed)
        .with_context(|| format!("Failed to load session seed {}", seed.display()))
}

fn load_commands(path: &Path) -> Result<Vec<SessionCommand>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read command script {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse command script {}", path.display()))
}

fn apply_commands(session: &mut Session, path: &Path) -> Result<Vec<CommandOutcome>> {
    let commands = load_commands(path)?;
    let count = commands.len();
    let outcomes = session
        .execute_all(commands)
        .with_context(|| format!("Replay of {} failed", path.display()))?;
    info!(commands = count, "Command script applied");
    Ok(outcomes)
}

/// Replay output: per-command outcomes, final state and per-step counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayReport {
    outcomes: Vec<CommandOutcome>,
    snapshot: SessionSnapshot,
    counts: BTreeMap<String, FilterCounts>,
}

fn build_replay_report(seed: &Path, commands: &Path) -> Result<ReplayReport> {
    let mut session = load_session(seed)?;
    let outcomes = apply_commands(&mut session, commands)?;
    let counts = session
        .steps()
        .iter()
        .map(|step| Ok((step.id.clone(), session.override_counts(&step.id)?)))
        .collect::<recipe_core::Result<BTreeMap<_, _>>>()?;
    Ok(ReplayReport {
        outcomes,
        snapshot: session.snapshot(),
        counts,
    })
}

fn cmd_replay(seed: &Path, commands: &Path) -> Result<()> {
    let report = build_replay_report(seed, commands)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn render_types(session: &Session) -> String {
    let snapshot = session.snapshot();
    let mut out = String::new();
    for view in &snapshot.types {
        let record = &view.record;
        let binding = |ing: &Option<String>, ver: &Option<String>| match (ing, ver) {
            (Some(i), Some(v)) => format!("{}@{}", i, v),
            (Some(i), None) => i.clone(),
            _ => "-".to_string(),
        };
        out.push_str(&format!(
            "{} {:<12} {:<15} current={:<28} staged={:<28} {:?}\n",
            if record.is_pinned { "*" } else { " " },
            record.label,
            format!("{:?}", record.status),
            binding(&record.current.ingredient_id, &record.current.version_id),
            binding(&record.staged.ingredient_id, &record.staged.version_id),
            view.change_type,
        ));
    }
    out.push_str(&format!(
        "{} pending change(s){}\n",
        snapshot.pending_change_count,
        if snapshot.has_user_modifications {
            ", user modifications present"
        } else {
            ""
        }
    ));
    out
}

fn cmd_types(seed: &Path, commands: Option<&Path>) -> Result<()> {
    let mut session = load_session(seed)?;
    if let Some(path) = commands {
        apply_commands(&mut session, path)?;
    }
    print!("{}", render_types(&session));
    Ok(())
}

fn render_knobs(counts: &FilterCounts, rows: &[OverrideRow]) -> String {
    let mut out = format!(
        "all={} warnings={} diff={} user={}\n",
        counts.all, counts.warnings, counts.diff, counts.user
    );
    for row in rows {
        let status = match row.validation.message() {
            Some(message) if row.validation.is_warning() => format!("WARNING {}", message),
            Some(message) => format!("OK ({})", message),
            None => "OK".to_string(),
        };
        out.push_str(&format!(
            "{:<24} {:<24} {}\n",
            row.knob_name, row.display_value, status
        ));
    }
    out
}

fn cmd_knobs(
    seed: &Path,
    step: &str,
    filter: OverrideFilter,
    search: &str,
    commands: Option<&Path>,
) -> Result<()> {
    let mut session = load_session(seed)?;
    if let Some(path) = commands {
        apply_commands(&mut session, path)?;
    }
    let counts = session.override_counts(step)?;
    let rows = session.override_rows(step, filter, search)?;
    print!("{}", render_knobs(&counts, &rows));
    Ok(())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read bulk text from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}

fn cmd_parse_bulk(input: &str) -> Result<()> {
    let text = read_input(input)?;
    let parsed = recipe_core::parse_bulk(&text);
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}
