//! NBTRACE CLI
//!
//! Command-line interface for notebook history reconstruction.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use nbtrace_log::LogParser;
use nbtrace_notebook::{NotebookSnapshot, Scan};
use nbtrace_replay::{
    ReplayConfig, ReplayEngine, SessionBuilder, SessionConfig, SessionSet, SimulateConfig,
    Simulator,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nbtrace")]
#[command(about = "NBTRACE - Notebook edit history reconstruction", long_about = None)]
struct Cli {
    /// JSON file with replay, simulate and session settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize an event log
    Inspect {
        /// Path to log file
        #[arg(short, long)]
        log: PathBuf,
    },
    /// Reconstruct notebook histories from an event log
    Progress {
        /// Path to log file
        #[arg(short, long)]
        log: PathBuf,
        #[command(flatten)]
        batch: BatchArgs,
        /// Search cells from the bottom of the notebook
        #[arg(long)]
        from_bottom: bool,
    },
    /// Simulate notebook histories without a log
    Simulate {
        #[command(flatten)]
        batch: BatchArgs,
        /// Keep leading comment lines when emptying a cell
        #[arg(long)]
        keep_header_comments: bool,
    },
    /// Diff two snapshots of the same notebook
    Diff {
        /// Earlier notebook
        #[arg(long)]
        left: PathBuf,
        /// Later notebook
        #[arg(long)]
        right: PathBuf,
    },
}

/// Options shared by the batch commands
#[derive(Args)]
struct BatchArgs {
    /// Directory searched recursively for notebooks
    #[arg(short, long)]
    notebooks: PathBuf,
    /// Output directory for states and summaries
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Minimum number of states for a session to be kept
    #[arg(long)]
    min_steps: Option<usize>,
    /// Regex a notebook file name must match
    #[arg(long)]
    filter: Option<String>,
    /// Write every state, not just the first and last
    #[arg(long)]
    all_states: bool,
}

/// Settings file contents. Command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
struct CliConfig {
    replay: ReplayConfig,
    simulate: SimulateConfig,
    session: SessionConfig,
}

impl CliConfig {
    fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).wrap_err_with(|| format!("parsing config {}", path.display()))
    }

    fn apply_batch(&mut self, batch: &BatchArgs) {
        if let Some(min_steps) = batch.min_steps {
            self.session.min_steps = min_steps;
        }
        if let Some(filter) = &batch.filter {
            self.session.notebook_filter.clone_from(filter);
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "nbtrace=info",
        1 => "nbtrace=debug",
        _ => "nbtrace=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Inspect { log } => {
            let log = LogParser::from_path(&log).wrap_err("loading event log")?;
            print!("{}", inspect(&log));
            Ok(())
        }
        Commands::Progress {
            log,
            batch,
            from_bottom,
        } => {
            config.apply_batch(&batch);
            if from_bottom {
                config.replay.scan = Scan::FromBottom;
            }
            let log = LogParser::from_path(&log).wrap_err("loading event log")?;
            let builder = SessionBuilder::new(config.session)?;
            let engine = ReplayEngine::new().with_config(config.replay);
            let set = builder
                .logged_sessions(&batch.notebooks, &log, &engine)
                .wrap_err("building logged sessions")?;
            report(&set, &batch)
        }
        Commands::Simulate {
            batch,
            keep_header_comments,
        } => {
            config.apply_batch(&batch);
            if keep_header_comments {
                config.simulate.keep_header_comments = true;
            }
            let builder = SessionBuilder::new(config.session)?;
            let simulator = Simulator::new().with_config(config.simulate);
            let set = builder
                .simulated_sessions(&batch.notebooks, &simulator)
                .wrap_err("building simulated sessions")?;
            report(&set, &batch)
        }
        Commands::Diff { left, right } => {
            let left = NotebookSnapshot::from_path(&left).wrap_err("loading left notebook")?;
            let right = NotebookSnapshot::from_path(&right).wrap_err("loading right notebook")?;
            print!("{}", diff(&left, &right)?);
            Ok(())
        }
    }
}

fn inspect(log: &LogParser) -> String {
    let join = |items: Vec<String>| items.join(", ");
    let mut out = String::new();
    out.push_str(&format!("log: {}\n", log.label()));
    out.push_str(&format!("entries: {}\n", log.len()));
    out.push_str(&format!(
        "entry types: {}\n",
        join(log.entry_types().iter().map(ToString::to_string).collect())
    ));
    out.push_str(&format!(
        "cell types: {}\n",
        join(log.cell_types().iter().map(ToString::to_string).collect())
    ));
    out.push_str(&format!("users: {}\n", join(log.users().into_iter().collect())));
    out.push_str("notebooks:\n");
    for (notebook, partition) in log.partition_by_notebook() {
        let gaps = partition.discontinuities();
        out.push_str(&format!(
            "  {notebook}: {} entries, {} discontinuities\n",
            partition.len(),
            gaps.len()
        ));
        for (before, after) in gaps {
            let resumed = partition
                .get_by_id(after)
                .map_or_else(String::new, |entry| format!(" ({})", entry.entry_type));
            out.push_str(&format!("    gap {before} -> {after}{resumed}\n"));
        }
    }
    out
}

fn report(set: &SessionSet, batch: &BatchArgs) -> Result<()> {
    for failure in &set.failures {
        tracing::warn!(
            notebook = %failure.notebook.display(),
            error = %failure.error,
            "skipped notebook"
        );
    }
    for (notebook, steps) in &set.too_short {
        tracing::info!(notebook = %notebook.display(), steps, "session too short");
    }

    for session in set.iter() {
        println!("{}: {} states", session.notebook.display(), session.progress.len());
        if let Some(output) = &batch.output {
            if batch.all_states {
                session.write_states(output)?;
            } else {
                session.write_first_last_states(output)?;
            }
            session.write_summary(output)?;
        }
    }
    println!(
        "{} sessions kept, {} too short, {} failed",
        set.len(),
        set.too_short.len(),
        set.failures.len()
    );
    Ok(())
}

fn diff(left: &NotebookSnapshot, right: &NotebookSnapshot) -> Result<String> {
    let diffs = left.get_diff(right).wrap_err("diffing notebooks")?;
    let mut out = String::new();
    for cell_diff in &diffs {
        out.push_str(&format!("--- {}\n", cell_diff.cell_id()));
        for change in cell_diff.line_changes() {
            let line = match change {
                nbtrace_notebook::LineChange::Added(new) => format!("+ {new}"),
                nbtrace_notebook::LineChange::Removed(old) => format!("- {old}"),
                nbtrace_notebook::LineChange::Modified { old, new } => format!("- {old}\n+ {new}"),
                nbtrace_notebook::LineChange::Unchanged(same) => format!("  {same}"),
            };
            out.push_str(&line);
            out.push('\n');
        }
    }
    out.push_str(&format!("{} cells changed\n", diffs.len()));
    Ok(out)
}
