//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Parley - learning negotiation agent tools.
#[derive(Parser, Debug, Clone)]
#[command(name = "parley")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[derive(Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the concession history persisted for a counterpart.
    History(HistoryArgs),

    /// Run one alternating-offers session between two local agents.
    ///
    /// Both agents learn: with `--store`, each session appends to the
    /// histories kept under the other profile's name.
    Simulate(SimulateArgs),
}

/// Arguments for the history command.
#[derive(Parser, Debug, Clone)]
pub struct HistoryArgs {
    /// Directory holding the history files.
    #[arg(short, long, env = "PARLEY_STORE")]
    pub store: PathBuf,

    /// Counterpart identity, e.g. `boulware`.
    pub counterpart: String,

    /// Shorthand for `--format json`.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the simulate command.
#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Profile of the opening agent (JSON).
    #[arg(long, value_name = "FILE")]
    pub profile_a: PathBuf,

    /// Profile of the responding agent (JSON).
    #[arg(long, value_name = "FILE")]
    pub profile_b: PathBuf,

    /// Offer budget before the deadline.
    #[arg(short, long, default_value_t = 200)]
    pub rounds: u64,

    /// Directory to load and save histories in; omitted means in-memory.
    #[arg(short, long, env = "PARLEY_STORE")]
    pub store: Option<PathBuf>,

    /// Agent configuration (JSON) applied to both agents.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
