//! Parley CLI binary entrypoint.
//!
//! This is the main entry point for the `parley` command-line tool.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use parley_cli::cli::{Cli, Commands, Format};
use parley_cli::commands::{HistoryCommand, SimulateCommand};
use parley_cli::output::OutputFormat;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::History(args) => {
            let format = OutputFormat::new(if args.json { Format::Json } else { cli.format });
            let cmd = HistoryCommand::new(&args.store);
            cmd.execute(&mut stdout, &format, &args.counterpart)
                .with_context(|| format!("reading history of '{}'", args.counterpart))?;
        }
        Commands::Simulate(args) => {
            let format = OutputFormat::new(cli.format);
            let cmd = SimulateCommand::from_args(&args).context("loading agent configuration")?;
            cmd.execute(
                &mut stdout,
                &format,
                &args.profile_a,
                &args.profile_b,
                args.rounds,
            )
            .context("running simulation")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_history() {
        let cli = Cli::parse_from(["parley", "history", "--store", "h", "tft"]);
        assert!(matches!(cli.command, Commands::History(_)));
    }

    #[test]
    fn cli_respects_format_flag() {
        let cli = Cli::parse_from(["parley", "--format", "json", "history", "-s", "h", "tft"]);
        assert_eq!(cli.format, Format::Json);
    }

    #[test]
    fn run_history_on_empty_store_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = dir.path().to_string_lossy().into_owned();
        let cli = Cli::parse_from(["parley", "history", "--store", &store, "nobody"]);
        assert!(run(cli).is_ok());
    }

    #[test]
    fn run_simulate_with_missing_profiles_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.json").to_string_lossy().into_owned();
        let b = dir.path().join("b.json").to_string_lossy().into_owned();
        let cli = Cli::parse_from(["parley", "simulate", "--profile-a", &a, "--profile-b", &b]);
        let err = run(cli).unwrap_err();
        assert!(format!("{err:#}").contains("running simulation"));
    }

    #[test]
    fn run_simulate_with_bad_config_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = dir.path().join("agent.json");
        std::fs::write(&config, r#"{"opponent":{"gamma":2.0}}"#).expect("write");
        let config = config.to_string_lossy().into_owned();
        let cli = Cli::parse_from([
            "parley",
            "simulate",
            "--profile-a",
            "a.json",
            "--profile-b",
            "b.json",
            "--config",
            &config,
        ]);
        let err = run(cli).unwrap_err();
        assert!(format!("{err:#}").contains("configuration"));
    }
}
