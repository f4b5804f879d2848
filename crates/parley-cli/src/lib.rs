//! # parley-cli
//!
//! Parley command-line interface.
//!
//! Provides commands for:
//! - Inspecting the concession history persisted for a counterpart
//! - Running a local alternating-offers session between two agents
//!
//! Both commands work directly on history directories written by
//! `parley_persist::FileHistoryStore`; there is no daemon to talk to.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format, HistoryArgs, SimulateArgs};
pub use error::CliError;
pub use output::OutputFormat;
