//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`history`] - Inspect a counterpart's persisted concession history
//! - [`simulate`] - Local self-play session between two agents

pub mod history;
pub mod simulate;

pub use history::HistoryCommand;
pub use simulate::SimulateCommand;
