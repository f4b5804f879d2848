//! CLI error types.

use std::fmt;

use parley_agent::AgentError;
use parley_core::CoreError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Invalid configuration.
    Config(String),
    /// Output formatting error.
    Format(String),
    /// Invalid argument.
    InvalidArgument(String),
    /// A profile could not be loaded.
    Profile(CoreError),
    /// The negotiation agent failed.
    Agent(AgentError),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Profile(e) => write!(f, "profile error: {e}"),
            Self::Agent(e) => write!(f, "agent error: {e}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Profile(e) => Some(e),
            Self::Agent(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        Self::Profile(err)
    }
}

impl From<AgentError> for CliError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::InvalidConfig(msg) => Self::Config(msg),
            other => Self::Agent(other),
        }
    }
}
