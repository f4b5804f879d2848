//! Error types for parley-agent.

use parley_core::CoreError;
use parley_persist::PersistError;
use thiserror::Error;

/// Errors that can occur in agent operations.
///
/// Ordinary negotiation conditions (no offer yet, too little history to
/// learn from) are not errors; they are handled by policy fallbacks.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The domain has no bids, so there is nothing to offer.
    #[error("domain has no bids to offer")]
    EmptyDomain,

    /// History persistence failed.
    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),

    /// Domain or profile error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            AgentError::EmptyDomain.to_string(),
            "domain has no bids to offer"
        );
        assert_eq!(
            AgentError::InvalidConfig("gamma".into()).to_string(),
            "invalid configuration: gamma"
        );
        let err: AgentError = PersistError::InvalidKey(String::new()).into();
        assert!(err.to_string().starts_with("persistence error"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AgentError>();
    }
}
