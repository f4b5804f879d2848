//! Error types for history persistence.

use thiserror::Error;

/// Errors that can occur while writing persisted state.
#[derive(Debug, Error)]
pub enum PersistError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The counterpart identity cannot be used as a store key.
    #[error("invalid counterpart key: {0:?}")]
    InvalidKey(String),
}

/// Result type alias for persistence operations.
pub type Result<T> = std::result::Result<T, PersistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = PersistError::InvalidKey(String::new());
        assert_eq!(err.to_string(), "invalid counterpart key: \"\"");

        let err = PersistError::Io(std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "I/O error: disk full");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PersistError>();
    }
}
