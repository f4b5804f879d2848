//! Error types for parley-core.

use thiserror::Error;

/// Errors raised while building domains and utility spaces.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The domain definition is malformed.
    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    /// The utility profile is malformed.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// A bid references an issue the domain does not define.
    #[error("unknown issue: {0}")]
    UnknownIssue(String),

    /// A bid uses a value that is not legal for its issue.
    #[error("unknown value '{value}' for issue '{issue}'")]
    UnknownValue {
        /// Issue name.
        issue: String,
        /// Offending value.
        value: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = CoreError::UnknownIssue("price".into());
        assert_eq!(err.to_string(), "unknown issue: price");

        let err = CoreError::UnknownValue {
            issue: "color".into(),
            value: "mauve".into(),
        };
        assert_eq!(err.to_string(), "unknown value 'mauve' for issue 'color'");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CoreError>();
    }
}
