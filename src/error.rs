//! Error types for the chat session.
//!
//! None of these are fatal. Callers log them, show them as a warning, or
//! fold them into the connection state.

use thiserror::Error;

/// Input rejected locally before anything else happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("username must not be empty")]
    EmptyIdentity,

    #[error("username already selected as `{0}`")]
    IdentityAlreadySelected(String),

    #[error("message must not be empty")]
    EmptyText,
}

/// Failures of the channel connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// `send` called outside the `Connected` state; nothing was forwarded.
    #[error("not connected")]
    NotConnected,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Storage read/write/delete failures.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage backend error: {0}")]
    Backend(#[from] rusqlite::Error),

    #[error("failed to encode messages: {0}")]
    Encode(serde_json::Error),

    #[error("stored value under `{key}` is not a message log: {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Inbound frame that does not match the channel envelope.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("frame is missing `{0}`")]
    MissingField(&'static str),
}

/// Errors returned by the session entry points.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ValidationError::IdentityAlreadySelected("alice".to_string());
        assert_eq!(err.to_string(), "username already selected as `alice`");

        let err = ConnectionError::Transport("reset by peer".to_string());
        assert_eq!(err.to_string(), "transport error: reset by peer");

        let err = SessionError::from(ValidationError::EmptyText);
        assert_eq!(err.to_string(), "message must not be empty");
    }
}
