use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Where a message came from and whether the channel has echoed it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageOrigin {
    /// Sent by this session, echo not seen yet.
    LocalPending,
    /// Sent by this session and echoed back by the channel.
    LocalConfirmed,
    Remote,
}

/// Domain model for one chat message.
///
/// Field names on disk are `id`, `text`, `author`, `sentAt` and `origin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub author: String,
    pub sent_at: DateTime<Utc>,
    pub origin: MessageOrigin,
}

impl ChatMessage {
    /// Optimistic message written by the local user.
    pub fn local_pending(author: &Identity, text: impl Into<String>) -> Self {
        Self::new(author.as_str(), text, MessageOrigin::LocalPending)
    }

    /// Message received from the channel.
    pub fn remote(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(author, text, MessageOrigin::Remote)
    }

    fn new(author: impl Into<String>, text: impl Into<String>, origin: MessageOrigin) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            author: author.into(),
            sent_at: Utc::now(),
            origin,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.origin == MessageOrigin::LocalPending
    }

    /// True when the message was written under `identity`, whichever
    /// session actually sent it.
    pub fn is_own(&self, identity: &Identity) -> bool {
        self.author == identity.as_str()
    }
}

/// Display name chosen once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyIdentity);
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of the channel connection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed(String),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// A connection attempt is in flight or established.
    pub fn is_live(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("Disconnected"),
            ConnectionState::Connecting => f.write_str("Connecting"),
            ConnectionState::Connected => f.write_str("Connected"),
            ConnectionState::Failed(reason) => write!(f, "Failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_trimmed_and_rejects_blank() {
        assert_eq!(Identity::new("  alice ").unwrap().as_str(), "alice");
        assert_eq!(Identity::new("   "), Err(ValidationError::EmptyIdentity));
        assert_eq!(Identity::new(""), Err(ValidationError::EmptyIdentity));
    }

    #[test]
    fn message_serializes_with_wire_field_names() {
        let identity = Identity::new("alice").unwrap();
        let message = ChatMessage::local_pending(&identity, "hi");
        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["author"], "alice");
        assert_eq!(value["text"], "hi");
        assert_eq!(value["origin"], "local-pending");
        assert!(value.get("sentAt").is_some());
        assert!(value.get("sent_at").is_none());
    }

    #[test]
    fn is_own_compares_author_with_identity() {
        let alice = Identity::new("alice").unwrap();
        assert!(ChatMessage::remote("alice", "x").is_own(&alice));
        assert!(!ChatMessage::remote("bob", "x").is_own(&alice));
    }
}
