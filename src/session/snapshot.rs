use std::sync::Arc;

use crate::common::{ChatMessage, ConnectionState, Identity};

/// Immutable view of the session handed to the presentation layer.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub connection: ConnectionState,
    pub messages: Arc<[ChatMessage]>,
    /// Latest non-fatal problem worth showing to the user.
    pub warning: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            identity: None,
            connection: ConnectionState::Disconnected,
            messages: Arc::from(Vec::new()),
            warning: None,
        }
    }
}
