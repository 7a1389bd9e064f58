use std::collections::HashSet;
use std::time::Duration;

use crate::common::{ChatMessage, MessageOrigin};

/// How long after a local send its echo may still be merged into it.
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(10);

/// Result of [`MessageStore::append`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    /// The incoming message was the echo of this pending entry, which is
    /// now `local-confirmed`.
    Confirmed(String),
    /// An entry with the same id is already stored.
    Ignored,
}

impl AppendOutcome {
    pub fn mutated(&self) -> bool {
        !matches!(self, AppendOutcome::Ignored)
    }
}

/// Ordered, deduplicated message log. Insertion order is display order.
#[derive(Debug, Clone)]
pub struct MessageStore {
    messages: Vec<ChatMessage>,
    dedup_window: Duration,
}

impl MessageStore {
    pub fn new(dedup_window: Duration) -> Self {
        Self {
            messages: Vec::new(),
            dedup_window,
        }
    }

    /// Rebuild the log from persisted messages, keeping the first entry of
    /// any repeated id.
    pub fn hydrate(messages: Vec<ChatMessage>, dedup_window: Duration) -> Self {
        let mut seen = HashSet::new();
        let total = messages.len();
        let messages: Vec<_> = messages
            .into_iter()
            .filter(|message| seen.insert(message.id.clone()))
            .collect();
        if messages.len() != total {
            log::warn!(
                "Dropped {} persisted messages with duplicate ids",
                total - messages.len()
            );
        }
        Self {
            messages,
            dedup_window,
        }
    }

    pub fn append(&mut self, message: ChatMessage) -> AppendOutcome {
        if self.messages.iter().any(|existing| existing.id == message.id) {
            return AppendOutcome::Ignored;
        }

        if message.origin == MessageOrigin::Remote {
            if let Some(index) = self.find_pending_echo_target(&message) {
                let entry = &mut self.messages[index];
                entry.origin = MessageOrigin::LocalConfirmed;
                return AppendOutcome::Confirmed(entry.id.clone());
            }
        }

        self.messages.push(message);
        AppendOutcome::Appended
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn all(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    // Oldest match wins, so each echo confirms exactly one pending send.
    fn find_pending_echo_target(&self, echo: &ChatMessage) -> Option<usize> {
        self.messages
            .iter()
            .position(|entry| self.is_echo_of(echo, entry))
    }

    fn is_echo_of(&self, echo: &ChatMessage, entry: &ChatMessage) -> bool {
        if !entry.is_pending() || entry.author != echo.author || entry.text != echo.text {
            return false;
        }
        // Stamps are wall-clock and may step backwards between a send and
        // its echo, so the window applies to the distance in either direction.
        let skew = if echo.sent_at >= entry.sent_at {
            echo.sent_at - entry.sent_at
        } else {
            entry.sent_at - echo.sent_at
        };
        skew.to_std().is_ok_and(|skew| skew <= self.dedup_window)
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_WINDOW)
    }
}
