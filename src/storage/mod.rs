pub mod kv_store;
pub mod memory;

pub use kv_store::SqliteStore;
pub use memory::MemoryStore;

use std::fs;
use std::path::Path;

use crate::common::ChatMessage;
use crate::error::PersistenceError;

/// Durable home of the message log, stored as one JSON blob per key.
///
/// Implementations report every failure as a value; a missing key loads
/// as an empty log and removing it again succeeds.
pub trait Persistence: Send {
    fn load(&self, key: &str) -> Result<Vec<ChatMessage>, PersistenceError>;

    fn save(&mut self, key: &str, messages: &[ChatMessage]) -> Result<(), PersistenceError>;

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// Ensure the directory holding `path` exists
pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub(crate) fn encode_log(messages: &[ChatMessage]) -> Result<String, PersistenceError> {
    serde_json::to_string(messages).map_err(PersistenceError::Encode)
}

pub(crate) fn decode_log(key: &str, raw: &str) -> Result<Vec<ChatMessage>, PersistenceError> {
    serde_json::from_str(raw).map_err(|source| PersistenceError::Corrupt {
        key: key.to_string(),
        source,
    })
}
