use std::collections::HashMap;

use crate::common::ChatMessage;
use crate::error::PersistenceError;

use super::{Persistence, decode_log, encode_log};

/// In-process store. Values go through the same JSON encoding as the
/// on-disk store so both behave alike.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Stored value for `key` as written, without decoding.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Store a raw value, bypassing encoding.
    pub fn insert_raw(&mut self, key: &str, raw: impl Into<String>) {
        self.entries.insert(key.to_string(), raw.into());
    }
}

impl Persistence for MemoryStore {
    fn load(&self, key: &str) -> Result<Vec<ChatMessage>, PersistenceError> {
        match self.entries.get(key) {
            Some(raw) => decode_log(key, raw),
            None => Ok(Vec::new()),
        }
    }

    fn save(&mut self, key: &str, messages: &[ChatMessage]) -> Result<(), PersistenceError> {
        let raw = encode_log(messages)?;
        self.entries.insert(key.to_string(), raw);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }
}
