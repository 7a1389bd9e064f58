use rusqlite::{Connection, OptionalExtension, Result as SqlResult, params};
use std::path::Path;

use crate::common::ChatMessage;
use crate::error::PersistenceError;

use super::{Persistence, decode_log, encode_log, ensure_parent_dir};

/// SQLite-backed key/value store holding the message log as JSON text
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at `path`
    pub fn with_path<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        ensure_parent_dir(path).map_err(|err| {
            PersistenceError::Unavailable(format!("cannot create {}: {err}", path.display()))
        })?;
        Self::from_connection(Connection::open(path)?)
    }

    /// Store that lives only as long as the process
    pub fn in_memory() -> Result<Self, PersistenceError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, PersistenceError> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> SqlResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            )",
            [],
        )?;
        Ok(())
    }

    fn get_raw(&self, key: &str) -> SqlResult<Option<String>> {
        self.conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
    }

    fn set_raw(&self, key: &str, value: &str) -> SqlResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now'))",
            params![key, value],
        )?;
        Ok(())
    }
}

impl Persistence for SqliteStore {
    fn load(&self, key: &str) -> Result<Vec<ChatMessage>, PersistenceError> {
        match self.get_raw(key)? {
            Some(raw) => decode_log(key, &raw),
            None => Ok(Vec::new()),
        }
    }

    fn save(&mut self, key: &str, messages: &[ChatMessage]) -> Result<(), PersistenceError> {
        let raw = encode_log(messages)?;
        self.set_raw(key, &raw)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Identity;

    #[test]
    fn log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/chat.db");
        let alice = Identity::new("alice").unwrap();
        let messages = vec![
            ChatMessage::local_pending(&alice, "hello"),
            ChatMessage::remote("bob", "hey"),
        ];

        {
            let mut store = SqliteStore::with_path(&path).unwrap();
            store.save("chatMessages", &messages).unwrap();
        }

        let store = SqliteStore::with_path(&path).unwrap();
        assert_eq!(store.load("chatMessages").unwrap(), messages);
        assert!(store.load("otherKey").unwrap().is_empty());
    }

    #[test]
    fn save_replaces_and_remove_deletes() {
        let mut store = SqliteStore::in_memory().unwrap();
        store.save("k", &[ChatMessage::remote("bob", "one")]).unwrap();
        store.save("k", &[]).unwrap();
        assert!(store.load("k").unwrap().is_empty());

        store.save("k", &[ChatMessage::remote("bob", "two")]).unwrap();
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.get_raw("k").unwrap().is_none());
    }

    #[test]
    fn opening_creates_the_kv_table_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.db");
        SqliteStore::with_path(&path).unwrap();
        let store = SqliteStore::with_path(&path).unwrap();

        let tables: i64 = store
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'kv_store'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn garbage_value_is_reported_as_corrupt() {
        let store = SqliteStore::in_memory().unwrap();
        store.set_raw("k", "not json").unwrap();
        assert!(matches!(store.load("k"), Err(PersistenceError::Corrupt { .. })));
    }
}
