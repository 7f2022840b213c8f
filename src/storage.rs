//! Session state persistence.
//!
//! Workflow state is stored as an opaque JSON document keyed by session id.
//! The store is best-effort: the in-memory session is authoritative, the
//! table only survives process restarts.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

/// Storage error type.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// State document could not be (de)serialized.
    #[error("state serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Key-value persistence for serialized workflow state.
///
/// Keys are session ids; values are opaque JSON documents owned by the
/// workflow. Implementations must be safe to share across request handlers.
pub trait SessionStorage: Send + Sync + std::fmt::Debug {
    /// Fetch the stored document for a session, if any.
    fn get(&self, session_id: &str) -> Result<Option<String>, StorageError>;

    /// Store (insert or replace) the document for a session.
    fn put(&self, session_id: &str, state: &str) -> Result<(), StorageError>;

    /// Remove the document for a session. Removing an unknown id is not an
    /// error.
    fn delete(&self, session_id: &str) -> Result<(), StorageError>;
}

/// SQLite-backed session store.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the database at `db_path` and ensure the table
    /// exists.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        Self::setup_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory SQLite database, used by tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::setup_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn setup_db(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            CREATE TABLE IF NOT EXISTS workflow_sessions (
                session_id TEXT PRIMARY KEY,
                state TEXT NOT NULL
            );
        ",
        )
    }
}

impl SessionStorage for SqliteStorage {
    fn get(&self, session_id: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn.lock().unwrap();
        let state = conn
            .query_row(
                "SELECT state FROM workflow_sessions WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(state)
    }

    fn put(&self, session_id: &str, state: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO workflow_sessions (session_id, state) VALUES (?1, ?2)",
            params![session_id, state],
        )?;
        Ok(())
    }

    fn delete(&self, session_id: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM workflow_sessions WHERE session_id = ?1",
            params![session_id],
        )?;
        Ok(())
    }
}

/// In-memory session store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, session_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self.data.read().unwrap().get(session_id).cloned())
    }

    fn put(&self, session_id: &str, state: &str) -> Result<(), StorageError> {
        self.data
            .write()
            .unwrap()
            .insert(session_id.to_string(), state.to_string());
        Ok(())
    }

    fn delete(&self, session_id: &str) -> Result<(), StorageError> {
        self.data.write().unwrap().remove(session_id);
        Ok(())
    }
}
