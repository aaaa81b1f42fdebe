//! SQLite-backed key-value store

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use super::Store;
use crate::{Error, Result};

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Pooled database connection
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Key-value store over a pooled `SQLite` database
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    /// Open (or create) the store at the given path
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened or initialized
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let manager = SqliteConnectionManager::file(path);
        Self::from_manager(manager, 4)
    }

    /// Open an in-memory store (for testing)
    ///
    /// A single connection is used so all callers see the same database.
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be initialized
    pub fn in_memory() -> Result<Self> {
        Self::from_manager(SqliteConnectionManager::memory(), 1)
    }

    fn from_manager(manager: SqliteConnectionManager, max_size: u32) -> Result<Self> {
        let pool = Pool::builder()
            .max_size(max_size)
            .build(manager)
            .map_err(|e| Error::Store(e.to_string()))?;

        let conn = pool.get().map_err(|e| Error::Store(e.to_string()))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )?;

        tracing::debug!("key-value store initialized");
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<DbConn> {
        self.pool.get().map_err(|e| Error::Store(e.to_string()))
    }
}

impl Store for SqliteStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.get_raw("tasks").unwrap(), None);

        store.put_raw("tasks", "[]").unwrap();
        assert_eq!(store.get_raw("tasks").unwrap().as_deref(), Some("[]"));

        store.put_raw("tasks", "[1]").unwrap();
        assert_eq!(store.get_raw("tasks").unwrap().as_deref(), Some("[1]"));
    }
}
