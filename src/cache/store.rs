//! Key-value storage backends for the local mirror.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection};

use crate::error::{Result, TrackerError};

/// String key-value store consumed by the cache mirror.
///
/// `set_many` must update all entries together where the backend supports it;
/// the mirror relies on it so a reader never observes new records next to a
/// stale sync timestamp.
pub trait KvStore: Send + Sync {
  fn get_string(&self, key: &str) -> Result<Option<String>>;

  fn set_string(&self, key: &str, value: &str) -> Result<()>;

  fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
    for (key, value) in entries {
      self.set_string(key, value)?;
    }
    Ok(())
  }
}

/// SQLite-backed key-value store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

/// Schema for the key-value table.
const KV_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SqliteStore {
  /// Open or create the store at the default location.
  pub fn open() -> Result<Self> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open or create the store at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| TrackerError::Cache(format!("Failed to create cache directory: {}", e)))?;
    }

    let conn = Connection::open(path).map_err(|e| {
      TrackerError::Cache(format!(
        "Failed to open cache database at {}: {}",
        path.display(),
        e
      ))
    })?;

    Self::from_connection(conn)
  }

  /// Open a throwaway in-memory store. Used in tests.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| TrackerError::Cache(format!("Failed to open in-memory cache: {}", e)))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  /// Get the default database path.
  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| TrackerError::Cache("Could not determine data directory".into()))?;

    Ok(data_dir.join("itemtrack").join("cache.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self.lock()?;
    conn
      .execute_batch(KV_SCHEMA)
      .map_err(|e| TrackerError::Cache(format!("Failed to run cache migrations: {}", e)))?;
    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| TrackerError::Cache(format!("Lock poisoned: {}", e)))
  }
}

impl KvStore for SqliteStore {
  fn get_string(&self, key: &str) -> Result<Option<String>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare("SELECT value FROM kv_store WHERE key = ?")
      .map_err(|e| TrackerError::Cache(format!("Failed to prepare query: {}", e)))?;

    let value: Option<String> = stmt.query_row(params![key], |row| row.get(0)).ok();
    Ok(value)
  }

  fn set_string(&self, key: &str, value: &str) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute(
        "INSERT OR REPLACE INTO kv_store (key, value, updated_at)
         VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| TrackerError::Cache(format!("Failed to store value: {}", e)))?;

    Ok(())
  }

  fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute("BEGIN TRANSACTION", [])
      .map_err(|e| TrackerError::Cache(format!("Failed to begin transaction: {}", e)))?;

    for (key, value) in entries {
      if let Err(e) = conn.execute(
        "INSERT OR REPLACE INTO kv_store (key, value, updated_at)
         VALUES (?, ?, datetime('now'))",
        params![key, value],
      ) {
        let _ = conn.execute("ROLLBACK", []);
        return Err(TrackerError::Cache(format!("Failed to store value: {}", e)));
      }
    }

    conn
      .execute("COMMIT", [])
      .map_err(|e| TrackerError::Cache(format!("Failed to commit transaction: {}", e)))?;

    Ok(())
  }
}

/// HashMap-backed store. Used in tests.
#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KvStore for MemoryStore {
  fn get_string(&self, key: &str) -> Result<Option<String>> {
    let entries = self
      .entries
      .lock()
      .map_err(|e| TrackerError::Cache(format!("Lock poisoned: {}", e)))?;
    Ok(entries.get(key).cloned())
  }

  fn set_string(&self, key: &str, value: &str) -> Result<()> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| TrackerError::Cache(format!("Lock poisoned: {}", e)))?;
    entries.insert(key.to_string(), value.to_string());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sqlite_get_set_roundtrip() {
    let store = SqliteStore::open_in_memory().unwrap();

    assert_eq!(store.get_string("missing").unwrap(), None);

    store.set_string("k", "v1").unwrap();
    assert_eq!(store.get_string("k").unwrap(), Some("v1".into()));

    store.set_string("k", "v2").unwrap();
    assert_eq!(store.get_string("k").unwrap(), Some("v2".into()));
  }

  #[test]
  fn test_sqlite_set_many_updates_both_keys() {
    let store = SqliteStore::open_in_memory().unwrap();

    store.set_many(&[("records", "[]"), ("last_sync", "42")]).unwrap();

    assert_eq!(store.get_string("records").unwrap(), Some("[]".into()));
    assert_eq!(store.get_string("last_sync").unwrap(), Some("42".into()));
  }

  #[test]
  fn test_memory_store_roundtrip() {
    let store = MemoryStore::new();
    store.set_string("a", "1").unwrap();
    store.set_many(&[("b", "2"), ("c", "3")]).unwrap();

    assert_eq!(store.get_string("a").unwrap(), Some("1".into()));
    assert_eq!(store.get_string("b").unwrap(), Some("2".into()));
    assert_eq!(store.get_string("c").unwrap(), Some("3".into()));
  }
}
