//! Persistent key/value store trait and its SQLite, in-memory and no-op backends.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StoreError;

/// Durable asynchronous key/value storage over a single logical table.
///
/// Values are whole serialized payloads; callers never read-modify-write,
/// so no cross-key transactions are offered.
#[async_trait]
pub trait KvStore: Send + Sync {
  async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

  async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

  async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStore;

#[async_trait]
impl KvStore for NoopStore {
  async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
    Ok(None) // Always miss
  }

  async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
    Ok(()) // Discard
  }

  async fn delete(&self, _key: &str) -> Result<(), StoreError> {
    Ok(())
  }
}

/// Process-local store, used for `--no-persist` runs and tests.
#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl KvStore for MemoryStore {
  async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let entries = self
      .entries
      .lock()
      .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {}", e)))?;
    Ok(entries.get(key).cloned())
  }

  async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {}", e)))?;
    entries.insert(key.to_string(), value.to_string());
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<(), StoreError> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {}", e)))?;
    entries.remove(key);
    Ok(())
  }
}

/// SQLite-based store implementation.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open (or create) the store at `path`, or at the default location.
  pub fn open(path: Option<&Path>) -> Result<Self, StoreError> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        StoreError::Unavailable(format!("Failed to create cache directory: {}", e))
      })?;
    }

    let conn = Connection::open(&path).map_err(|e| {
      StoreError::Unavailable(format!(
        "Failed to open cache database at {}: {}",
        path.display(),
        e
      ))
    })?;

    Self::with_connection(conn)
  }

  /// Open a store that lives only as long as this process.
  pub fn open_in_memory() -> Result<Self, StoreError> {
    let conn = Connection::open_in_memory()
      .map_err(|e| StoreError::Unavailable(format!("Failed to open in-memory cache: {}", e)))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self, StoreError> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf, StoreError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| StoreError::Unavailable("Could not determine data directory".into()))?;

    Ok(data_dir.join("orgdash").join("cache.db"))
  }

  fn run_migrations(&self) -> Result<(), StoreError> {
    let conn = self.lock()?;
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| StoreError::Unavailable(format!("Failed to run cache migrations: {}", e)))
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
    self
      .conn
      .lock()
      .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {}", e)))
  }
}

/// Schema for the cache table.
const CACHE_SCHEMA: &str = r#"
-- One row per cache key; value is the serialized {storedAt, ttlMs, value} envelope
CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

#[async_trait]
impl KvStore for SqliteStore {
  async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let conn = self.lock()?;
    conn
      .query_row(
        "SELECT value FROM cache_entries WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| StoreError::Read {
        key: key.to_string(),
        message: e.to_string(),
      })
  }

  async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let conn = self.lock()?;
    conn
      .execute(
        "INSERT OR REPLACE INTO cache_entries (key, value) VALUES (?, ?)",
        params![key, value],
      )
      .map_err(|e| StoreError::Write {
        key: key.to_string(),
        message: e.to_string(),
      })?;
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<(), StoreError> {
    let conn = self.lock()?;
    conn
      .execute("DELETE FROM cache_entries WHERE key = ?", params![key])
      .map_err(|e| StoreError::Write {
        key: key.to_string(),
        message: e.to_string(),
      })?;
    Ok(())
  }
}
