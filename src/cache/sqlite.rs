//! SQLite cache store implementation.

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::traits::CacheStore;

/// SQLite-based cache store.
///
/// The database file is opened lazily by [`CacheStore::connect`]. Expiry is
/// stored as a unix timestamp in milliseconds next to each value; reads
/// filter on it, and writes sweep rows that have already expired.
///
/// rusqlite is blocking, so every statement runs on the blocking pool.
pub struct SqliteStore {
  path: PathBuf,
  conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteStore {
  /// Create a store for the database at `path`. Nothing is opened yet.
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      conn: Arc::new(Mutex::new(None)),
    }
  }

  /// Create a store at the default location.
  pub fn at_default_path() -> Result<Self> {
    Ok(Self::new(Self::default_path()?))
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("country-cache").join("cache.db"))
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Run `f` against the connection slot on the blocking pool.
  async fn with_conn<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut Option<Connection>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let conn = Arc::clone(&self.conn);
    tokio::task::spawn_blocking(move || {
      let mut guard = conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))?;
      f(&mut guard)
    })
    .await
    .map_err(|e| eyre!("SQLite cache task failed: {}", e))?
  }

  fn open_connection(path: &Path) -> Result<Connection> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(conn)
  }
}

/// Schema for the cache table.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cache_entries (
    cache_key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    expires_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cache_entries_expires ON cache_entries(expires_at);
"#;

impl CacheStore for SqliteStore {
  async fn connect(&self) -> Result<()> {
    let path = self.path.clone();
    self
      .with_conn(move |conn| {
        if conn.is_none() {
          *conn = Some(Self::open_connection(&path)?);
          tracing::info!(path = %path.display(), "Opened SQLite cache");
        }
        Ok(())
      })
      .await
  }

  async fn get(&self, key: &str) -> Result<Option<String>> {
    let key = key.to_string();
    self
      .with_conn(move |conn| {
        let conn = conn
          .as_ref()
          .ok_or_else(|| eyre!("SQLite cache is not connected"))?;

        conn
          .query_row(
            "SELECT value FROM cache_entries WHERE cache_key = ? AND expires_at > ?",
            params![key, Utc::now().timestamp_millis()],
            |row| row.get(0),
          )
          .optional()
          .map_err(|e| eyre!("Failed to read cache entry {}: {}", key, e))
      })
      .await
  }

  async fn set_with_expiry(&self, key: &str, ttl: Duration, value: &str) -> Result<()> {
    let key = key.to_string();
    let value = value.to_string();
    self
      .with_conn(move |conn| {
        let conn = conn
          .as_ref()
          .ok_or_else(|| eyre!("SQLite cache is not connected"))?;

        let now = Utc::now().timestamp_millis();
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = now.saturating_add(ttl_millis);

        conn
          .execute(
            "DELETE FROM cache_entries WHERE expires_at <= ?",
            params![now],
          )
          .map_err(|e| eyre!("Failed to sweep expired cache entries: {}", e))?;

        conn
          .execute(
            "INSERT OR REPLACE INTO cache_entries (cache_key, value, expires_at)
             VALUES (?, ?, ?)",
            params![key, value, expires_at],
          )
          .map_err(|e| eyre!("Failed to store cache entry {}: {}", key, e))?;

        Ok(())
      })
      .await
  }

  async fn close(&self) -> Result<()> {
    self
      .with_conn(|conn| {
        if let Some(conn) = conn.take() {
          conn
            .close()
            .map_err(|(_, e)| eyre!("Failed to close SQLite cache: {}", e))?;
        }
        Ok(())
      })
      .await
  }

  fn name(&self) -> &'static str {
    "sqlite"
  }
}
