//! Runtime selection between cache store implementations.

use color_eyre::Result;
use std::time::Duration;

use super::memory::MemoryStore;
use super::redis::RedisStore;
use super::sqlite::SqliteStore;
use super::traits::CacheStore;
use crate::config::{CacheBackendKind, CacheConfig};

/// The cache store chosen by configuration.
pub enum CacheBackend {
  Memory(MemoryStore),
  Sqlite(SqliteStore),
  Redis(RedisStore),
  /// Caching disabled: every read misses and writes are discarded
  Disabled,
}

impl CacheBackend {
  /// Build the configured backend. No connection is opened here.
  pub fn from_config(config: &CacheConfig) -> Result<Self> {
    let backend = match config.backend {
      CacheBackendKind::Memory => Self::Memory(MemoryStore::new()),
      CacheBackendKind::Sqlite => match &config.sqlite_path {
        Some(path) => Self::Sqlite(SqliteStore::new(path)),
        None => Self::Sqlite(SqliteStore::at_default_path()?),
      },
      CacheBackendKind::Redis => Self::Redis(
        RedisStore::new(&config.redis_url)
          .with_timeout(Duration::from_millis(config.redis_timeout_ms.max(1))),
      ),
      CacheBackendKind::None => Self::Disabled,
    };
    Ok(backend)
  }
}

impl CacheStore for CacheBackend {
  async fn connect(&self) -> Result<()> {
    match self {
      Self::Memory(store) => store.connect().await,
      Self::Sqlite(store) => store.connect().await,
      Self::Redis(store) => store.connect().await,
      Self::Disabled => Ok(()),
    }
  }

  async fn get(&self, key: &str) -> Result<Option<String>> {
    match self {
      Self::Memory(store) => store.get(key).await,
      Self::Sqlite(store) => store.get(key).await,
      Self::Redis(store) => store.get(key).await,
      Self::Disabled => Ok(None), // Always miss
    }
  }

  async fn set_with_expiry(&self, key: &str, ttl: Duration, value: &str) -> Result<()> {
    match self {
      Self::Memory(store) => store.set_with_expiry(key, ttl, value).await,
      Self::Sqlite(store) => store.set_with_expiry(key, ttl, value).await,
      Self::Redis(store) => store.set_with_expiry(key, ttl, value).await,
      Self::Disabled => Ok(()), // Discard
    }
  }

  async fn close(&self) -> Result<()> {
    match self {
      Self::Memory(store) => store.close().await,
      Self::Sqlite(store) => store.close().await,
      Self::Redis(store) => store.close().await,
      Self::Disabled => Ok(()),
    }
  }

  fn name(&self) -> &'static str {
    match self {
      Self::Memory(store) => store.name(),
      Self::Sqlite(store) => store.name(),
      Self::Redis(store) => store.name(),
      Self::Disabled => "disabled",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_disabled_backend_always_misses() {
    let backend = CacheBackend::Disabled;
    backend.connect().await.unwrap();
    backend
      .set_with_expiry("countryData", Duration::from_secs(60), "[]")
      .await
      .unwrap();
    assert_eq!(backend.get("countryData").await.unwrap(), None);
  }

  #[test]
  fn test_from_config_selects_backend() {
    let config = CacheConfig {
      backend: CacheBackendKind::Memory,
      ..CacheConfig::default()
    };
    let backend = CacheBackend::from_config(&config).unwrap();
    assert_eq!(backend.name(), "memory");

    let config = CacheConfig {
      backend: CacheBackendKind::Sqlite,
      sqlite_path: Some("/tmp/country-cache-test.db".into()),
      ..CacheConfig::default()
    };
    let backend = CacheBackend::from_config(&config).unwrap();
    assert_eq!(backend.name(), "sqlite");

    let backend = CacheBackend::from_config(&CacheConfig::default()).unwrap();
    assert_eq!(backend.name(), "redis");
  }
}
