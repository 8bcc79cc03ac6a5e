//! Cache layer that orchestrates caching logic with network fetching.

use color_eyre::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::traits::{CacheResult, CacheStore};

/// Default time-to-live for cached values.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cache layer that manages caching logic and network fetching.
///
/// This layer sits between the data access code and the network client.
/// Store failures never fail a fetch on their own: a broken read is a miss
/// and a broken write is logged and dropped. Only the fetcher's error is
/// returned to the caller.
///
/// Concurrent misses for one key are not coalesced; each caller runs its own
/// fetcher and writes its own copy.
pub struct CacheLayer<S: CacheStore> {
  store: Arc<S>,
  /// How long a written value stays fresh
  ttl: Duration,
}

impl<S: CacheStore> CacheLayer<S> {
  /// Create a new cache layer with the given store.
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      ttl: DEFAULT_TTL,
    }
  }

  /// Set the time-to-live for written values.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn store(&self) -> &Arc<S> {
    &self.store
  }

  /// Fetch with cache-first strategy.
  ///
  /// 1. Ensure the store is connected
  /// 2. Check cache - if present, return immediately
  /// 3. On miss, run the fetcher; its error is returned as-is
  /// 4. Write the fresh value with the layer's TTL and return it
  pub async fn fetch<T, F, Fut>(&self, key: &str, fetcher: F) -> Result<CacheResult<T>>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    if let Some(cached) = self.read::<T>(key).await {
      return Ok(CacheResult::from_cache(cached));
    }

    let data = fetcher().await?;
    self.write(key, &data).await;
    Ok(CacheResult::from_network(data))
  }

  async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    if let Err(e) = self.store.connect().await {
      tracing::warn!(store = self.store.name(), error = %e, "Cache connect failed, treating as miss");
      return None;
    }

    match self.store.get(key).await {
      Ok(Some(text)) => match serde_json::from_str(&text) {
        Ok(value) => {
          tracing::debug!(key, store = self.store.name(), "cache hit");
          Some(value)
        }
        Err(e) => {
          tracing::warn!(key, error = %e, "Cached value is unreadable, treating as miss");
          None
        }
      },
      Ok(None) => {
        tracing::debug!(key, store = self.store.name(), "cache miss");
        None
      }
      Err(e) => {
        tracing::warn!(key, error = %e, "Cache read failed, treating as miss");
        None
      }
    }
  }

  async fn write<T: Serialize>(&self, key: &str, data: &T) {
    let text = match serde_json::to_string(data) {
      Ok(text) => text,
      Err(e) => {
        tracing::warn!(key, error = %e, "Failed to serialize value for cache");
        return;
      }
    };

    match self.store.set_with_expiry(key, self.ttl, &text).await {
      Ok(()) => {
        tracing::debug!(key, ttl_secs = self.ttl.as_secs(), bytes = text.len(), "cache set")
      }
      Err(e) => tracing::warn!(key, error = %e, "Cache write failed"),
    }
  }
}

impl<S: CacheStore> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      ttl: self.ttl,
    }
  }
}
