//! Core traits and types for the caching system.

use color_eyre::Result;
use std::future::Future;
use std::time::Duration;

/// A shared key/value store with per-key expiry.
///
/// Values are opaque text and are always replaced whole, never patched, so
/// concurrent writers can only race to "last write wins".
pub trait CacheStore: Send + Sync {
  /// Establish the backing connection if it isn't open yet.
  ///
  /// Must be idempotent and safe to call from many requests at once: a caller
  /// arriving while a connect is in progress waits for it instead of dialing
  /// a second time.
  fn connect(&self) -> impl Future<Output = Result<()>> + Send;

  /// Read a value. Expired and missing keys are both `None`.
  fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

  /// Write a value that expires `ttl` after this call.
  fn set_with_expiry(
    &self,
    key: &str,
    ttl: Duration,
    value: &str,
  ) -> impl Future<Output = Result<()>> + Send;

  /// Release the backing connection. A later `connect` reopens it.
  fn close(&self) -> impl Future<Output = Result<()>> + Send;

  /// Short backend name for logs (e.g., "redis").
  fn name(&self) -> &'static str;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched from upstream on a miss, then written to the cache
  Network,
  /// Unexpired copy read from the cache store
  Cache,
}
