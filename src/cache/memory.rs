//! In-process cache store.

use color_eyre::Result;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use super::traits::CacheStore;

/// A cached value and the instant it stops being served.
#[derive(Debug, Clone)]
struct CachedEntry {
  value: String,
  expires_at: Instant,
}

impl CachedEntry {
  fn is_expired(&self) -> bool {
    Instant::now() >= self.expires_at
  }
}

/// Cache store backed by a concurrent map local to this process.
///
/// Useful for single-instance deployments and tests. Expired entries are
/// dropped lazily when they are read.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: DashMap<String, CachedEntry>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of entries currently held, expired or not.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl CacheStore for MemoryStore {
  async fn connect(&self) -> Result<()> {
    Ok(())
  }

  async fn get(&self, key: &str) -> Result<Option<String>> {
    if let Some(entry) = self.entries.get(key) {
      if !entry.is_expired() {
        return Ok(Some(entry.value.clone()));
      }
    } else {
      return Ok(None);
    }

    // Only reached for an expired entry; the read guard is gone by now
    self.entries.remove_if(key, |_, entry| entry.is_expired());
    Ok(None)
  }

  async fn set_with_expiry(&self, key: &str, ttl: Duration, value: &str) -> Result<()> {
    self.entries.insert(
      key.to_string(),
      CachedEntry {
        value: value.to_string(),
        expires_at: Instant::now() + ttl,
      },
    );
    Ok(())
  }

  async fn close(&self) -> Result<()> {
    self.entries.clear();
    Ok(())
  }

  fn name(&self) -> &'static str {
    "memory"
  }
}
