//! Cached country client that wraps CountryApiClient with transparent caching.

use color_eyre::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheLayer, CacheSource, CacheStore};
use crate::config::Config;

use super::api_types::RawCountryRecord;
use super::client::CountryApiClient;

/// Cache key holding the whole upstream dataset.
pub const COUNTRY_DATA_KEY: &str = "countryData";

/// Country client with transparent caching support.
///
/// This wraps the underlying CountryApiClient and serves the dataset from
/// the cache store while it is fresh. It is the only place the dataset is
/// fetched or written.
pub struct CachedCountryClient<S: CacheStore> {
  inner: CountryApiClient,
  cache: CacheLayer<S>,
}

impl<S: CacheStore> CachedCountryClient<S> {
  /// Create a new cached client over an already constructed store.
  pub fn new(config: &Config, store: Arc<S>) -> Result<Self> {
    let inner = CountryApiClient::new(&config.upstream)?;
    let cache = CacheLayer::new(store).with_ttl(Duration::from_secs(config.cache.ttl_secs));

    Ok(Self { inner, cache })
  }

  pub fn from_parts(inner: CountryApiClient, cache: CacheLayer<S>) -> Self {
    Self { inner, cache }
  }

  pub fn store(&self) -> &Arc<S> {
    self.cache.store()
  }

  /// Get the full country dataset, from cache when fresh.
  ///
  /// A miss costs exactly one upstream call and one cache write. The upstream
  /// error is returned as-is when that call fails.
  pub async fn get_country_dataset(&self) -> Result<Vec<RawCountryRecord>> {
    let result = self
      .cache
      .fetch(COUNTRY_DATA_KEY, || {
        let inner = self.inner.clone();
        async move { inner.get_all_countries().await }
      })
      .await
      .inspect_err(|e| tracing::error!(error = %e, "Failed to fetch data from country API"))?;

    match result.source {
      CacheSource::Cache => {
        tracing::info!(count = result.data.len(), "Fetched data from cache")
      }
      CacheSource::Network => tracing::info!(
        count = result.data.len(),
        "Fetched data from country API and cached"
      ),
    }

    Ok(result.data)
  }
}

impl<S: CacheStore> Clone for CachedCountryClient<S> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
      cache: self.cache.clone(),
    }
  }
}
