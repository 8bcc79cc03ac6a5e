//! Redis cache store implementation.

use color_eyre::{eyre::eyre, Result};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::traits::CacheStore;

/// Bound on a single dial and on each command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// After a failed dial, connects fail fast for this long.
const RETRY_AFTER_FAILURE: Duration = Duration::from_secs(30);

#[derive(Default)]
struct ConnState {
  manager: Option<ConnectionManager>,
  last_failure: Option<Instant>,
}

/// Cache store backed by a shared Redis instance.
///
/// The connection is opened on first use. The async mutex is held for the
/// whole dial, so requests that arrive mid-connect wait on it and then reuse
/// the manager instead of opening their own. A dial never takes longer than
/// the configured timeout, and a failed one is not retried until
/// [`RETRY_AFTER_FAILURE`] has passed, so an unreachable server costs each
/// request a fast miss rather than a wait.
pub struct RedisStore {
  url: String,
  timeout: Duration,
  state: Mutex<ConnState>,
}

impl RedisStore {
  pub fn new(url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      timeout: DEFAULT_TIMEOUT,
      state: Mutex::new(ConnState::default()),
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Clone the live connection manager out of the lock.
  async fn connection(&self) -> Result<ConnectionManager> {
    self
      .state
      .lock()
      .await
      .manager
      .clone()
      .ok_or_else(|| eyre!("Redis cache is not connected"))
  }

  async fn dial(&self) -> Result<ConnectionManager> {
    let client = redis::Client::open(self.url.as_str())
      .map_err(|e| eyre!("Invalid Redis URL {}: {}", self.url, e))?;

    // The default backoff grows to minutes; keep reconnects short
    let config = ConnectionManagerConfig::new()
      .set_number_of_retries(1)
      .set_max_delay(100)
      .set_connection_timeout(self.timeout)
      .set_response_timeout(self.timeout);

    tokio::time::timeout(self.timeout, ConnectionManager::new_with_config(client, config))
      .await
      .map_err(|_| eyre!("Timed out connecting to Redis at {} after {:?}", self.url, self.timeout))?
      .map_err(|e| eyre!("Failed to connect to Redis at {}: {}", self.url, e))
  }
}

impl CacheStore for RedisStore {
  async fn connect(&self) -> Result<()> {
    let mut state = self.state.lock().await;
    if state.manager.is_some() {
      return Ok(());
    }
    if let Some(failed_at) = state.last_failure {
      if failed_at.elapsed() < RETRY_AFTER_FAILURE {
        return Err(eyre!("Redis at {} is unavailable", self.url));
      }
    }

    match self.dial().await {
      Ok(manager) => {
        state.manager = Some(manager);
        state.last_failure = None;
        tracing::info!(url = %self.url, "Connected to Redis");
        Ok(())
      }
      Err(e) => {
        state.last_failure = Some(Instant::now());
        Err(e)
      }
    }
  }

  async fn get(&self, key: &str) -> Result<Option<String>> {
    let mut conn = self.connection().await?;
    conn
      .get::<_, Option<String>>(key)
      .await
      .map_err(|e| eyre!("Redis GET {} failed: {}", key, e))
  }

  async fn set_with_expiry(&self, key: &str, ttl: Duration, value: &str) -> Result<()> {
    let mut conn = self.connection().await?;
    // SETEX rejects a zero expiry
    let seconds = ttl.as_secs().max(1);
    conn
      .set_ex::<_, _, ()>(key, value, seconds)
      .await
      .map_err(|e| eyre!("Redis SETEX {} failed: {}", key, e))
  }

  async fn close(&self) -> Result<()> {
    let mut state = self.state.lock().await;
    state.last_failure = None;
    if state.manager.take().is_some() {
      tracing::info!(url = %self.url, "Redis client closed");
    }
    Ok(())
  }

  fn name(&self) -> &'static str {
    "redis"
  }
}
