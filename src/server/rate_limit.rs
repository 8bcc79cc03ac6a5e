//! Per-client request limiter for the country routes.
//!
//! Each client IP gets `max_requests` per fixed window. The budget resets
//! when a request arrives after the window has elapsed.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::RETRY_AFTER;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

use super::response::ApiError;
use super::AppState;

struct Window {
  started: Instant,
  count: u32,
}

pub struct RateLimiter {
  enabled: bool,
  max_requests: u32,
  window: Duration,
  /// Keyed by peer IP; `None` when the peer address is unknown
  clients: DashMap<Option<IpAddr>, Window>,
}

impl RateLimiter {
  pub fn new(config: &RateLimitConfig) -> Self {
    Self {
      enabled: config.enabled,
      max_requests: config.max_requests,
      window: Duration::from_secs(config.window_secs.max(1)),
      clients: DashMap::new(),
    }
  }

  pub fn window(&self) -> Duration {
    self.window
  }

  /// Count one request from `client`. Returns false once its budget for the
  /// current window is spent.
  pub fn check(&self, client: Option<IpAddr>) -> bool {
    if !self.enabled {
      return true;
    }

    let now = Instant::now();
    let mut window = self.clients.entry(client).or_insert(Window {
      started: now,
      count: 0,
    });
    if now.duration_since(window.started) >= self.window {
      *window = Window {
        started: now,
        count: 0,
      };
    }

    if window.count >= self.max_requests {
      return false;
    }
    window.count += 1;
    true
  }

  /// Drop clients whose window has run out.
  pub fn sweep(&self) {
    let now = Instant::now();
    self
      .clients
      .retain(|_, w| now.duration_since(w.started) < self.window);
  }

  fn rejection_message(&self) -> String {
    let secs = self.window.as_secs();
    let wait = if secs % 60 == 0 {
      format!("{} minutes", secs / 60)
    } else {
      format!("{} seconds", secs)
    };
    format!("Too many requests from this IP, please try again after {}.", wait)
  }
}

pub async fn limit_per_client(State(state): State<AppState>, request: Request, next: Next) -> Response {
  let client = request
    .extensions()
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ConnectInfo(addr)| addr.ip());

  let limiter = &state.rate_limiter;
  if limiter.check(client) {
    return next.run(request).await;
  }

  tracing::warn!(client = ?client, "Rate limit exceeded");
  let mut response = ApiError::TooManyRequests(limiter.rejection_message()).into_response();
  response
    .headers_mut()
    .insert(RETRY_AFTER, HeaderValue::from(limiter.window.as_secs()));
  response
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::net::Ipv4Addr;

  fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
    RateLimiter::new(&RateLimitConfig {
      enabled: true,
      max_requests,
      window_secs,
    })
  }

  #[test]
  fn test_budget_is_per_client() {
    let limiter = limiter(2, 600);
    let a = Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
    let b = Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)));

    assert!(limiter.check(a));
    assert!(limiter.check(a));
    assert!(!limiter.check(a));
    assert!(limiter.check(b));
  }

  #[test]
  fn test_disabled_limiter_allows_everything() {
    let limiter = RateLimiter::new(&RateLimitConfig {
      enabled: false,
      max_requests: 1,
      window_secs: 600,
    });
    for _ in 0..10 {
      assert!(limiter.check(None));
    }
  }

  #[test]
  fn test_window_reset_and_sweep() {
    let limiter = limiter(1, 1);
    assert!(limiter.check(None));
    assert!(!limiter.check(None));

    std::thread::sleep(Duration::from_millis(1100));
    limiter.sweep();
    assert!(limiter.clients.is_empty());
    assert!(limiter.check(None));
  }

  #[test]
  fn test_rejection_message_names_the_window() {
    assert_eq!(
      limiter(500, 600).rejection_message(),
      "Too many requests from this IP, please try again after 10 minutes."
    );
    assert_eq!(
      limiter(5, 30).rejection_message(),
      "Too many requests from this IP, please try again after 30 seconds."
    );
  }
}
