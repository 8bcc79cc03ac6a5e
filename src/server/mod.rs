//! HTTP surface: router, shared state and the serve loop.

pub mod auth;
pub mod extract;
pub mod handlers;
pub mod rate_limit;
pub mod response;

use axum::routing::get;
use axum::{middleware, Router};
use color_eyre::{eyre::eyre, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::cache::CacheBackend;
use crate::config::Config;
use crate::countries::CachedCountryClient;

pub use rate_limit::RateLimiter;
pub use response::{ApiError, ApiResponse};

/// Prefix the country routes are mounted under.
pub const API_PREFIX: &str = "/api/1.0";

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
  pub countries: CachedCountryClient<CacheBackend>,
  /// Overrides the `Host`-derived origin in page links
  pub public_url: Option<String>,
  pub auth_token: Option<String>,
  pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
  pub fn new(config: &Config, countries: CachedCountryClient<CacheBackend>) -> Self {
    Self {
      countries,
      public_url: config.server.public_url.clone(),
      auth_token: config.auth.token.clone(),
      rate_limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
    }
  }
}

pub fn build_router(state: AppState) -> Router {
  let api = Router::new()
    .route("/countries", get(handlers::list_countries))
    .route("/countries/search", get(handlers::search_countries))
    .route("/countries/region/{region}", get(handlers::countries_by_region))
    .route("/countries/{code}", get(handlers::country_by_code))
    .route_layer(middleware::from_fn_with_state(
      state.clone(),
      auth::require_bearer_token,
    ))
    .route_layer(middleware::from_fn_with_state(
      state.clone(),
      rate_limit::limit_per_client,
    ));

  Router::new()
    .route("/health", get(handlers::health))
    .nest(API_PREFIX, api)
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
  let addr = listener
    .local_addr()
    .map_err(|e| eyre!("Failed to read listener address: {}", e))?;
  tracing::info!(%addr, "Server running at http://{}{}", addr, API_PREFIX);

  axum::serve(
    listener,
    router.into_make_service_with_connect_info::<SocketAddr>(),
  )
  .with_graceful_shutdown(shutdown_signal())
  .await
  .map_err(|e| eyre!("Server error: {}", e))
}

/// Periodically forget clients whose rate-limit window has ended.
pub fn spawn_rate_limit_sweeper(limiter: Arc<RateLimiter>) -> tokio::task::JoinHandle<()> {
  tokio::spawn(async move {
    let mut tick = tokio::time::interval(limiter.window());
    loop {
      tick.tick().await;
      limiter.sweep();
    }
  })
}

async fn shutdown_signal() {
  let _ = tokio::signal::ctrl_c().await;
  tracing::info!("shutdown signal received");
}
