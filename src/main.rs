use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;

use country_cache::cache::{CacheBackend, CacheStore};
use country_cache::config::{CacheBackendKind, Config};
use country_cache::countries::CachedCountryClient;
use country_cache::{logging, server};

#[derive(Parser, Debug)]
#[command(name = "country-cache")]
#[command(about = "Paginated, searchable country data API with a cached upstream")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/country-cache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Port to listen on
  #[arg(short, long)]
  port: Option<u16>,

  /// Cache store to use
  #[arg(long, value_enum)]
  cache_backend: Option<CacheBackendKind>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = Config::load(args.config.as_deref())?;
  config.apply_env()?;
  if let Some(port) = args.port {
    config.server.port = port;
  }
  if let Some(backend) = args.cache_backend {
    config.cache.backend = backend;
  }

  let _log_guard = logging::init(&config.logging)?;

  let store = Arc::new(CacheBackend::from_config(&config.cache)?);
  tracing::info!(backend = store.name(), ttl_secs = config.cache.ttl_secs, "Cache store configured");

  let countries = CachedCountryClient::new(&config, store.clone())?;
  let state = server::AppState::new(&config, countries);
  let sweeper = server::spawn_rate_limit_sweeper(state.rate_limiter.clone());
  let router = server::build_router(state);

  let addr = config.addr()?;
  let listener = tokio::net::TcpListener::bind(addr)
    .await
    .map_err(|e| eyre!("Failed to bind {}: {}", addr, e))?;

  let served = server::serve(listener, router).await;
  sweeper.abort();

  if let Err(e) = store.close().await {
    tracing::warn!(error = %e, "Failed to close cache store");
  }

  served
}
