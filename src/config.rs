use clap::ValueEnum;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub server: ServerConfig,
  pub upstream: UpstreamConfig,
  pub cache: CacheConfig,
  pub auth: AuthConfig,
  pub rate_limit: RateLimitConfig,
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host: String,
  pub port: u16,
  /// Origin used for page links instead of the request's Host header
  /// (e.g. "https://countries.example.org")
  pub public_url: Option<String>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host: "0.0.0.0".to_string(),
      port: 3001,
      public_url: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
  /// Base URL of the REST Countries service; `v3.1/all` is joined onto it
  pub base_url: String,
}

impl Default for UpstreamConfig {
  fn default() -> Self {
    Self {
      base_url: "https://restcountries.com/".to_string(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
  /// In-process map, lost on restart
  Memory,
  /// Local SQLite file
  Sqlite,
  /// Shared Redis server
  #[default]
  Redis,
  /// No caching; every request goes upstream
  None,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub backend: CacheBackendKind,
  pub redis_url: String,
  /// Bound on a Redis dial and on each command
  pub redis_timeout_ms: u64,
  /// Defaults to `<data dir>/country-cache/cache.db`
  pub sqlite_path: Option<PathBuf>,
  pub ttl_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      backend: CacheBackendKind::default(),
      redis_url: "redis://127.0.0.1:6379".to_string(),
      redis_timeout_ms: 2000,
      sqlite_path: None,
      ttl_secs: 3600,
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
  /// Bearer token required on the country routes; unset disables the check
  pub token: Option<String>,
}

/// Per-client request budget on the country routes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
  pub enabled: bool,
  /// Requests allowed per client in each window
  pub max_requests: u32,
  pub window_secs: u64,
}

impl Default for RateLimitConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      max_requests: 500,
      window_secs: 600,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Filter used when RUST_LOG is unset
  pub level: String,
  /// Write a daily-rotated log file here in addition to the console
  pub directory: Option<PathBuf>,
  pub file_name: String,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      directory: None,
      file_name: "country-cache.log".to_string(),
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./country-cache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/country-cache/config.yaml
  ///
  /// With no file found the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("country-cache.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("country-cache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  /// Apply `COUNTRY_API`, `PORT`, `CACHE_BACKEND`, `REDIS_URL` and
  /// `COUNTRY_CACHE_TOKEN` from the process environment.
  pub fn apply_env(&mut self) -> Result<()> {
    self.apply_overrides(|name| std::env::var(name).ok())
  }

  /// Apply overrides from `lookup`; empty values are ignored.
  pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = var("COUNTRY_API") {
      self.upstream.base_url = url;
    }
    if let Some(port) = var("PORT") {
      self.server.port = port
        .trim()
        .parse()
        .map_err(|e| eyre!("Invalid PORT {:?}: {}", port, e))?;
    }
    if let Some(backend) = var("CACHE_BACKEND") {
      self.cache.backend = CacheBackendKind::from_str(backend.trim(), true)
        .map_err(|e| eyre!("Invalid CACHE_BACKEND {:?}: {}", backend, e))?;
    }
    if let Some(url) = var("REDIS_URL") {
      self.cache.redis_url = url;
    }
    if let Some(token) = var("COUNTRY_CACHE_TOKEN") {
      self.auth.token = Some(token);
    }
    Ok(())
  }

  /// Socket address to bind.
  pub fn addr(&self) -> Result<SocketAddr> {
    format!("{}:{}", self.server.host, self.server.port)
      .parse()
      .map_err(|e| eyre!("Invalid listen address {}:{}: {}", self.server.host, self.server.port, e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    move |name| vars.get(name).cloned()
  }

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.server.port, 3001);
    assert_eq!(config.upstream.base_url, "https://restcountries.com/");
    assert_eq!(config.cache.backend, CacheBackendKind::Redis);
    assert_eq!(config.cache.ttl_secs, 3600);
    assert!(config.auth.token.is_none());
    assert!(config.rate_limit.enabled);
    assert_eq!(config.rate_limit.max_requests, 500);
    assert_eq!(config.rate_limit.window_secs, 600);
    assert_eq!(config.addr().unwrap().to_string(), "0.0.0.0:3001");
  }

  #[test]
  fn test_partial_yaml_keeps_defaults() {
    let yaml = r#"
server:
  port: 8080
  public_url: https://countries.example.org
cache:
  backend: sqlite
  sqlite_path: /tmp/countries.db
  ttl_secs: 60
rate_limit:
  max_requests: 50
logging:
  level: debug
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(
      config.server.public_url.as_deref(),
      Some("https://countries.example.org")
    );
    assert_eq!(config.cache.backend, CacheBackendKind::Sqlite);
    assert_eq!(config.cache.sqlite_path, Some(PathBuf::from("/tmp/countries.db")));
    assert_eq!(config.cache.ttl_secs, 60);
    assert_eq!(config.cache.redis_url, "redis://127.0.0.1:6379");
    assert_eq!(config.rate_limit.max_requests, 50);
    assert_eq!(config.rate_limit.window_secs, 600);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.file_name, "country-cache.log");
  }

  #[test]
  fn test_unknown_backend_is_rejected() {
    let result: std::result::Result<Config, _> = serde_yaml::from_str("cache:\n  backend: memcached\n");
    assert!(result.is_err());
  }

  #[test]
  fn test_env_overrides() {
    let mut config = Config::default();
    config
      .apply_overrides(lookup(&[
        ("COUNTRY_API", "http://localhost:9000/"),
        ("PORT", "4000"),
        ("CACHE_BACKEND", "Memory"),
        ("REDIS_URL", "redis://cache:6379"),
        ("COUNTRY_CACHE_TOKEN", "s3cret"),
      ]))
      .unwrap();

    assert_eq!(config.upstream.base_url, "http://localhost:9000/");
    assert_eq!(config.server.port, 4000);
    assert_eq!(config.cache.backend, CacheBackendKind::Memory);
    assert_eq!(config.cache.redis_url, "redis://cache:6379");
    assert_eq!(config.auth.token.as_deref(), Some("s3cret"));
  }

  #[test]
  fn test_empty_env_values_are_ignored() {
    let mut config = Config::default();
    config
      .apply_overrides(lookup(&[("PORT", ""), ("COUNTRY_CACHE_TOKEN", "  ")]))
      .unwrap();
    assert_eq!(config.server.port, 3001);
    assert!(config.auth.token.is_none());
  }

  #[test]
  fn test_bad_env_values_fail() {
    let mut config = Config::default();
    assert!(config.apply_overrides(lookup(&[("PORT", "eighty")])).is_err());
    assert!(config
      .apply_overrides(lookup(&[("CACHE_BACKEND", "memcached")]))
      .is_err());
  }

  #[test]
  fn test_missing_explicit_file_is_error() {
    assert!(Config::load(Some(Path::new("/nonexistent/country-cache.yaml"))).is_err());
  }

  #[test]
  fn test_load_explicit_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "upstream:\n  base_url: http://mirror.local/\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.upstream.base_url, "http://mirror.local/");
    assert_eq!(config.server.port, 3001);
  }
}
