//! Tracing subscriber setup: a console layer plus an optional rolling file.

use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `logging.level`. When `logging.directory` is set,
/// events are also written to a daily-rotated file there; the returned guard
/// flushes that file on drop and must live as long as the process.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
  let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

  layers.push(
    fmt::layer()
      .with_target(true)
      .with_filter(filter(&config.level))
      .boxed(),
  );

  let guard = match &config.directory {
    Some(dir) => {
      std::fs::create_dir_all(dir)
        .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

      let appender = RollingFileAppender::new(Rotation::DAILY, dir, &config.file_name);
      let (writer, guard) = tracing_appender::non_blocking(appender);
      layers.push(
        fmt::layer()
          .with_ansi(false)
          .with_writer(writer)
          .with_filter(filter(&config.level))
          .boxed(),
      );
      Some(guard)
    }
    None => None,
  };

  tracing_subscriber::registry()
    .with(layers)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}

fn filter(default_level: &str) -> EnvFilter {
  EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
