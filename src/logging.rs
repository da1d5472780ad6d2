//! Tracing setup. Logs go to a daily rolling file so stdout stays clean for
//! command output.

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::LogConfig;

pub const LOG_ENV: &str = "ORGDASH_LOG";

/// Install the global subscriber. Keep the returned guard alive until exit or
/// buffered lines are lost.
pub fn init_logging(config: &LogConfig) -> Result<WorkerGuard> {
  let filter = EnvFilter::try_from_env(LOG_ENV)
    .or_else(|_| EnvFilter::try_new(&config.level))
    .map_err(|e| eyre!("Invalid log level '{}': {}", config.level, e))?;

  let dir = log_dir(config)?;
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(&dir, "orgdash.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  Registry::default()
    .with(filter)
    .with(
      fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true),
    )
    .try_init()
    .map_err(|e| eyre!("Failed to install log subscriber: {}", e))?;

  info!(dir = %dir.display(), "logging initialized");
  Ok(guard)
}

fn log_dir(config: &LogConfig) -> Result<PathBuf> {
  if let Some(dir) = &config.dir {
    return Ok(dir.clone());
  }
  dirs::data_dir()
    .map(|d| d.join("orgdash").join("logs"))
    .ok_or_else(|| eyre!("Could not determine data directory"))
}
