use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

pub struct FileLogGuard {
    _guard: WorkerGuard,
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Logs go to a daily file so they never draw over the terminal UI.
pub fn init_tracing(config: &LoggingConfig) -> Result<FileLogGuard> {
    std::fs::create_dir_all(&config.dir)
        .map_err(|e| anyhow::anyhow!("failed to create log directory {}: {}", config.dir, e))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.dir, "flashdeck.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))?;

    Ok(FileLogGuard { _guard: guard })
}
