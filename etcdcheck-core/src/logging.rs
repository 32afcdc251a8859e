///! Logging configuration module
///! Diagnostics go to stderr (stdout carries the plugin output) and
///! optionally to a JSON log file

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "etcdcheck.log";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,                // log level (trace, debug, info, warn, error)
    pub directory: Option<PathBuf>,   // log file directory
    pub rotation: LogRotation,        // log rotation policy
}

/// Log rotation policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    Daily,
    #[default]
    Never,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            directory: None,
            rotation: LogRotation::Never,
        }
    }
}

impl LoggingConfig {
    /// Initialize logging based on configuration.
    ///
    /// The returned guard flushes the file writer and must be held until exit.
    pub fn init(&self) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
        // RUST_LOG wins over the configured level
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))?;

        let console_layer = fmt::layer()
            .with_target(false)
            .with_level(true)
            .with_ansi(false)
            .with_writer(io::stderr);

        let Some(ref directory) = self.directory else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .try_init()?;
            return Ok(None);
        };

        let file_appender = match self.rotation {
            LogRotation::Hourly => rolling::hourly(directory, LOG_FILE_NAME),
            LogRotation::Daily => rolling::daily(directory, LOG_FILE_NAME),
            LogRotation::Never => rolling::never(directory, LOG_FILE_NAME),
        };
        let (writer, guard) = non_blocking(file_appender);

        let file_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .json()
            .with_writer(writer);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()?;

        tracing::debug!("Logging initialized - level: {}", self.level);
        Ok(Some(guard))
    }
}
