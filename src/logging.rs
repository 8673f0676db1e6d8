//! Logging setup.
//!
//! Call sites use the `log` macros; records are forwarded into a
//! `tracing-subscriber` registry. Development mode logs `info` to stderr and
//! to a daily-rotated file. Deployment mode logs only errors to stderr.
//! `RUST_LOG` overrides the level in both modes.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::control::Mode;

/// Prefix of the rotated log files (`magnifier.YYYY-MM-DD.log`).
pub const LOG_FILE_PREFIX: &str = "magnifier";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to create log directory '{}': {source}", dir.display())]
    CreateDir {
        dir: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to open log file: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),

    #[error("Logger already initialized: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Default level filter for a mode.
pub fn default_level(mode: Mode) -> &'static str {
    match mode {
        Mode::Dev => "info",
        Mode::Prod => "error",
    }
}

/// Install the global logger.
///
/// The returned guard flushes the log file when dropped; keep it alive for
/// the whole run.
pub fn init(
    mode: Mode,
    log_dir: &Path,
    max_files: usize,
) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(mode)));
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match mode {
        Mode::Dev => {
            std::fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDir {
                dir: log_dir.to_path_buf(),
                source,
            })?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_FILE_PREFIX)
                .filename_suffix("log")
                .max_log_files(max_files.max(1))
                .build(log_dir)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        Mode::Prod => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()?;

    if mode == Mode::Dev {
        log::info!("Logging to {}", log_dir.display());
    }
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_levels() {
        assert_eq!(default_level(Mode::Dev), "info");
        assert_eq!(default_level(Mode::Prod), "error");
    }
}
