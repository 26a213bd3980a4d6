//! Tracing setup for hosts that do not install their own subscriber.
//!
//! `RUST_LOG` overrides the default level. Both functions are no-ops when a
//! global subscriber is already set, so a host that configures tracing itself
//! keeps its setup.

use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// When set, [`init_logging`] appends to this file instead of stderr.
pub const LOG_PATH_ENV: &str = "DAMAGE_NUMBERS_LOG_PATH";
pub const LOG_FILE_PREFIX: &str = "damage-numbers.log";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open rolling log in {path}: {message}")]
    Appender { path: String, message: String },
}

fn default_level(debug: bool) -> Level {
    if debug { Level::DEBUG } else { Level::INFO }
}

fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level(debug).into())
        .from_env_lossy()
}

/// Log to stderr, or to the file named by [`LOG_PATH_ENV`].
///
/// Returns `false` if another subscriber was already installed.
pub fn init_logging(debug: bool) -> bool {
    let filter = env_filter(debug);

    if let Ok(path) = std::env::var(LOG_PATH_ENV) {
        if let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            return tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(file)
                .try_init()
                .is_ok();
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

/// Log to a daily-rotated file under `dir`.
///
/// Writes go through a background thread; keep the returned guard alive for
/// as long as logging should continue, dropping it flushes the queue.
pub fn init_rolling_logging(dir: &Path, debug: bool) -> Result<WorkerGuard, LoggingError> {
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.display().to_string(),
        source,
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
        .map_err(|e| LoggingError::Appender {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let installed = tracing_subscriber::registry()
        .with(env_filter(debug))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .is_ok();
    if !installed {
        tracing::debug!("Subscriber already installed, rolling log not attached");
    }
    Ok(guard)
}
