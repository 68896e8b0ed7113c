use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{HookError, Result};

const DEFAULT_LOG_FILTER: &str = "info";
const LOG_FILE_PREFIX: &str = "gitlab_webhook";

/// Daily rolling log files under a directory.
pub struct FileLogger {
    log_directory: PathBuf,
    rotation: Rotation,
}

impl FileLogger {
    pub fn new(log_directory: impl Into<PathBuf>) -> Self {
        Self {
            log_directory: log_directory.into(),
            rotation: Rotation::DAILY,
        }
    }

    /// Create the directory and a non-blocking writer into it.
    ///
    /// The returned guard flushes pending lines on drop and must be kept
    /// alive for as long as logging is wanted.
    pub fn setup_file_logging(&self) -> Result<(NonBlocking, WorkerGuard)> {
        std::fs::create_dir_all(&self.log_directory).map_err(|e| {
            HookError::Logging(format!(
                "Failed to create log directory {:?}: {}",
                self.log_directory, e
            ))
        })?;

        let file_appender = RollingFileAppender::builder()
            .rotation(self.rotation.clone())
            .filename_prefix(LOG_FILE_PREFIX)
            .build(&self.log_directory)
            .map_err(|e| HookError::Logging(e.to_string()))?;
        Ok(tracing_appender::non_blocking(file_appender))
    }
}

/// `RUST_LOG` if set and valid, `info` otherwise.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber: console output, plus a file when
/// `log_dir` is given. Call once at startup.
pub fn setup_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let (writer, guard) = FileLogger::new(dir).setup_file_logging()?;
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| HookError::Logging(e.to_string()))?;

    Ok(guard)
}
