//! Logging setup
//!
//! Stderr output is always on. With `--debug` (or a configured log directory)
//! a daily-rotated file under `~/.chatrelay/logs` is added as well. Debug mode
//! also drops the default filter to `debug`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "chatrelay.log";

/// Logging options collected from the CLI, config and environment.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub debug_mode: bool,
    pub file_logging: bool,
    pub level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self {
            debug_mode: false,
            file_logging: false,
            level: "info".to_string(),
            log_dir: None,
        }
    }

    pub fn with_debug_mode(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        self
    }

    pub fn with_file_logging(mut self, enabled: bool) -> Self {
        self.file_logging = enabled;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = Some(dir);
        self
    }

    /// Directive used when `RUST_LOG` is not set.
    fn default_directive(&self) -> &str {
        if self.debug_mode { "debug" } else { self.level.as_str() }
    }

    fn writes_files(&self) -> bool {
        self.debug_mode || self.file_logging
    }

    fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(default_log_dir)
    }
}

/// `~/.chatrelay/logs`
pub fn default_log_dir() -> PathBuf {
    crate::config::chatrelay_home().join("logs")
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the process. It is `None` when no file is written.
pub fn init_logging(config: LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.default_directive()))
        .context("Invalid log filter")?;

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = if config.writes_files() {
        let dir = config.resolved_log_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

        let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Logging already initialized")?;

    if config.writes_files() {
        tracing::info!(
            "Logging to {}",
            config.resolved_log_dir().display()
        );
    }

    Ok(guard)
}

/// Delete rotated log files older than `days` from the directory `config`
/// writes to. Nothing is touched when file logging is off.
pub fn cleanup_old_logs(config: &LogConfig, days: u64) -> Result<usize> {
    if !config.writes_files() {
        return Ok(0);
    }
    cleanup_old_logs_in(&config.resolved_log_dir(), days)
}

/// Delete rotated log files in `dir` last modified more than `days` ago.
/// Returns how many files were removed. A missing directory is not an error.
pub fn cleanup_old_logs_in(dir: &Path, days: u64) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let cutoff = SystemTime::now()
        .checked_sub(Duration::from_secs(days.saturating_mul(24 * 60 * 60)))
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut removed = 0;
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read log directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX));
        if !is_log || !path.is_file() {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        if modified < cutoff {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            removed += 1;
        }
    }

    Ok(removed)
}
