//! Logging configuration using the tracing ecosystem.
//!
//! This module configures structured logging with:
//! - Human-readable or JSON output
//! - Output to stderr, or to a daily-rotating file
//! - Environment-based log level overrides
//! - Span-based context for async operations
//!
//! The configuration is read once at startup into an immutable [`LogConfig`].

use std::path::{Path, PathBuf};

use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*, Layer, Registry};

/// Default log filter if neither `RUST_LOG` nor a level is given.
pub const DEFAULT_LOG_FILTER: &str = "zentao_client=info,zentao=info,warn";

/// Logging settings, fixed for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive, e.g. `debug` or `zentao_client=trace`.
    pub level: String,
    /// Emit one JSON object per event instead of text.
    pub json: bool,
    /// Write to this file (rotated daily) instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_FILTER.to_string(),
            json: false,
            file: None,
        }
    }
}

/// Build a dispatcher from the configuration without installing it.
///
/// `RUST_LOG`, when set, takes precedence over `config.level`. The returned
/// guard must be kept alive for file output to be flushed.
pub fn build(config: &LogConfig) -> anyhow::Result<(Dispatch, Option<WorkerGuard>)> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    let (writer, guard) = match &config.file {
        Some(path) => {
            let (dir, file_name) = split_log_path(path)?;
            std::fs::create_dir_all(&dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(config.file.is_none())
        .with_target(true)
        .with_thread_ids(true);

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = if config.json {
        fmt_layer.json().with_current_span(true).boxed()
    } else {
        fmt_layer.boxed()
    };

    let subscriber = tracing_subscriber::registry().with(fmt_layer).with(filter);
    Ok((Dispatch::new(subscriber), guard))
}

/// Initialize the global logging system.
///
/// # Errors
///
/// Returns an error if:
/// - The filter directive is invalid
/// - The log directory cannot be created
/// - A global subscriber is already set
pub fn init(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let (dispatch, guard) = build(config)?;
    tracing::dispatcher::set_global_default(dispatch)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), json = config.json, "zentao starting up");
    if let Some(file) = &config.file {
        tracing::debug!(log_file = %file.display(), "Logging to file");
    }

    Ok(guard)
}

/// Split a log file path into its directory and file name.
fn split_log_path(path: &Path) -> anyhow::Result<(PathBuf, String)> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Log file path has no file name: {}", path.display()))?
        .to_string();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, file_name))
}
