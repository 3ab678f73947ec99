//! Tracing subscriber setup for the gateway binary.
//!
//! `serve` is long-running and keeps a JSON log on disk next to the console
//! output. The one-shot subcommands (`send`, `proof`, `verify`) print their
//! result on stdout, so they only log warnings to stderr unless `RUST_LOG`
//! asks for more.
//!
//! Nothing in the crate passes app secrets, page tokens or proofs to a log
//! macro.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Base name of the rotated log file under the logs directory.
pub const LOG_FILE_NAME: &str = "messenger-gateway.log";

/// Keeps the background log writer of [`init_production`] alive.
///
/// Hold it for the lifetime of the server; buffered lines are flushed when it
/// is dropped.
pub struct LoggingGuard {
    _writer: WorkerGuard,
}

/// `RUST_LOG` if set and valid, otherwise `default`.
fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install logging for `serve`: JSON lines in `{logs_dir}/messenger-gateway.log.<date>`
/// (rotated daily) and plain text on stderr, both at `info` by default.
///
/// # Errors
///
/// Fails when `logs_dir` cannot be created or another global subscriber was
/// installed first.
pub fn init_production(logs_dir: &Path) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create logs directory {}", logs_dir.display()))?;

    let (file_writer, writer_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, LOG_FILE_NAME));

    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(file_writer),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("failed to install log subscriber")?;

    Ok(LoggingGuard {
        _writer: writer_guard,
    })
}

/// Install stderr logging for the one-shot subcommands, `warn` by default.
///
/// A subscriber that is already installed is left in place.
pub fn init_cli() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(std::io::stderr)
        .try_init();
}
