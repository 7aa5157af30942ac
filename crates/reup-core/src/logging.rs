//! Tracing setup for the `reup` binary.
//!
//! Events go to an append-only log file in the XDG state dir when it can be
//! opened, otherwise to stderr. `RUST_LOG` overrides the default filter.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,reup_core=debug,reup=debug";

/// Where log lines end up.
#[derive(Debug)]
pub enum LogSink {
    File(PathBuf),
    Stderr,
}

/// `~/.local/state/reup/reup.log`.
pub fn default_log_path() -> Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("reup")?;
    Ok(dirs.get_state_home().join("reup.log"))
}

/// Log to the default file. An error leaves no subscriber installed, so the
/// caller can still fall back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    init(LogSink::File(default_log_path()?))
}

/// Log to `path`, appending.
pub fn init_logging_to(path: &Path) -> Result<()> {
    init(LogSink::File(path.to_path_buf()))
}

/// Log to stderr. Does nothing if a subscriber is already installed.
pub fn init_logging_stderr() {
    let _ = init(LogSink::Stderr);
}

/// Install the global subscriber for `sink`.
pub fn init(sink: LogSink) -> Result<()> {
    let writer = match &sink {
        LogSink::File(path) => BoxMakeWriter::new(Mutex::new(open_append(path)?)),
        LogSink::Stderr => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("install log subscriber")?;

    if let LogSink::File(path) = &sink {
        tracing::info!(path = %path.display(), "logging initialized");
    }
    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Open `path` for appending, creating it and its parent directories.
fn open_append(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create log dir: {}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file: {}", path.display()))
}
