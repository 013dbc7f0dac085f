//! Diagnostics for the copy itself, kept apart from the progress lines.
//!
//! stderr belongs to the progress reporter and stdout carries the copied
//! data, so tracing events normally go to
//! `$XDG_STATE_HOME/progress/progress.log`. Only when that file cannot be
//! opened do warnings fall back to stderr.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "progress.log";
/// Transfer internals (member boundaries, accounting, throttling) at debug.
const FILE_FILTER: &str = "info,progress_core=debug,progress=debug";
/// Next to the progress lines only problems are worth printing.
const STDERR_FILTER: &str = "warn";

/// One handle per event onto the shared log file. Events are dropped when the
/// handle cannot be duplicated; they must never land between progress lines.
struct SharedLogFile(File);

enum LogSink {
    File(File),
    Discard,
}

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::File(f) => f.write(buf),
            LogSink::Discard => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::File(f) => f.flush(),
            LogSink::Discard => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for SharedLogFile {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.0.try_clone().map(LogSink::File).unwrap_or(LogSink::Discard)
    }
}

/// `RUST_LOG` wins; otherwise `default`.
fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Create `dir` if needed and open the log inside it for appending.
fn open_log_in(dir: &Path) -> Result<(File, PathBuf)> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;
    Ok((file, path))
}

/// Send tracing events to the per-user log file.
///
/// Errors leave no subscriber installed, so the caller can fall back to
/// [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let state_dir = xdg::BaseDirectories::with_prefix("progress")?.get_state_home();
    let (file, path) = open_log_in(&state_dir)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter_or(FILE_FILTER))
        .with_writer(SharedLogFile(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing::debug!(log = %path.display(), "logging to file");
    Ok(())
}

/// Warnings only, straight to stderr.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_or(STDERR_FILTER))
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}
