//! CLI for the progress tool: `progress [options] FILE`.

use anyhow::Result;
use clap::Parser;
use progress_core::clock::SystemClock;
use progress_core::config::{self, ProgressConfig};
use progress_core::transfer::{self, TransferOptions};
use progress_core::ProgressError;
use std::io::{self, BufWriter};
use std::path::PathBuf;

/// Output buffer in front of stdout.
const STDOUT_BUFFER_BYTES: usize = 256 * 1024;

/// Reads in a file and outputs progress information on STDERR while it dumps
/// the file to STDOUT. Also works with gzipped files.
#[derive(Debug, Parser)]
#[command(name = "progress", version)]
#[command(about = "cat/zcat with progress information on stderr", long_about = None)]
pub struct Cli {
    /// Output given file as is (no gzip decompression).
    #[arg(short, long)]
    pub raw: bool,

    /// Set cpu load limit (progress will sleep if exceeded).
    #[arg(short, long, value_name = "LOAD")]
    pub max_load: Option<f64>,

    /// Don't display anything before the transfer has been started.
    #[arg(short, long)]
    pub wait: bool,

    /// Read settings from this file instead of the XDG config location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// File to dump.
    pub file: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides on top of the file configuration.
    pub fn merge_into(&self, cfg: &mut ProgressConfig) {
        cfg.raw |= self.raw;
        cfg.wait |= self.wait;
        if let Some(max_load) = self.max_load {
            cfg.set_max_load(max_load);
        }
    }
}

pub fn run_from_args() -> Result<()> {
    let cli = Cli::parse();
    let Some(path) = cli.file.clone() else {
        return Err(ProgressError::MissingArgument.into());
    };

    let mut cfg = match &cli.config {
        Some(p) => config::load_from_path(p)?,
        None => config::load_or_default()?,
    };
    cli.merge_into(&mut cfg);
    tracing::debug!("effective config: {:?}", cfg);

    let opts = TransferOptions::new(path, &cfg);
    let stdout = BufWriter::with_capacity(STDOUT_BUFFER_BYTES, io::stdout().lock());
    let summary = transfer::run(
        &opts,
        cfg.governor(),
        SystemClock::new(),
        stdout,
        io::stderr(),
    )?;
    tracing::info!(
        mode = ?summary.mode,
        bytes_total = summary.bytes_total,
        bytes_written = summary.bytes_written,
        elapsed_secs = summary.elapsed_secs,
        "done"
    );
    Ok(())
}
