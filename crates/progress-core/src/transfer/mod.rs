//! The copy loop: read a chunk, write it out, account for it, report.

mod open;

pub use open::{detect_mode, open_input};

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;

use crate::accountant::{ByteAccountant, CompressedInput, StreamCounters, StreamMode};
use crate::clock::Clock;
use crate::config::ProgressConfig;
use crate::error::ProgressError;
use crate::gzip::GzipReader;
use crate::load::LoadGovernor;
use crate::tracker::{ProgressTracker, TrackerSettings};

type FileGzipReader = GzipReader<BufReader<File>>;

#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub path: PathBuf,
    /// Name used in progress lines; defaults to the path as given.
    pub label: String,
    pub raw: bool,
    pub read_buffer_bytes: usize,
    pub gzip_buffer_bytes: usize,
    pub tracker: TrackerSettings,
}

impl TransferOptions {
    pub fn new(path: impl Into<PathBuf>, cfg: &ProgressConfig) -> Self {
        let path = path.into();
        Self {
            label: path.display().to_string(),
            path,
            raw: cfg.raw,
            read_buffer_bytes: cfg.read_buffer_bytes.max(1),
            gzip_buffer_bytes: cfg.gzip_buffer_bytes.max(1),
            tracker: cfg.tracker_settings(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferSummary {
    pub mode: StreamMode,
    pub bytes_total: u64,
    pub bytes_consumed: u64,
    pub bytes_written: u64,
    pub elapsed_secs: u64,
    /// `None` when the input size was unknown.
    pub final_percent: Option<f64>,
}

/// Copy `opts.path` to `out`, reporting progress on `diag`.
pub fn run<C, O, E>(
    opts: &TransferOptions,
    governor: Option<LoadGovernor>,
    clock: C,
    mut out: O,
    diag: E,
) -> Result<TransferSummary, ProgressError>
where
    C: Clock,
    O: Write,
    E: Write,
{
    let (mut file, total) = open_input(&opts.path)?;
    let mode = detect_mode(&mut file, opts.raw)?;

    let mut accountant = ByteAccountant::new(mode);
    accountant.ensure_supported::<FileGzipReader>(total)?;

    let mut tracker =
        ProgressTracker::new(opts.label.clone(), mode, clock, diag).with_settings(opts.tracker.clone());
    if let Some(governor) = governor {
        tracker = tracker.with_governor(governor);
    }
    tracker.start(total)?;

    let copied = match mode {
        StreamMode::Raw => copy_raw(file, opts, &mut out, &mut tracker, &mut accountant),
        StreamMode::Gzip => copy_gzip(file, opts, &mut out, &mut tracker, &mut accountant),
    };
    let bytes_written = match copied {
        Ok(n) => n,
        Err(e) => {
            tracker.fail(&e)?;
            return Err(e);
        }
    };

    let final_percent = tracker.finish()?;
    let state = tracker.transfer();
    Ok(TransferSummary {
        mode,
        bytes_total: total,
        bytes_consumed: state.bytes_consumed,
        bytes_written,
        elapsed_secs: state.elapsed_secs,
        final_percent,
    })
}

fn copy_raw<C: Clock, O: Write, E: Write>(
    mut file: File,
    opts: &TransferOptions,
    out: &mut O,
    tracker: &mut ProgressTracker<C, E>,
    accountant: &mut ByteAccountant,
) -> Result<u64, ProgressError> {
    pump(
        &mut file,
        opts.read_buffer_bytes,
        out,
        tracker,
        accountant,
        |_, copied| StreamCounters::Raw { copied },
        ProgressError::Read,
    )
}

fn copy_gzip<C: Clock, O: Write, E: Write>(
    file: File,
    opts: &TransferOptions,
    out: &mut O,
    tracker: &mut ProgressTracker<C, E>,
    accountant: &mut ByteAccountant,
) -> Result<u64, ProgressError> {
    let decompress = |source: io::Error| {
        if is_data_error(&source) {
            ProgressError::Decompress {
                path: opts.path.clone(),
                source,
            }
        } else {
            ProgressError::Read(source)
        }
    };
    let input = BufReader::with_capacity(opts.read_buffer_bytes, file);
    let mut reader = GzipReader::new(input);
    let written = pump(
        &mut reader,
        opts.gzip_buffer_bytes,
        out,
        tracker,
        accountant,
        |r, _| r.counters(),
        decompress,
    )?;
    tracing::debug!(members = reader.members(), "gzip stream complete");
    Ok(written)
}

fn is_data_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput | io::ErrorKind::UnexpectedEof
    )
}

/// Shared loop for both modes. `counters` turns the reader and bytes copied so
/// far into accounting input; `read_error` classifies read failures.
fn pump<R, C, O, E>(
    reader: &mut R,
    chunk: usize,
    out: &mut O,
    tracker: &mut ProgressTracker<C, E>,
    accountant: &mut ByteAccountant,
    counters: impl Fn(&R, u64) -> StreamCounters,
    read_error: impl Fn(io::Error) -> ProgressError,
) -> Result<u64, ProgressError>
where
    R: Read,
    C: Clock,
    O: Write,
    E: Write,
{
    let mut buf = vec![0u8; chunk];
    let mut copied = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(read_error(e)),
        };
        out.write_all(&buf[..n]).map_err(ProgressError::Write)?;
        copied += n as u64;
        let delta = accountant.advance(counters(reader, copied));
        tracker.report(delta)?;
    }
    out.flush().map_err(ProgressError::Write)?;
    // The final member trailer and any trailing data are consumed by the read
    // that returns 0.
    let tail = accountant.advance(counters(reader, copied));
    if tail > 0 {
        tracker.report(tail)?;
    }
    Ok(copied)
}
