//! Error taxonomy for a single transfer.
//!
//! Every variant is fatal; the only non-fatal condition (load information
//! unavailable) is handled inside the load governor and never surfaces here.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::tracker::TrackerState;

#[derive(Debug, Error)]
pub enum ProgressError {
    /// No input path was given.
    #[error("Please supply a filename; for help type \"progress --help\"")]
    MissingArgument,

    #[error("Unable to open file: {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unable to retrieve file size for file: {}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Given file is not a regular one: {}", path.display())]
    NotRegularFile { path: PathBuf },

    /// Compressed input is larger than the decoder's consumed-bytes counter can address.
    #[error("gzip decoder does not support files larger than {limit} bytes ({size} bytes given)")]
    UnsupportedFormat { size: u64, limit: u64 },

    #[error("Error reading from file")]
    Read(#[source] io::Error),

    #[error("Error writing to stdout")]
    Write(#[source] io::Error),

    #[error("Error decompressing gz file: {}", path.display())]
    Decompress {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A tracker operation was attempted outside the `Running` state.
    #[error("progress tracker is {0:?}")]
    NotRunning(TrackerState),
}

impl ProgressError {
    /// Process exit code for this failure class. `0` is reserved for success.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProgressError::MissingArgument => 3,
            ProgressError::Open { .. } => 4,
            ProgressError::Stat { .. } => 5,
            ProgressError::NotRegularFile { .. } => 6,
            ProgressError::Read(_) => 7,
            ProgressError::Write(_) => 8,
            ProgressError::Decompress { .. } => 9,
            ProgressError::UnsupportedFormat { .. } => 10,
            ProgressError::NotRunning(_) => 11,
        }
    }
}
