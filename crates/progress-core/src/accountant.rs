//! Byte accounting: turns either a raw copy count or the gzip decoder's
//! counters into one monotonically growing "bytes consumed" figure that is
//! comparable to the input file's on-disk size.

use crate::error::ProgressError;

/// First two bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// CRC32 + ISIZE footer of a gzip member.
pub const GZIP_TRAILER_LEN: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Raw,
    Gzip,
}

impl StreamMode {
    /// Decide the mode from the first bytes of the input.
    pub fn detect(prefix: &[u8], force_raw: bool) -> Self {
        if !force_raw && prefix.len() >= 2 && prefix[..2] == GZIP_MAGIC {
            StreamMode::Gzip
        } else {
            StreamMode::Raw
        }
    }
}

/// Counters a decompressor must expose for progress to be measured against
/// the compressed file size.
pub trait CompressedInput {
    /// Largest input size the counters can represent.
    const COUNTER_LIMIT: u64 = u64::MAX;

    /// Offset where the compressed payload starts (size of the stream header).
    fn payload_offset(&self) -> u64;

    /// Compressed bytes consumed past `payload_offset`.
    fn compressed_in(&self) -> u64;

    fn counters(&self) -> StreamCounters {
        StreamCounters::Gzip {
            payload_offset: self.payload_offset(),
            compressed_in: self.compressed_in(),
        }
    }
}

/// Facts about the stream at one point of the copy loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCounters {
    /// Bytes written to the output sink so far.
    Raw { copied: u64 },
    Gzip {
        payload_offset: u64,
        compressed_in: u64,
    },
}

#[derive(Debug, Clone)]
pub struct ByteAccountant {
    mode: StreamMode,
    consumed: u64,
}

impl ByteAccountant {
    pub fn new(mode: StreamMode) -> Self {
        Self { mode, consumed: 0 }
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// Fail up front when `total` is beyond what decoder `I` can count.
    pub fn ensure_supported<I: CompressedInput>(&self, total: u64) -> Result<(), ProgressError> {
        if self.mode == StreamMode::Gzip && total >= I::COUNTER_LIMIT {
            return Err(ProgressError::UnsupportedFormat {
                size: total,
                limit: I::COUNTER_LIMIT,
            });
        }
        Ok(())
    }

    /// Cumulative consumed bytes. Never decreases, whatever the counters say.
    pub fn consumed_bytes(&mut self, counters: StreamCounters) -> u64 {
        let now = match counters {
            StreamCounters::Raw { copied } => copied,
            StreamCounters::Gzip {
                payload_offset,
                compressed_in,
            } => payload_offset.saturating_add(compressed_in),
        };
        debug_assert_eq!(
            matches!(counters, StreamCounters::Gzip { .. }),
            self.mode == StreamMode::Gzip,
            "counters do not match stream mode"
        );
        self.consumed = self.consumed.max(now);
        self.consumed
    }

    /// Like `consumed_bytes`, but returns the growth since the previous call.
    pub fn advance(&mut self, counters: StreamCounters) -> u64 {
        let before = self.consumed;
        self.consumed_bytes(counters) - before
    }
}
