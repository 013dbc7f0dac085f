//! Streaming gzip decoder with first-class input counters.

use std::io::{self, BufRead, Read};

use flate2::bufread::GzDecoder;

use super::counting::CountingReader;
use crate::accountant::{CompressedInput, GZIP_MAGIC};

enum Stage<R> {
    /// Decoding one member; flate2 handles its header, body and trailer.
    Member(GzDecoder<CountingReader<R>>),
    /// All members decoded and any trailing data drained.
    Done(CountingReader<R>),
}

/// What follows a finished member.
enum Next {
    End,
    Member,
    Trailing,
}

/// Decompresses a (possibly multi-member) gzip stream from `R`.
///
/// Each member is decoded by `flate2::bufread::GzDecoder`, which never reads
/// past the member trailer, so the bytes it pulls through the counting
/// adapter are exactly the compressed input consumed. Non-gzip data after the
/// last member is read to the end and discarded, so it still counts as
/// consumed.
pub struct GzipReader<R> {
    stage: Option<Stage<R>>,
    payload_offset: Option<u64>,
    members: u32,
}

impl<R: BufRead> GzipReader<R> {
    pub fn new(inner: R) -> Self {
        let decoder = GzDecoder::new(CountingReader::new(inner));
        let mut reader = Self {
            stage: None,
            payload_offset: None,
            members: 1,
        };
        reader.note_header(&decoder);
        reader.stage = Some(Stage::Member(decoder));
        reader
    }

    /// Number of members started so far.
    pub fn members(&self) -> u32 {
        self.members
    }

    fn input(&self) -> Option<&CountingReader<R>> {
        match self.stage.as_ref()? {
            Stage::Member(decoder) => Some(decoder.get_ref()),
            Stage::Done(input) => Some(input),
        }
    }

    fn consumed(&self) -> u64 {
        self.input().map_or(0, CountingReader::consumed)
    }

    /// The first header ends where the input stood when flate2 finished parsing it.
    fn note_header(&mut self, decoder: &GzDecoder<CountingReader<R>>) {
        if self.payload_offset.is_none() && decoder.header().is_some() {
            let offset = decoder.get_ref().consumed();
            tracing::debug!(header_len = offset, "gzip member 1 header");
            self.payload_offset = Some(offset);
        }
    }

    fn peek_next(input: &mut CountingReader<R>) -> io::Result<Next> {
        let rest = input.fill_buf()?;
        Ok(if rest.is_empty() {
            Next::End
        } else if rest.starts_with(&GZIP_MAGIC) {
            Next::Member
        } else {
            Next::Trailing
        })
    }

    /// Decide what follows a finished member.
    fn advance_member(&mut self, mut input: CountingReader<R>) -> io::Result<()> {
        let next = match Self::peek_next(&mut input) {
            Ok(next) => next,
            Err(e) => {
                self.stage = Some(Stage::Done(input));
                return Err(e);
            }
        };
        match next {
            Next::End => self.stage = Some(Stage::Done(input)),
            Next::Member => {
                self.members += 1;
                tracing::debug!(member = self.members, "gzip member header");
                self.stage = Some(Stage::Member(GzDecoder::new(input)));
            }
            Next::Trailing => {
                let offset = input.consumed();
                let skipped = io::copy(&mut input, &mut io::sink());
                self.stage = Some(Stage::Done(input));
                let skipped = skipped?;
                tracing::warn!(offset, skipped, "trailing garbage after gzip data ignored");
            }
        }
        Ok(())
    }
}

impl<R: BufRead> Read for GzipReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.stage.take() {
                Some(Stage::Member(mut decoder)) => {
                    let result = decoder.read(buf);
                    self.note_header(&decoder);
                    match result {
                        Ok(0) if !buf.is_empty() => self.advance_member(decoder.into_inner())?,
                        Ok(n) => {
                            self.stage = Some(Stage::Member(decoder));
                            return Ok(n);
                        }
                        Err(e) => {
                            self.stage = Some(Stage::Member(decoder));
                            return Err(e);
                        }
                    }
                }
                Some(done @ Stage::Done(_)) => {
                    self.stage = Some(done);
                    return Ok(0);
                }
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::Other,
                        "gzip reader used after a failed read",
                    ))
                }
            }
        }
    }
}

impl<R: BufRead> CompressedInput for GzipReader<R> {
    fn payload_offset(&self) -> u64 {
        self.payload_offset.unwrap_or(0)
    }

    fn compressed_in(&self) -> u64 {
        self.consumed() - self.payload_offset()
    }
}
