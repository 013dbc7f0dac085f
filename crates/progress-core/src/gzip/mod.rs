//! Gzip decoding collaborator.
//!
//! Member framing and inflation come from `flate2`; this module adds the
//! member loop, trailing-data handling and exact counting of consumed input
//! at the `BufRead` boundary.

mod counting;
mod reader;

pub use counting::CountingReader;
pub use reader::GzipReader;
