pub mod config;
pub mod error;
pub mod logging;

// Progress engine
pub mod accountant;
pub mod clock;
pub mod load;
pub mod rate;
pub mod time_format;
pub mod tracker;

// I/O plumbing around the engine
pub mod gzip;
pub mod transfer;

pub use error::ProgressError;
