//! Integration test: run whole transfers over temp files and check both the
//! copied bytes and the exact diagnostic lines.

use std::io::{self, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use progress_core::accountant::StreamMode;
use progress_core::clock::ManualClock;
use progress_core::config::ProgressConfig;
use progress_core::transfer::{self, TransferOptions};
use progress_core::ProgressError;
use tempfile::tempdir;

fn options(path: &Path, label: &str) -> TransferOptions {
    let mut opts = TransferOptions::new(path, &ProgressConfig::default());
    opts.label = label.to_string();
    opts
}

fn lines(diag: &[u8]) -> Vec<String> {
    String::from_utf8(diag.to_vec())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn raw_file_single_chunk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("input.bin");
    let body: Vec<u8> = (0u8..100).cycle().take(1000).collect();
    std::fs::write(&path, &body).unwrap();

    let clock = ManualClock::new();
    let mut out = Vec::new();
    let mut diag = Vec::new();
    let summary = transfer::run(
        &options(&path, "input.bin"),
        None,
        &clock,
        &mut out,
        &mut diag,
    )
    .expect("transfer");

    assert_eq!(out, body);
    assert_eq!(summary.mode, StreamMode::Raw);
    assert_eq!(summary.bytes_written, 1000);
    assert_eq!(summary.final_percent, Some(100.0));
    assert_eq!(
        lines(&diag),
        vec![
            "progress: 00:00 -- input.bin -- starting (1000 bytes)...",
            "progress: 00:00 -- input.bin -- 100.0%",
            "progress: 00:00 -- input.bin -- finished.",
        ]
    );
}

#[test]
fn gzip_file_is_decompressed_and_reaches_hundred() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.sql.gz");
    let body: Vec<u8> = (0..400_000u32).map(|i| (i % 97) as u8 ^ (i / 1000) as u8).collect();
    let gz = gzip(&body);
    std::fs::write(&path, &gz).unwrap();

    let mut opts = options(&path, "dump.sql.gz");
    opts.gzip_buffer_bytes = 4096;
    opts.read_buffer_bytes = 1024;
    let clock = ManualClock::new();
    let mut out = Vec::new();
    let mut diag = Vec::new();
    let summary = transfer::run(&opts, None, &clock, &mut out, &mut diag).expect("transfer");

    assert_eq!(out, body);
    assert_eq!(summary.mode, StreamMode::Gzip);
    assert_eq!(summary.bytes_total, gz.len() as u64);
    assert_eq!(summary.bytes_written, body.len() as u64);
    assert_eq!(summary.final_percent, Some(100.0));

    let diag = lines(&diag);
    assert_eq!(
        diag[0],
        format!("progress: 00:00 -- dump.sql.gz -- starting ({} bytes)...", gz.len())
    );
    let n = diag.len();
    assert_eq!(diag[n - 2], "progress: 00:00 -- dump.sql.gz -- 100.0%");
    assert_eq!(diag[n - 1], "progress: 00:00 -- dump.sql.gz -- finished.");
    assert!(diag.iter().all(|l| !l.ends_with("n/a")));
}

#[test]
fn gzip_with_trailing_padding_reaches_hundred() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("padded.gz");
    let body = vec![b'a'; 10_000];
    let mut gz = gzip(&body);
    gz.extend_from_slice(&[0u8; 64]);
    std::fs::write(&path, &gz).unwrap();

    let clock = ManualClock::new();
    let mut out = Vec::new();
    let mut diag = Vec::new();
    let summary = transfer::run(
        &options(&path, "padded.gz"),
        None,
        &clock,
        &mut out,
        &mut diag,
    )
    .expect("transfer");

    assert_eq!(out, body);
    assert_eq!(summary.mode, StreamMode::Gzip);
    assert_eq!(summary.bytes_consumed, gz.len() as u64);
    assert_eq!(summary.final_percent, Some(100.0));
    let diag = lines(&diag);
    let n = diag.len();
    assert_eq!(diag[n - 2], "progress: 00:00 -- padded.gz -- 100.0%");
    assert_eq!(diag[n - 1], "progress: 00:00 -- padded.gz -- finished.");
}

#[test]
fn raw_flag_copies_gzip_bytes_verbatim() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("keep.gz");
    let gz = gzip(b"left compressed");
    std::fs::write(&path, &gz).unwrap();

    let mut opts = options(&path, "keep.gz");
    opts.raw = true;
    let clock = ManualClock::new();
    let mut out = Vec::new();
    let summary = transfer::run(&opts, None, &clock, &mut out, io::sink()).unwrap();
    assert_eq!(out, gz);
    assert_eq!(summary.mode, StreamMode::Raw);
}

#[test]
fn malformed_gzip_header_is_decompression_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.gz");
    let mut bad = vec![0x1f, 0x8b, 0xff, 0xff];
    bad.extend_from_slice(&[0u8; 64]);
    std::fs::write(&path, &bad).unwrap();

    let clock = ManualClock::new();
    let mut out = Vec::new();
    let mut diag = Vec::new();
    let err = transfer::run(&options(&path, "bad.gz"), None, &clock, &mut out, &mut diag)
        .unwrap_err();
    assert!(matches!(err, ProgressError::Decompress { .. }), "{err:?}");
    assert_eq!(err.exit_code(), 9);
    assert!(out.is_empty());
    assert!(lines(&diag).iter().all(|l| !l.ends_with("finished.")));
}

#[test]
fn corrupt_gzip_body_is_decompression_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corrupt.gz");
    let mut bad = vec![0x1f, 0x8b, 8, 0, 0, 0, 0, 0, 0, 3];
    bad.extend_from_slice(&[0xff; 128]);
    std::fs::write(&path, &bad).unwrap();

    let clock = ManualClock::new();
    let mut diag = Vec::new();
    let err = transfer::run(
        &options(&path, "corrupt.gz"),
        None,
        &clock,
        io::sink(),
        &mut diag,
    )
    .unwrap_err();
    assert_eq!(err.exit_code(), 9);
    assert!(lines(&diag).iter().all(|l| !l.ends_with("finished.")));
}

#[test]
fn empty_file_has_no_progress_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty");
    std::fs::write(&path, b"").unwrap();

    let clock = ManualClock::new();
    let mut diag = Vec::new();
    let summary =
        transfer::run(&options(&path, "empty"), None, &clock, io::sink(), &mut diag).unwrap();
    assert_eq!(summary.final_percent, None);
    assert_eq!(
        lines(&diag),
        vec![
            "progress: 00:00 -- empty -- starting (0 bytes)...",
            "progress: 00:00 -- empty -- finished.",
        ]
    );
}

#[test]
fn wait_option_skips_startup_line() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("quiet");
    std::fs::write(&path, b"abc").unwrap();

    let mut cfg = ProgressConfig::default();
    cfg.wait = true;
    let mut opts = TransferOptions::new(&path, &cfg);
    opts.label = "quiet".to_string();
    let clock = ManualClock::new();
    let mut diag = Vec::new();
    transfer::run(&opts, None, &clock, io::sink(), &mut diag).unwrap();
    assert_eq!(
        lines(&diag),
        vec![
            "progress: 00:00 -- quiet -- 100.0%",
            "progress: 00:00 -- quiet -- finished.",
        ]
    );
}

#[test]
fn missing_file_fails_before_any_output() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new();
    let mut diag = Vec::new();
    let err = transfer::run(
        &options(&dir.path().join("absent"), "absent"),
        None,
        &clock,
        io::sink(),
        &mut diag,
    )
    .unwrap_err();
    assert_eq!(err.exit_code(), 4);
    assert!(diag.is_empty());
}

#[test]
fn write_failure_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data");
    std::fs::write(&path, vec![7u8; 4096]).unwrap();

    let clock = ManualClock::new();
    let mut diag = Vec::new();
    let err = transfer::run(&options(&path, "data"), None, &clock, BrokenPipe, &mut diag)
        .unwrap_err();
    assert!(matches!(err, ProgressError::Write(_)));
    assert_eq!(err.exit_code(), 8);
    assert_eq!(lines(&diag).len(), 1);
}
