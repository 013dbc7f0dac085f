//! Opening and sniffing the input file.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::accountant::StreamMode;
use crate::error::ProgressError;

/// Open `path` and return it with its size. Only regular files are accepted.
pub fn open_input(path: &Path) -> Result<(File, u64), ProgressError> {
    let file = File::open(path).map_err(|source| ProgressError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let meta = file.metadata().map_err(|source| ProgressError::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    if !meta.is_file() {
        return Err(ProgressError::NotRegularFile {
            path: path.to_path_buf(),
        });
    }
    Ok((file, meta.len()))
}

/// Peek at the first two bytes to pick the stream mode, then rewind.
pub fn detect_mode(file: &mut File, force_raw: bool) -> Result<StreamMode, ProgressError> {
    if force_raw {
        return Ok(StreamMode::Raw);
    }
    let mut magic = [0u8; 2];
    let mut filled = 0;
    while filled < magic.len() {
        match file.read(&mut magic[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ProgressError::Read(e)),
        }
    }
    file.seek(SeekFrom::Start(0)).map_err(ProgressError::Read)?;
    let mode = StreamMode::detect(&magic[..filled], false);
    tracing::debug!(?mode, "detected stream mode");
    Ok(mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_input(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ProgressError::Open { .. }));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn directory_is_not_regular() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_input(dir.path()).unwrap_err();
        assert!(matches!(err, ProgressError::NotRegularFile { .. }));
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn detects_and_rewinds() {
        let mut f = tempfile::tempfile().unwrap();
        f.write_all(&[0x1f, 0x8b, 8, 0]).unwrap();
        f.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(detect_mode(&mut f, false).unwrap(), StreamMode::Gzip);
        let mut all = Vec::new();
        f.read_to_end(&mut all).unwrap();
        assert_eq!(all.len(), 4);

        f.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(detect_mode(&mut f, true).unwrap(), StreamMode::Raw);
    }

    #[test]
    fn tiny_files_are_raw() {
        let mut f = tempfile::tempfile().unwrap();
        f.write_all(&[0x1f]).unwrap();
        f.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(detect_mode(&mut f, false).unwrap(), StreamMode::Raw);
    }
}
