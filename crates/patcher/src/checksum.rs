//! File checksums compatible with the remote manifests.
//!
//! Manifests carry the IEEE CRC-32 (reflected polynomial `0xEDB88320`, the
//! zlib/PNG checksum). Changing the algorithm makes every local file look
//! stale.

use std::io::Read;
use std::path::Path;

/// Read buffer size for hashing files.
const BUF_SIZE: usize = 64 * 1024;

/// Error returned by [`checksum_file`].
#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    /// The file does not exist; it has to be downloaded.
    #[error("file not found")]
    NotFound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Computes the manifest checksum of the file at `path`.
///
/// Returns [`ChecksumError::NotFound`] when the file is absent so callers
/// can tell a missing file from an unreadable one.
pub fn checksum_file(path: &Path) -> Result<u32, ChecksumError> {
    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(ChecksumError::NotFound),
        Err(e) => return Err(e.into()),
    };

    let mut hasher = crc32fast::Hasher::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}
