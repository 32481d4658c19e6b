use crate::error::{Result, TripwireError};
use memmap2::MmapOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use xxhash_rust::xxh3::{Xxh3, xxh3_128};

/// Files at or above this size are hashed through a memory map.
pub const MMAP_THRESHOLD: u64 = 1_048_576;

/// Content fingerprint of a file: xxHash3-128 rendered as 32 lowercase hex chars.
///
/// Digests are persisted and compared as opaque strings; there is no ordering
/// between them beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Digest(String);

impl Digest {
    /// Wraps an already-encoded digest string (e.g. one read back from storage).
    #[must_use]
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Hex form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_u128(hash: u128) -> Self {
        Self(format!("{hash:032x}"))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint of an in-memory buffer.
#[must_use]
pub fn hash_bytes(data: &[u8]) -> Digest {
    Digest::from_u128(xxh3_128(data))
}

/// Computes the fingerprint of the file at `path`.
///
/// Any read failure (permission denied, vanished file, device error) is
/// reported as [`TripwireError::FileUnreadable`]; the caller keeps the path out
/// of the catalog.
///
/// # Errors
///
/// Returns `FileUnreadable` if the file cannot be opened or read.
pub fn fingerprint(path: &Path) -> Result<Digest> {
    let unreadable = |source: std::io::Error| TripwireError::FileUnreadable {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(unreadable)?;
    let len = file.metadata().map_err(unreadable)?.len();

    if len == 0 {
        return Ok(hash_bytes(b""));
    }

    if len < MMAP_THRESHOLD {
        hash_reader(file).map_err(unreadable)
    } else {
        // SAFETY: the map is read-only and dropped before returning. A file
        // truncated underneath us can still raise SIGBUS, same as any mmap reader.
        let mmap = unsafe { MmapOptions::new().map(&file) }.map_err(unreadable)?;
        Ok(hash_bytes(&mmap))
    }
}

/// Streams a reader through xxh3 in 64 KiB chunks.
///
/// # Errors
///
/// Returns the underlying I/O error if a read fails.
pub fn hash_reader<R: Read>(mut reader: R) -> std::io::Result<Digest> {
    let mut hasher = Xxh3::new();
    let mut buffer = vec![0u8; 65536];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(Digest::from_u128(hasher.digest128()))
}
