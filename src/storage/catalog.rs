//! On-disk catalog: zstd-compressed bincode behind a magic header.

use super::Catalog;
use crate::error::{Result, TripwireError};
use crate::utils::{compress, get_current_timestamp, serialization};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Leading bytes of every catalog file; the last byte is the format version.
pub const CATALOG_MAGIC: &[u8; 8] = b"TRIPCAT\x01";

/// Current on-disk layout version.
pub const CATALOG_VERSION: u32 = 1;

/// Decompressed catalogs larger than this are treated as corrupt.
const MAX_CATALOG_BYTES: u64 = 512 * 1024 * 1024;

#[derive(Serialize, Deserialize)]
struct CatalogFile {
    version: u32,
    created_at: i64,
    entries: Catalog,
}

/// Outcome of looking for the previous run's catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviousCatalog {
    /// Nothing persisted yet.
    Absent,
    /// A file exists but could not be decoded. Handled like `Absent`, but the
    /// run records why.
    Corrupt {
        /// Why decoding failed.
        details: String,
    },
    /// The catalog written by the last run that saw changes.
    Loaded(Catalog),
}

impl PreviousCatalog {
    /// Whether a usable catalog was found on disk.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// The catalog to diff against; empty unless one was loaded.
    #[must_use]
    pub fn into_catalog(self) -> Catalog {
        match self {
            Self::Loaded(catalog) => catalog,
            Self::Absent | Self::Corrupt { .. } => Catalog::new(),
        }
    }
}

/// Reads and writes the persisted catalog at a fixed location.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
    compression_level: i32,
}

impl CatalogStore {
    /// Store at `path`, compressing at `compression_level`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, compression_level: i32) -> Self {
        Self {
            path: path.into(),
            compression_level,
        }
    }

    /// Catalog file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the previous catalog, folding every failure into
    /// [`PreviousCatalog::Corrupt`] so the run can continue as a first run.
    #[must_use]
    pub fn load_previous(&self) -> PreviousCatalog {
        match self.load() {
            Ok(Some(catalog)) => {
                debug!(entries = catalog.len(), "loaded previous catalog");
                PreviousCatalog::Loaded(catalog)
            }
            Ok(None) => {
                info!(path = %self.path.display(), "no previous catalog");
                PreviousCatalog::Absent
            }
            Err(err) => {
                warn!(error = %err, "previous catalog unusable, treating as first run");
                PreviousCatalog::Corrupt {
                    details: err.to_string(),
                }
            }
        }
    }

    /// Strict load: `Ok(None)` when no catalog exists.
    ///
    /// # Errors
    ///
    /// - `CatalogCorrupt` if the file does not decode
    /// - `Io` if the file exists but cannot be read
    pub fn load(&self) -> Result<Option<Catalog>> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(TripwireError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        self.decode(&data).map(Some)
    }

    fn decode(&self, data: &[u8]) -> Result<Catalog> {
        let corrupt = |details: String| TripwireError::CatalogCorrupt {
            path: self.path.clone(),
            details,
        };

        let body = data
            .strip_prefix(CATALOG_MAGIC.as_slice())
            .ok_or_else(|| corrupt("missing catalog header".to_string()))?;
        let raw = compress::decompress_bytes_bounded(body, MAX_CATALOG_BYTES)
            .map_err(|e| corrupt(format!("decompression failed: {e}")))?;
        let file: CatalogFile = serialization::deserialize(&raw)
            .map_err(|e| corrupt(format!("decoding failed: {e}")))?;

        if file.version != CATALOG_VERSION {
            return Err(corrupt(format!("unsupported version {}", file.version)));
        }

        Ok(file.entries)
    }

    /// Writes `catalog`, replacing any previous file atomically.
    ///
    /// The data goes to a temporary file beside the target, is synced, then
    /// renamed over it; readers see either the old catalog or the new one.
    ///
    /// # Errors
    ///
    /// Returns `PersistFailed` if any step fails; the previous file is intact.
    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        let failed = |details: String| TripwireError::PersistFailed {
            path: self.path.clone(),
            details,
        };

        let file = CatalogFile {
            version: CATALOG_VERSION,
            created_at: get_current_timestamp(),
            entries: catalog.clone(),
        };
        let raw = serialization::serialize(&file).map_err(|e| failed(e.to_string()))?;
        let compressed = compress::compress_bytes(&raw, self.compression_level)
            .map_err(|e| failed(e.to_string()))?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)
            .map_err(|e| failed(format!("cannot create {}: {e}", parent.display())))?;

        let write = |tmp: &mut NamedTempFile| -> std::io::Result<()> {
            tmp.write_all(CATALOG_MAGIC)?;
            tmp.write_all(&compressed)?;
            tmp.as_file().sync_all()
        };
        let mut tmp = NamedTempFile::new_in(&parent).map_err(|e| failed(e.to_string()))?;
        write(&mut tmp).map_err(|e| failed(e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| failed(e.error.to_string()))?;

        debug!(entries = catalog.len(), path = %self.path.display(), "catalog saved");
        Ok(())
    }
}
