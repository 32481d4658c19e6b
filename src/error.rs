//! Error taxonomy for the catalog-diff engine.
//!
//! Per-file and per-root errors are recovered by the caller and turned into
//! advisories. Only failures around the state location fail a run outright:
//! [`TripwireError::PersistFailed`], [`TripwireError::Locked`] and an `Io`
//! error while taking the run lock.

use std::path::PathBuf;
use thiserror::Error;

/// Shared `Result` alias for the library core.
pub type Result<T> = std::result::Result<T, TripwireError>;

/// Errors produced by the scanner, the catalog store and the orchestrator.
#[derive(Debug, Error)]
pub enum TripwireError {
    /// Malformed or missing configuration; the run continues with defaults.
    #[error("invalid configuration: {details}")]
    ConfigurationInvalid {
        /// Parser or validation message.
        details: String,
    },

    /// A configured root does not resolve to a directory.
    #[error("directory '{}' does not exist", path.display())]
    RootNotDirectory {
        /// Root as configured.
        path: PathBuf,
    },

    /// A single file could not be fingerprinted.
    #[error("unable to read {}: {source}", path.display())]
    FileUnreadable {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The persisted catalog could not be decoded.
    #[error("catalog {} is corrupt: {details}", path.display())]
    CatalogCorrupt {
        /// Catalog file.
        path: PathBuf,
        /// What failed to decode.
        details: String,
    },

    /// Writing the new catalog failed.
    #[error("failed to persist catalog to {}: {details}", path.display())]
    PersistFailed {
        /// Catalog file.
        path: PathBuf,
        /// Write, sync or rename failure.
        details: String,
    },

    /// Another run holds the catalog lock.
    #[error("another run holds the lock at {}", path.display())]
    Locked {
        /// Lock file.
        path: PathBuf,
    },

    /// The walk was aborted by an external cancellation signal.
    #[error("run cancelled")]
    Cancelled,

    /// Any other I/O failure tied to a path.
    #[error("I/O failure at {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl TripwireError {
    /// Short machine-readable tag, used in JSON reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationInvalid { .. } => "configuration-invalid",
            Self::RootNotDirectory { .. } => "root-not-directory",
            Self::FileUnreadable { .. } => "file-unreadable",
            Self::CatalogCorrupt { .. } => "catalog-corrupt",
            Self::PersistFailed { .. } => "persist-failed",
            Self::Locked { .. } => "locked",
            Self::Cancelled => "cancelled",
            Self::Io { .. } => "io",
        }
    }
}
