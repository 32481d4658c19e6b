//! Utility functions and helpers.
//!
//! - Path manipulation (tilde expansion, root normalisation)
//! - Timestamp utilities
//!
//! # Submodules
//!
//! - [`compress`]: zstd helpers for the persisted catalog
//! - [`hash`]: content fingerprinting
//! - [`serialization`]: Binary serialization
//! - [`thread_pool`]: Thread pool configuration
//!
//! # Examples
//!
//! ```
//! use tripwire::utils::{expand_tilde_path, normalize_root};
//! use std::path::Path;
//!
//! let path = expand_tilde_path(Path::new("~/.config/tripwire/config.toml"));
//! assert!(!path.starts_with("~"));
//! assert_eq!(normalize_root("/var/www/"), Path::new("/var/www"));
//! ```

/// Compression utilities (Zstandard)
pub mod compress;
/// Content fingerprinting (xxHash3-128)
pub mod hash;
/// Binary serialization utilities
pub mod serialization;
/// Thread pool configuration for parallel root walks
pub mod thread_pool;

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Expands a leading `~` component to the user's home directory.
#[must_use]
pub fn expand_tilde_path(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest)),
        Err(_) => path.to_path_buf(),
    }
}

/// Strips a single trailing path separator, leaving the filesystem root alone.
#[must_use]
pub fn normalize_root(path: &str) -> PathBuf {
    match path.strip_suffix(['/', MAIN_SEPARATOR]) {
        Some(stripped) if !stripped.is_empty() => PathBuf::from(stripped),
        _ => PathBuf::from(path),
    }
}

/// Returns the current timestamp as seconds since the Unix epoch.
#[must_use]
pub fn get_current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
