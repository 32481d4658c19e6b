//! Reading and repairing configuration files.

use super::Config;
use anyhow::{Context, Result};
use std::path::Path;

/// Zstd accepts levels 1 through 22.
const COMPRESSION_LEVELS: std::ops::RangeInclusive<i32> = 1..=22;

/// Upper bound on configured worker threads.
const MAX_THREADS: usize = 256;

/// Reads and parses a configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config_str(&content)
}

/// Parses configuration text.
///
/// # Errors
///
/// Returns an error if `content` is not valid TOML for [`Config`].
pub fn parse_config_str(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse TOML config")
}

/// Clamps out-of-range values back to something usable and describes each fix.
///
/// The run never aborts on a bad value; the returned messages end up in the
/// report as configuration advisories.
pub fn repair(config: &mut Config) -> Vec<String> {
    let mut fixes = Vec::new();

    let level = config.storage.compression_level;
    if !COMPRESSION_LEVELS.contains(&level) {
        let clamped = level.clamp(*COMPRESSION_LEVELS.start(), *COMPRESSION_LEVELS.end());
        fixes.push(format!(
            "storage.compression_level {level} is outside 1..=22, using {clamped}"
        ));
        config.storage.compression_level = clamped;
    }

    if config.scan.threads > MAX_THREADS {
        fixes.push(format!(
            "scan.threads {} exceeds {MAX_THREADS}, using {MAX_THREADS}",
            config.scan.threads
        ));
        config.scan.threads = MAX_THREADS;
    }

    if config.scan.default_root.trim().is_empty() {
        let fallback = super::ScanConfig::default().default_root;
        fixes.push(format!("scan.default_root is empty, using '{fallback}'"));
        config.scan.default_root = fallback;
    }

    for ext in &config.scan.exclude_extensions {
        if ext.starts_with('.') {
            fixes.push(format!(
                "scan.exclude_extensions entry '{ext}' has a leading dot; matching without it"
            ));
        }
    }

    if config.storage.catalog_path.as_os_str().is_empty() {
        let fallback = super::StorageConfig::default().catalog_path;
        fixes.push(format!(
            "storage.catalog_path is empty, using '{}'",
            fallback.display()
        ));
        config.storage.catalog_path = fallback;
    }

    fixes
}
