//! Append-only log of unreadable paths.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only log of files that could not be fingerprinted.
///
/// Each run appends one line per unreadable path:
/// `<rfc3339 run timestamp>\t<path>`.
#[derive(Debug, Clone)]
pub struct UnreadableLog {
    path: PathBuf,
}

impl UnreadableLog {
    /// Log at `path`; nothing is created until the first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `paths` stamped with `run_at`. Nothing is written for an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be opened or written.
    pub fn append(&self, run_at: DateTime<Utc>, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open unreadable log: {}", self.path.display()))?;

        let stamp = run_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut writer = BufWriter::new(file);
        for path in paths {
            writeln!(writer, "{stamp}\t{}", path.display())?;
        }
        writer.flush().context("Failed to flush unreadable log")?;
        Ok(())
    }
}
