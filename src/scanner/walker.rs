//! Recursive walk of one or more roots into a catalog.

use crate::error::{Result, TripwireError};
use crate::run::CancelToken;
use crate::scanner::advisory::{Advisory, AdvisoryKind};
use crate::scanner::exclusion::{ExclusionRules, extension_of};
use crate::storage::Catalog;
use crate::utils::hash::fingerprint;
use crate::utils::{normalize_root, thread_pool};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, span, warn};
use walkdir::WalkDir;

/// Directory handles kept open at once; deeper levels are buffered instead.
const MAX_OPEN_DIRS: usize = 16;

/// Counters for one or more walked roots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Roots that resolved to a directory.
    pub roots: usize,
    /// Directories entered.
    pub directories: usize,
    /// Files fingerprinted.
    pub files: usize,
    /// Entries matched by the exclusion rules.
    pub excluded: usize,
    /// Symbolic links seen and not followed.
    pub symlinks: usize,
    /// Files or directories that could not be read.
    pub unreadable: usize,
    /// Special files, cycles and non-UTF-8 paths.
    pub skipped: usize,
}

impl ScanStats {
    fn absorb(&mut self, other: Self) {
        self.roots += other.roots;
        self.directories += other.directories;
        self.files += other.files;
        self.excluded += other.excluded;
        self.symlinks += other.symlinks;
        self.unreadable += other.unreadable;
        self.skipped += other.skipped;
    }
}

/// Output of a walk: the catalog plus the advisory side channel.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Fingerprints of every readable regular file.
    pub catalog: Catalog,
    /// Visit and skip records, in walk order.
    pub advisories: Vec<Advisory>,
    /// Files and directories that could not be read, for the unreadable-files log.
    pub unreadable: Vec<PathBuf>,
    /// Counters.
    pub stats: ScanStats,
}

impl ScanResult {
    /// Folds a finished root's result into this one.
    pub fn merge(&mut self, other: Self) {
        self.catalog.merge(other.catalog);
        self.advisories.extend(other.advisories);
        self.unreadable.extend(other.unreadable);
        self.stats.absorb(other.stats);
    }

    fn note(&mut self, kind: AdvisoryKind, path: &Path, message: impl Into<String>) {
        self.advisories.push(Advisory::at(kind, path, message));
    }
}

/// Recursively fingerprints every regular file under `root`.
///
/// Symbolic links are recorded and never followed. Excluded entries are
/// recorded and, for directories, not descended into. Full-path exclusions
/// match the canonical path or the path spelled from `root` as given. Files
/// and directories that fail to read are logged and left out of the catalog.
///
/// # Errors
///
/// - `RootNotDirectory` if `root` does not resolve to a directory
/// - `Cancelled` if `cancel` fires mid-walk; the partial result is dropped
pub fn walk(root: &str, rules: &ExclusionRules, cancel: &CancelToken) -> Result<ScanResult> {
    let requested = normalize_root(root);
    let span = span!(Level::DEBUG, "walk", root = %requested.display());
    let _guard = span.enter();

    let root = std::fs::canonicalize(&requested)
        .ok()
        .filter(|p| p.is_dir())
        .ok_or_else(|| TripwireError::RootNotDirectory {
            path: requested.clone(),
        })?;

    let mut result = ScanResult::default();
    result.stats.roots = 1;
    result.note(AdvisoryKind::Root, &root, "checking directory");

    let mut visited = HashSet::new();
    if let Some(id) = std::fs::metadata(&root).ok().and_then(|m| dir_identity(&m)) {
        visited.insert(id);
    }

    let mut entries = WalkDir::new(&root)
        .min_depth(1)
        .follow_links(false)
        .max_open(MAX_OPEN_DIRS)
        .sort_by_file_name()
        .into_iter();

    while let Some(next) = entries.next() {
        if cancel.is_cancelled() {
            debug!("walk cancelled");
            return Err(TripwireError::Cancelled);
        }

        let entry = match next {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().map_or_else(|| root.clone(), Path::to_path_buf);
                warn!(path = %path.display(), error = %err, "unreadable entry");
                result.stats.unreadable += 1;
                result.note(AdvisoryKind::Unreadable, &path, err.to_string());
                result.unreadable.push(path);
                continue;
            }
        };

        let path = entry.path();
        let file_type = entry.file_type();

        let (Some(full_path), Some(basename)) = (path.to_str(), entry.file_name().to_str()) else {
            result.stats.skipped += 1;
            result.note(AdvisoryKind::Unrepresentable, path, "path is not valid UTF-8");
            if file_type.is_dir() {
                entries.skip_current_dir();
            }
            continue;
        };

        if file_type.is_symlink() {
            result.stats.symlinks += 1;
            result.note(AdvisoryKind::Symlink, path, "");
            continue;
        }

        let configured = path
            .strip_prefix(&root)
            .ok()
            .map(|rel| requested.join(rel))
            .filter(|p| p != path);
        let configured_excluded = configured
            .as_deref()
            .and_then(Path::to_str)
            .is_some_and(|p| rules.should_exclude(basename, p, ""));

        if configured_excluded || rules.should_exclude(basename, full_path, extension_of(basename)) {
            result.stats.excluded += 1;
            result.note(AdvisoryKind::Excluded, path, "");
            if file_type.is_dir() {
                entries.skip_current_dir();
            }
            continue;
        }

        if file_type.is_dir() {
            let identity = entry.metadata().ok().and_then(|m| dir_identity(&m));
            if let Some(id) = identity
                && !visited.insert(id)
            {
                warn!(path = %path.display(), "directory already visited, not descending");
                result.stats.skipped += 1;
                result.note(AdvisoryKind::Cycle, path, "directory already visited");
                entries.skip_current_dir();
                continue;
            }
            result.stats.directories += 1;
            result.note(AdvisoryKind::Directory, path, "");
            continue;
        }

        if !file_type.is_file() {
            result.stats.skipped += 1;
            result.note(AdvisoryKind::Special, path, "not a regular file");
            continue;
        }

        result.note(AdvisoryKind::File, path, "");
        match fingerprint(path) {
            Ok(digest) => {
                result.stats.files += 1;
                result.catalog.insert(path.to_path_buf(), digest);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "file unreadable");
                result.stats.unreadable += 1;
                let message = match &err {
                    TripwireError::FileUnreadable { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                result.note(AdvisoryKind::Unreadable, path, message);
                result.unreadable.push(path.to_path_buf());
            }
        }
    }

    debug!(
        files = result.stats.files,
        directories = result.stats.directories,
        "walk complete"
    );
    Ok(result)
}

/// Walks every root and merges the results in the given root order.
///
/// Each root fills its own [`ScanResult`]; merging happens only after all
/// walks finish, so parallel walks never share a catalog. A root that is not
/// a directory becomes a `root-missing` advisory and the remaining roots are
/// still walked.
///
/// # Errors
///
/// Returns `Cancelled` if any walk observed the cancellation signal.
pub fn walk_roots(
    roots: &[String],
    rules: &ExclusionRules,
    cancel: &CancelToken,
    parallel: bool,
) -> Result<ScanResult> {
    let walk_one = |root: &String| walk(root, rules, cancel);

    let partials: Vec<Result<ScanResult>> = if parallel && roots.len() > 1 {
        thread_pool::run_in_pool(|| roots.par_iter().map(walk_one).collect())
    } else {
        roots.iter().map(walk_one).collect()
    };

    let mut merged = ScanResult::default();
    for partial in partials {
        match partial {
            Ok(result) => merged.merge(result),
            Err(TripwireError::RootNotDirectory { path }) => {
                warn!(root = %path.display(), "skipping root");
                merged.advisories.push(Advisory::at(
                    AdvisoryKind::RootMissing,
                    &path,
                    format!("Directory '{}' does not exist.", path.display()),
                ));
            }
            Err(err) => return Err(err),
        }
    }

    Ok(merged)
}

#[cfg(unix)]
fn dir_identity(metadata: &std::fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((metadata.dev(), metadata.ino()))
}

#[cfg(not(unix))]
fn dir_identity(_metadata: &std::fs::Metadata) -> Option<(u64, u64)> {
    None
}
