//! Catalog comparison.
//!
//! [`diff`] classifies every path of two catalogs as new, modified or deleted.
//! The result sets are ordered collections built from key lookups only, so
//! the outcome does not depend on catalog iteration order.

use crate::storage::Catalog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Classification of paths relative to the previous catalog.
///
/// The three sets are pairwise disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// In current, absent from previous.
    pub new: BTreeSet<PathBuf>,
    /// In both, with different digests.
    pub modified: BTreeSet<PathBuf>,
    /// In previous, absent from current.
    pub deleted: BTreeSet<PathBuf>,
}

impl DiffResult {
    /// True when any path was added, modified or deleted.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.total() > 0
    }

    /// Number of changed paths across all three sets.
    #[must_use]
    pub fn total(&self) -> usize {
        self.new.len() + self.modified.len() + self.deleted.len()
    }

    /// Per-set sizes.
    #[must_use]
    pub fn counts(&self) -> DiffCounts {
        DiffCounts {
            new: self.new.len(),
            modified: self.modified.len(),
            deleted: self.deleted.len(),
        }
    }
}

/// Sizes of the [`DiffResult`] sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffCounts {
    /// New paths.
    pub new: usize,
    /// Modified paths.
    pub modified: usize,
    /// Deleted paths.
    pub deleted: usize,
}

/// Compares two catalogs. Neither input is modified.
///
/// Digests are compared as opaque values.
#[must_use]
pub fn diff(previous: &Catalog, current: &Catalog) -> DiffResult {
    let mut result = DiffResult::default();

    for (path, digest) in current {
        match previous.get(path) {
            None => {
                result.new.insert(path.clone());
            }
            Some(old) if old != digest => {
                result.modified.insert(path.clone());
            }
            Some(_) => {}
        }
    }

    result.deleted = previous
        .paths()
        .filter(|path| !current.contains(path))
        .cloned()
        .collect();

    result
}

/// What kind of run produced a diff; drives reporting and suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunKind {
    /// No usable previous catalog; everything found is new.
    FirstRun,
    /// At least one path is new, modified or deleted.
    ChangesDetected,
    /// Nothing changed since the previous catalog.
    NoChanges,
}

impl RunKind {
    /// An empty previous catalog means there was nothing to compare against.
    #[must_use]
    pub fn classify(previous: &Catalog, diff: &DiffResult) -> Self {
        if previous.is_empty() {
            Self::FirstRun
        } else if diff.changed() {
            Self::ChangesDetected
        } else {
            Self::NoChanges
        }
    }

    /// Kebab-case tag, as in JSON reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstRun => "first-run",
            Self::ChangesDetected => "changes-detected",
            Self::NoChanges => "no-changes",
        }
    }
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hash::{Digest, hash_bytes};

    fn catalog(entries: &[(&str, &str)]) -> Catalog {
        entries
            .iter()
            .map(|(p, content)| (PathBuf::from(p), hash_bytes(content.as_bytes())))
            .collect()
    }

    fn set(paths: &[&str]) -> BTreeSet<PathBuf> {
        paths.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_first_run_everything_new() {
        let previous = Catalog::new();
        let current = catalog(&[("/r/a.txt", "hello"), ("/r/b.txt", "world"), ("/r/sub/c.txt", "x")]);

        let result = diff(&previous, &current);
        assert_eq!(result.new, set(&["/r/a.txt", "/r/b.txt", "/r/sub/c.txt"]));
        assert!(result.modified.is_empty());
        assert!(result.deleted.is_empty());
        assert_eq!(RunKind::classify(&previous, &result), RunKind::FirstRun);
    }

    #[test]
    fn test_new_modified_deleted() {
        let previous = catalog(&[("/r/a.txt", "hello"), ("/r/b.txt", "world"), ("/r/sub/c.txt", "x")]);
        let current = catalog(&[("/r/b.txt", "world2"), ("/r/sub/c.txt", "x"), ("/r/d.txt", "d")]);

        let result = diff(&previous, &current);
        assert_eq!(result.new, set(&["/r/d.txt"]));
        assert_eq!(result.modified, set(&["/r/b.txt"]));
        assert_eq!(result.deleted, set(&["/r/a.txt"]));
        assert!(result.changed());
        assert_eq!(
            result.counts(),
            DiffCounts {
                new: 1,
                modified: 1,
                deleted: 1
            }
        );
        assert_eq!(RunKind::classify(&previous, &result), RunKind::ChangesDetected);
    }

    #[test]
    fn test_identical_catalogs() {
        let previous = catalog(&[("/r/a.txt", "hello")]);
        let current = previous.clone();

        let result = diff(&previous, &current);
        assert!(!result.changed());
        assert_eq!(RunKind::classify(&previous, &result), RunKind::NoChanges);
    }

    #[test]
    fn test_digests_compared_as_opaque_strings() {
        // numerically equal, textually different
        let previous: Catalog = [(PathBuf::from("/r/a"), Digest::from_hex("0a"))]
            .into_iter()
            .collect();
        let current: Catalog = [(PathBuf::from("/r/a"), Digest::from_hex("0A"))]
            .into_iter()
            .collect();

        assert_eq!(diff(&previous, &current).modified, set(&["/r/a"]));
    }

    #[test]
    fn test_everything_deleted() {
        let previous = catalog(&[("/r/a", "1"), ("/r/b", "2")]);
        let result = diff(&previous, &Catalog::new());
        assert_eq!(result.deleted, set(&["/r/a", "/r/b"]));
        assert_eq!(RunKind::classify(&previous, &result), RunKind::ChangesDetected);
    }

    #[test]
    fn test_run_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&RunKind::ChangesDetected).unwrap();
        assert_eq!(json, "\"changes-detected\"");
        assert_eq!(RunKind::FirstRun.to_string(), "first-run");
    }
}
