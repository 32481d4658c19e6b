//! Catalog type and its persistence.

/// Catalog persistence (load previous, save current)
pub mod catalog;
/// Append-only log of files that could not be fingerprinted
pub mod unreadable_log;

use crate::utils::hash::Digest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map;
use std::path::{Path, PathBuf};

pub use catalog::{CatalogStore, PreviousCatalog};
pub use unreadable_log::UnreadableLog;

/// Mapping from absolute file path to content digest at one point in time.
///
/// Keys are unique and iteration order carries no meaning. Once handed to the
/// diff engine a catalog is only ever read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: HashMap<PathBuf, Digest>,
}

impl Catalog {
    /// Empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Digest recorded for `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&Digest> {
        self.entries.get(path)
    }

    /// Whether `path` has an entry.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// All keys, in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.keys()
    }

    /// All entries, in no particular order.
    pub fn iter(&self) -> hash_map::Iter<'_, PathBuf, Digest> {
        self.entries.iter()
    }

    /// Entries sorted by path, for listings.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&PathBuf, &Digest)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub(crate) fn insert(&mut self, path: PathBuf, digest: Digest) -> Option<Digest> {
        self.entries.insert(path, digest)
    }

    /// Folds another root's partial catalog into this one.
    pub(crate) fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }
}

impl FromIterator<(PathBuf, Digest)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (PathBuf, Digest)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = (&'a PathBuf, &'a Digest);
    type IntoIter = hash_map::Iter<'a, PathBuf, Digest>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
