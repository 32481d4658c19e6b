//! Advisory side channel: what the walker saw besides catalog entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Tag attached to every advisory message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdvisoryKind {
    /// A configured root is about to be walked.
    Root,
    /// A configured root does not resolve to a directory and was skipped.
    RootMissing,
    /// A directory was entered.
    Directory,
    /// A regular file was visited.
    File,
    /// A symbolic link was seen and left alone.
    Symlink,
    /// An entry matched the exclusion rules.
    Excluded,
    /// A file or directory could not be read.
    Unreadable,
    /// A FIFO, socket or device node was skipped.
    Special,
    /// A directory identity was seen twice (bind mount loop or alias).
    Cycle,
    /// A path that is not valid UTF-8 was skipped.
    Unrepresentable,
    /// Problem with the configuration; defaults were used.
    Configuration,
    /// Note about the persisted catalog (first run, corruption, persistence).
    Catalog,
}

impl AdvisoryKind {
    /// Kebab-case tag, as in JSON reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::RootMissing => "root-missing",
            Self::Directory => "directory",
            Self::File => "file",
            Self::Symlink => "symlink",
            Self::Excluded => "excluded",
            Self::Unreadable => "unreadable",
            Self::Special => "special",
            Self::Cycle => "cycle",
            Self::Unrepresentable => "unrepresentable",
            Self::Configuration => "configuration",
            Self::Catalog => "catalog",
        }
    }

    /// Per-entry visit records, only surfaced in debug reports.
    #[must_use]
    pub const fn is_detail(self) -> bool {
        matches!(self, Self::Directory | Self::File)
    }
}

impl fmt::Display for AdvisoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Informational message about a visited or skipped path.
///
/// Advisories never take part in diffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    /// What happened.
    pub kind: AdvisoryKind,
    /// Path concerned, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Free-form detail; empty when the kind says it all.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Advisory {
    /// Advisory about `path`.
    #[must_use]
    pub fn at(kind: AdvisoryKind, path: &Path, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: Some(path.to_path_buf()),
            message: message.into(),
        }
    }

    /// Advisory not tied to a path.
    #[must_use]
    pub fn note(kind: AdvisoryKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(path) = &self.path {
            write!(f, " {}", path.display())?;
        }
        if !self.message.is_empty() {
            if self.path.is_some() {
                f.write_str(":")?;
            }
            write!(f, " {}", self.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let a = Advisory::at(AdvisoryKind::Symlink, Path::new("/srv/link"), "");
        assert_eq!(a.to_string(), "[symlink] /srv/link");

        let b = Advisory::at(AdvisoryKind::Unreadable, Path::new("/srv/x"), "permission denied");
        assert_eq!(b.to_string(), "[unreadable] /srv/x: permission denied");

        let c = Advisory::note(AdvisoryKind::Catalog, "first run");
        assert_eq!(c.to_string(), "[catalog] first run");
    }

    #[test]
    fn test_detail_kinds() {
        assert!(AdvisoryKind::File.is_detail());
        assert!(AdvisoryKind::Directory.is_detail());
        assert!(!AdvisoryKind::Excluded.is_detail());
        assert!(!AdvisoryKind::Symlink.is_detail());
    }
}
