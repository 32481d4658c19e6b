//! Exclusion by basename, full path and extension.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Names, full paths and extensions that the walker skips.
///
/// Matching is exact and case-sensitive. An empty rule set excludes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRules {
    names: HashSet<String>,
    extensions: HashSet<String>,
}

impl ExclusionRules {
    /// Builds rules from configured names/paths and extensions.
    ///
    /// Full-path entries lose a single trailing separator so `/var/www/cache/`
    /// matches the walker's `/var/www/cache`. Extensions lose a leading dot.
    pub fn new<N, E>(names: N, extensions: E) -> Self
    where
        N: IntoIterator,
        N::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|n| {
                let n = n.as_ref();
                match n.strip_suffix('/') {
                    Some(stripped) if !stripped.is_empty() => stripped.to_string(),
                    _ => n.to_string(),
                }
            })
            .filter(|n| !n.is_empty())
            .collect();

        let extensions = extensions
            .into_iter()
            .map(|e| {
                let e = e.as_ref();
                e.strip_prefix('.').unwrap_or(e).to_string()
            })
            .filter(|e| !e.is_empty())
            .collect();

        Self { names, extensions }
    }

    /// True when no rule is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.extensions.is_empty()
    }

    /// True if `basename` or `full_path` is an excluded name, or `extension`
    /// is an excluded extension.
    #[must_use]
    pub fn should_exclude(&self, basename: &str, full_path: &str, extension: &str) -> bool {
        self.names.contains(basename)
            || self.names.contains(full_path)
            || (!extension.is_empty() && self.extensions.contains(extension))
    }
}

/// Substring after the final `.` of `basename`, or `""` when there is none.
///
/// `.htaccess` yields `htaccess`; `archive.tar.gz` yields `gz`.
#[must_use]
pub fn extension_of(basename: &str) -> &str {
    basename.rsplit_once('.').map_or("", |(_, ext)| ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rules() -> ExclusionRules {
        ExclusionRules::new(
            [".git", "/var/www/cache/", "error_log"],
            ["log", ".tmp"],
        )
    }

    #[rstest]
    #[case("app.log", "/var/www/app.log", true)]
    #[case("app.LOG", "/var/www/app.LOG", false)]
    #[case("scratch.tmp", "/var/www/scratch.tmp", true)]
    #[case(".git", "/var/www/.git", true)]
    #[case("cache", "/var/www/cache", true)]
    #[case("cache", "/var/www/other/cache", false)]
    #[case("error_log", "/var/www/sub/error_log", true)]
    #[case("index.php", "/var/www/index.php", false)]
    #[case("log", "/var/www/log", false)]
    fn test_should_exclude(#[case] basename: &str, #[case] full: &str, #[case] expected: bool) {
        let rules = rules();
        assert_eq!(
            rules.should_exclude(basename, full, extension_of(basename)),
            expected,
            "{full}"
        );
    }

    #[test]
    fn test_empty_rules_exclude_nothing() {
        let rules = ExclusionRules::default();
        assert!(rules.is_empty());
        assert!(!rules.should_exclude("a.log", "/a.log", "log"));
        assert!(!rules.should_exclude("", "", ""));
    }

    #[rstest]
    #[case("a.txt", "txt")]
    #[case("archive.tar.gz", "gz")]
    #[case(".htaccess", "htaccess")]
    #[case("Makefile", "")]
    #[case("trailing.", "")]
    fn test_extension_of(#[case] basename: &str, #[case] ext: &str) {
        assert_eq!(extension_of(basename), ext);
    }
}
