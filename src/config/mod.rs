//! TOML configuration: defaults, lenient loading and derived collaborators.

pub mod parser;
pub mod validator;

use crate::error::TripwireError;
use crate::scanner::{Advisory, AdvisoryKind, ExclusionRules};
use crate::storage::{CatalogStore, UnreadableLog};
use crate::utils::expand_tilde_path;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Top-level configuration file layout.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// `[core]` section.
    #[serde(default)]
    pub core: CoreConfig,

    /// `[scan]` section: roots and exclusions.
    #[serde(default)]
    pub scan: ScanConfig,

    /// `[storage]` section: catalog and log locations.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Settings read by the downstream report/mail consumer.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CoreConfig {
    /// Surface per-entry visit records alongside the final report.
    #[serde(default)]
    pub debug: bool,
}

/// `paths` may be written as a single string; the run notes it and carries on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PathList {
    /// `paths = "/var/www"`
    Single(String),
    /// `paths = ["/var/www", "/srv/http"]`
    List(Vec<String>),
}

impl Default for PathList {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl PathList {
    /// Configured roots in order, whichever form was written.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::Single(p) => vec![p.clone()],
            Self::List(paths) => paths.clone(),
        }
    }
}

/// What to walk and what to skip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanConfig {
    /// Roots to walk, in report order.
    #[serde(default)]
    pub paths: PathList,
    /// Root used when `paths` is empty.
    #[serde(default = "default_root")]
    pub default_root: String,
    /// Basenames or full paths to skip; directories are not descended into.
    #[serde(default = "default_exclude_names")]
    pub exclude_names: Vec<String>,
    /// Extensions (text after the last `.`) to skip.
    #[serde(default)]
    pub exclude_extensions: Vec<String>,
    /// Walk multiple roots in parallel.
    #[serde(default = "default_parallel_roots")]
    pub parallel_roots: bool,
    /// Worker threads for parallel root walks; 0 picks a default.
    #[serde(default)]
    pub threads: usize,
}

/// Where run state lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Persisted catalog; the run lock sits beside it.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    /// Append-only log of files that could not be read.
    #[serde(default = "default_unreadable_log")]
    pub unreadable_log: PathBuf,
    /// Zstd level for the catalog file (1-22).
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,
}

/// Report presentation and delivery hints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportConfig {
    /// Subject prefix.
    #[serde(default = "default_title")]
    pub title: String,
    /// Addresses for the delivering collaborator; unused by tripwire itself.
    #[serde(default)]
    pub recipients: Vec<String>,
    /// Deliver a report even when nothing changed.
    #[serde(default)]
    pub send_unchanged: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            paths: PathList::default(),
            default_root: default_root(),
            exclude_names: default_exclude_names(),
            exclude_extensions: Vec::new(),
            parallel_roots: default_parallel_roots(),
            threads: 0,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            unreadable_log: default_unreadable_log(),
            compression_level: default_compression_level(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            recipients: Vec::new(),
            send_unchanged: false,
        }
    }
}

impl ScanConfig {
    /// Roots to walk, falling back to `default_root` when none are configured.
    ///
    /// Misconfiguration is reported as advisories, never as an error.
    #[must_use]
    pub fn effective_roots(&self) -> (Vec<String>, Vec<Advisory>) {
        let mut advisories = Vec::new();

        if let PathList::Single(_) = self.paths {
            advisories.push(Advisory::note(
                AdvisoryKind::Configuration,
                "In config, paths should be an array",
            ));
        }

        let mut roots: Vec<String> = self
            .paths
            .to_vec()
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect();

        if roots.is_empty() {
            advisories.push(Advisory::note(
                AdvisoryKind::Configuration,
                format!(
                    "Paths is empty in the config - falling back to '{}'",
                    self.default_root
                ),
            ));
            roots.push(self.default_root.clone());
        }

        let roots = roots
            .into_iter()
            .map(|r| expand_tilde_path(Path::new(&r)).to_string_lossy().into_owned())
            .collect();

        (roots, advisories)
    }

    /// Exclusion matcher built from the configured names and extensions.
    #[must_use]
    pub fn exclusion_rules(&self) -> ExclusionRules {
        ExclusionRules::new(&self.exclude_names, &self.exclude_extensions)
    }
}

impl StorageConfig {
    /// Store for the configured catalog path.
    #[must_use]
    pub fn catalog_store(&self) -> CatalogStore {
        CatalogStore::new(
            expand_tilde_path(&self.catalog_path),
            self.compression_level,
        )
    }

    /// Log writer for the configured unreadable-files log.
    #[must_use]
    pub fn unreadable_log(&self) -> UnreadableLog {
        UnreadableLog::new(expand_tilde_path(&self.unreadable_log))
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// A missing file is created with defaults first.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories or write the default file
    /// - Cannot read or parse the configuration file
    /// - Configuration file contains invalid TOML
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        parser::parse_config_file(path)
    }

    /// Load configuration without ever failing.
    ///
    /// Parse failures fall back to defaults; every problem found (parse
    /// errors, unknown keys, out-of-range values) is returned as a
    /// `configuration` advisory for the run report.
    #[must_use]
    pub fn load_lenient(path: &Path) -> (Self, Vec<Advisory>) {
        let mut advisories = Vec::new();

        let mut config = match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                let err = TripwireError::ConfigurationInvalid {
                    details: format!("{e:#}"),
                };
                tracing::warn!(path = %path.display(), error = %err, "using default configuration");
                advisories.push(Advisory::at(
                    AdvisoryKind::Configuration,
                    path,
                    format!("{err}; using defaults"),
                ));
                Self::default()
            }
        };

        if let Ok(warnings) = validator::ConfigValidator::new().validate_config_file(path) {
            advisories.extend(
                warnings
                    .into_iter()
                    .map(|w| Advisory::note(AdvisoryKind::Configuration, w)),
            );
        }

        advisories.extend(
            parser::repair(&mut config)
                .into_iter()
                .map(|w| Advisory::note(AdvisoryKind::Configuration, w)),
        );

        (config, advisories)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - TOML serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(toml_str.as_bytes())?;
        Ok(())
    }
}

fn state_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("tripwire")
}

// Default functions for serde
fn default_root() -> String {
    "/var/www".to_string()
}

fn default_exclude_names() -> Vec<String> {
    vec![".git".to_string(), ".svn".to_string()]
}

const fn default_parallel_roots() -> bool {
    true
}

fn default_catalog_path() -> PathBuf {
    state_dir().join("catalog.bin")
}

fn default_unreadable_log() -> PathBuf {
    state_dir().join("unreadable.log")
}

const fn default_compression_level() -> i32 {
    3
}

fn default_title() -> String {
    "Tripwire".to_string()
}
