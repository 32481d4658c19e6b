#![warn(missing_docs)]
// Allow pedantic strict lints that create false positives in this codebase
#![allow(clippy::arithmetic_side_effects)] // Entry counters cannot realistically overflow

//! # Tripwire - File-Integrity Snapshot and Diff
//!
//! Tripwire walks one or more directory trees, fingerprints every regular
//! file and compares the result with the catalog saved by the previous run.
//! Every path ends up new, modified, deleted or unchanged, and the run hands a
//! structured report to whoever delivers it.
//!
//! ## Architecture
//!
//! - [`scanner`]: exclusion rules, advisories and the tree walker
//! - [`utils::hash`]: xxHash3-128 content fingerprints
//! - [`storage`]: the catalog type, its on-disk store and the unreadable-files log
//! - [`diff`]: pure catalog comparison and run classification
//! - [`run`]: the orchestrator tying one run together
//! - [`report`]: text and JSON rendering of a run report
//! - [`config`]: TOML configuration, parsing and validation
//!
//! ## Example Usage
//!
//! ```no_run
//! use tripwire::TripwireContext;
//! use tripwire::run::{CancelToken, Orchestrator};
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = TripwireContext::new()?;
//! let report = Orchestrator::new(ctx.config.clone())
//!     .with_config_advisories(ctx.advisories.clone())
//!     .run(&CancelToken::new());
//!
//! println!("{}: {} new", report.kind, report.counts.new);
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Configuration parsing, validation, and management.
pub mod config;

/// Catalog comparison and run classification.
pub mod diff;

/// Error taxonomy for the library.
pub mod error;

/// Single-run locking around catalog load and save.
pub mod lock;

/// Terminal output helpers.
pub mod output;

/// Report rendering.
pub mod report;

/// Run orchestration and cancellation.
pub mod run;

/// Exclusion rules, advisories and directory walking.
pub mod scanner;

/// Catalog type and persistence.
pub mod storage;

/// Utility functions and helpers.
pub mod utils;

use anyhow::{Context, Result};
use scanner::Advisory;
use std::path::PathBuf;

/// Current version of the tripwire binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file path relative to home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/tripwire/config.toml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "TRIPWIRE_CONFIG_PATH";

/// Configuration path from `TRIPWIRE_CONFIG_PATH`, else `~/.config/tripwire/config.toml`.
///
/// # Errors
/// Returns an error if the variable is unset and the home directory cannot be
/// determined.
pub fn default_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(DEFAULT_CONFIG_PATH))
}

/// Loaded configuration plus everything noticed while loading it.
#[derive(Debug, Clone)]
pub struct TripwireContext {
    /// Path to the configuration file.
    pub config_path: PathBuf,

    /// Effective configuration (defaults if the file was unusable).
    pub config: config::Config,

    /// Configuration problems, carried into the run report.
    pub advisories: Vec<Advisory>,
}

impl TripwireContext {
    /// Loads the configuration from `TRIPWIRE_CONFIG_PATH` or the default path.
    ///
    /// # Errors
    /// Returns an error if no path is given and the home directory cannot be
    /// determined.
    pub fn new() -> Result<Self> {
        Ok(Self::new_explicit(default_config_path()?))
    }

    /// Loads the configuration from an explicit path.
    ///
    /// Never fails: an unreadable or invalid file falls back to defaults and
    /// the problem is recorded in `advisories`.
    #[must_use]
    pub fn new_explicit(config_path: PathBuf) -> Self {
        let (config, advisories) = config::Config::load_lenient(&config_path);

        if let Err(e) = utils::thread_pool::configure_from_config(&config) {
            tracing::warn!(error = %e, "failed to configure thread pool");
        }

        Self {
            config_path,
            config,
            advisories,
        }
    }
}
