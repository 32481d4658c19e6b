//! Command-line interface definitions for tripwire.
//!
//! Shared between the binary and `xtask`, which renders man pages from them.

#![allow(missing_docs)]

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tripwire",
    version = crate::VERSION,
    about = "Fingerprint directory trees and report what changed since the last run",
    long_about = "Walks the configured roots, fingerprints every regular file with xxHash3 \
                  and compares the result with the catalog saved by the previous run"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show verbose output and debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file to use
    #[arg(short, long, global = true, env = "TRIPWIRE_CONFIG_PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan, compare with the previous catalog and print the report
    Run {
        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,

        /// Scan and compare without saving the catalog
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Print nothing when no changes were found
        #[arg(long)]
        quiet_unchanged: bool,
    },

    /// List the saved catalog
    Catalog,

    /// Print the effective configuration
    Config {
        /// Write a default configuration file if none exists
        #[arg(long)]
        init: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags_parse() {
        let cli = Cli::try_parse_from(["tripwire", "run", "--format", "json", "--dry-run"]).unwrap();
        match cli.command {
            Commands::Run {
                format,
                dry_run,
                quiet_unchanged,
            } => {
                assert_eq!(format, ReportFormat::Json);
                assert!(dry_run);
                assert!(!quiet_unchanged);
            }
            _ => panic!("expected run"),
        }
    }
}
