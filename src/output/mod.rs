//! Terminal output for the tripwire CLI.
//!
//! Routine messages are dimmed, problems are bold, and change lines use the
//! usual added/modified/deleted colors. Everything except the report body goes
//! to stderr so stdout stays clean for `--format json`.

use crate::scanner::{Advisory, AdvisoryKind};
use colored::Colorize;
use std::sync::atomic::{AtomicU8, Ordering};

/// Verbosity level for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Only warnings, errors and the report itself.
    Quiet = 0,
    /// Informational messages too.
    Normal = 1,
    /// Also show debug notes.
    Verbose = 2,
}

static VERBOSITY: AtomicU8 = AtomicU8::new(1);

/// Sets the process-wide verbosity.
pub fn set_verbosity(level: Verbosity) {
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Current process-wide verbosity.
#[must_use]
pub fn get_verbosity() -> Verbosity {
    match VERBOSITY.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        2 => Verbosity::Verbose,
        _ => Verbosity::Normal,
    }
}

/// Prints a success message in green (respects quiet mode).
pub fn success(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{}", message.green());
}

/// Prints an error message in bold red (always shown).
pub fn error(message: &str) {
    eprintln!("{}", message.red().bold());
}

/// Prints a warning message in bold yellow (always shown).
pub fn warning(message: &str) {
    eprintln!("{}", message.yellow().bold());
}

/// Prints an informational message in dimmed color (respects quiet mode).
pub fn info(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{}", message.dimmed());
}

/// Prints a dimmed note, only in verbose mode.
pub fn verbose(message: &str) {
    if get_verbosity() != Verbosity::Verbose {
        return;
    }
    eprintln!("{}", message.dimmed());
}

/// Prints one advisory, colored by how much attention it deserves.
pub fn advisory(advisory: &Advisory) {
    let line = advisory.to_string();
    match advisory.kind {
        AdvisoryKind::Unreadable
        | AdvisoryKind::RootMissing
        | AdvisoryKind::Catalog
        | AdvisoryKind::Configuration => warning(&line),
        AdvisoryKind::Root => info(&line),
        _ => verbose(&line),
    }
}

/// Colors a report line by its change marker.
#[must_use]
pub fn colorize_change(line: &str) -> String {
    if let Some(rest) = line.strip_prefix("+ ") {
        format!("{} {}", "+".green().bold(), rest.green())
    } else if let Some(rest) = line.strip_prefix("~ ") {
        format!("{} {}", "~".yellow().bold(), rest.yellow())
    } else if let Some(rest) = line.strip_prefix("- ") {
        format!("{} {}", "-".red().bold(), rest.red())
    } else {
        line.to_string()
    }
}
