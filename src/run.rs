//! Run orchestration: walk, load previous, diff, persist, report.
//!
//! [`Orchestrator::run`] never returns an error. Every problem ends up either
//! as an advisory in the [`RunReport`] or, for the few fatal ones, in its
//! [`RunOutcome`].

use crate::config::Config;
use crate::diff::{DiffCounts, DiffResult, RunKind, diff};
use crate::error::TripwireError;
use crate::lock::RunLock;
use crate::scanner::{Advisory, AdvisoryKind, ScanStats, walk_roots};
use crate::storage::PreviousCatalog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{Level, info, span, warn};

/// Cooperative cancellation flag shared with the walker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Token that has not fired.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; every holder of a clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// The underlying flag, for signal handlers.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

/// Knobs that are not part of the configuration file.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Scan and diff, but never write the catalog or the unreadable log.
    pub dry_run: bool,
    /// How long to wait for another run to release the catalog lock.
    pub lock_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            lock_timeout: Duration::from_secs(30),
        }
    }
}

/// How the run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RunOutcome {
    /// Scan and diff finished. `persisted` tells whether the catalog was rewritten.
    Completed {
        /// Whether the catalog file was rewritten.
        persisted: bool,
    },
    /// Aborted by the cancellation signal; nothing was persisted.
    Cancelled,
    /// A fatal error stopped the run.
    Failed {
        /// Short error tag, see [`TripwireError::kind`].
        kind: String,
        /// Human-readable cause.
        error: String,
    },
}

impl RunOutcome {
    fn failed(err: &TripwireError) -> Self {
        Self::Failed {
            kind: err.kind().to_string(),
            error: err.to_string(),
        }
    }
}

/// Structured result of one run, handed to the reporting collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// First run, changes detected or no changes.
    pub kind: RunKind,
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Changed paths, flattened into `new`/`modified`/`deleted`.
    #[serde(flatten)]
    pub diff: DiffResult,
    /// Sizes of the diff sets.
    pub counts: DiffCounts,
    /// Walk counters.
    pub stats: ScanStats,
    /// Roots walked, after defaulting and tilde expansion.
    pub roots: Vec<String>,
    /// Configuration, walk and catalog advisories in the order raised.
    pub advisories: Vec<Advisory>,
    /// `core.debug` at run time.
    pub debug: bool,
    /// Start of the run; also stamps the unreadable-files log.
    pub started_at: DateTime<Utc>,
    /// End of the run.
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    fn begin(debug: bool) -> Self {
        let now = Utc::now();
        Self {
            kind: RunKind::NoChanges,
            outcome: RunOutcome::Completed { persisted: false },
            diff: DiffResult::default(),
            counts: DiffCounts::default(),
            stats: ScanStats::default(),
            roots: Vec::new(),
            advisories: Vec::new(),
            debug,
            started_at: now,
            finished_at: now,
        }
    }

    fn finish(mut self, outcome: RunOutcome) -> Self {
        self.outcome = outcome;
        self.finished_at = Utc::now();
        self
    }

    /// True when any path changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.diff.changed()
    }

    /// True unless the run failed or was cancelled.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed { .. })
    }

    /// Advisories to show: everything in debug mode, otherwise without
    /// per-entry visit records.
    pub fn visible_advisories(&self) -> impl Iterator<Item = &Advisory> {
        let debug = self.debug;
        self.advisories
            .iter()
            .filter(move |a| debug || !a.kind.is_detail())
    }
}

/// Sequences one complete run over a parsed configuration.
pub struct Orchestrator {
    config: Config,
    config_advisories: Vec<Advisory>,
    options: RunOptions,
}

impl Orchestrator {
    /// Orchestrator for `config` with default [`RunOptions`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            config_advisories: Vec::new(),
            options: RunOptions::default(),
        }
    }

    /// Advisories raised while loading the configuration, carried into the report.
    #[must_use]
    pub fn with_config_advisories(mut self, advisories: Vec<Advisory>) -> Self {
        self.config_advisories = advisories;
        self
    }

    /// Replaces the run options.
    #[must_use]
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Configuration the run uses.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Executes the run. Always returns a report.
    #[must_use]
    pub fn run(&self, cancel: &CancelToken) -> RunReport {
        let span = span!(Level::INFO, "run", dry_run = self.options.dry_run);
        let _guard = span.enter();

        let mut report = RunReport::begin(self.config.core.debug);
        report.advisories.extend(self.config_advisories.iter().cloned());

        let (roots, root_advisories) = self.config.scan.effective_roots();
        report.advisories.extend(root_advisories);
        report.roots.clone_from(&roots);

        let store = self.config.storage.catalog_store();

        let _lock = if self.options.dry_run {
            None
        } else {
            match RunLock::acquire(store.path(), self.options.lock_timeout) {
                Ok(lock) => Some(lock),
                Err(e) => {
                    warn!(error = %e, "could not acquire run lock");
                    report.advisories.push(Advisory::at(
                        AdvisoryKind::Catalog,
                        &RunLock::path_for(store.path()),
                        e.to_string(),
                    ));
                    return report.finish(RunOutcome::failed(&e));
                }
            }
        };

        let rules = self.config.scan.exclusion_rules();
        let scan = match walk_roots(&roots, &rules, cancel, self.config.scan.parallel_roots) {
            Ok(scan) => scan,
            Err(TripwireError::Cancelled) => {
                info!("run cancelled during walk");
                return report.finish(RunOutcome::Cancelled);
            }
            Err(e) => {
                warn!(error = %e, "walk failed");
                return report.finish(RunOutcome::failed(&e));
            }
        };
        report.advisories.extend(scan.advisories);
        report.stats = scan.stats;

        if !self.options.dry_run
            && let Err(e) = self
                .config
                .storage
                .unreadable_log()
                .append(report.started_at, &scan.unreadable)
        {
            warn!(error = %e, "failed to append unreadable log");
            report.advisories.push(Advisory::note(
                AdvisoryKind::Unreadable,
                format!("could not append to unreadable log: {e:#}"),
            ));
        }

        let previous = store.load_previous();
        let previous_loaded = previous.is_loaded();
        match &previous {
            PreviousCatalog::Absent => report.advisories.push(Advisory::at(
                AdvisoryKind::Catalog,
                store.path(),
                "no previous catalog, recording baseline",
            )),
            PreviousCatalog::Corrupt { details } => report.advisories.push(Advisory::at(
                AdvisoryKind::Catalog,
                store.path(),
                format!("previous catalog unusable ({details}), treating as first run"),
            )),
            PreviousCatalog::Loaded(_) => {}
        }
        let previous = previous.into_catalog();

        let current = scan.catalog;
        report.diff = diff(&previous, &current);
        report.counts = report.diff.counts();
        report.kind = RunKind::classify(&previous, &report.diff);

        info!(
            kind = %report.kind,
            new = report.counts.new,
            modified = report.counts.modified,
            deleted = report.counts.deleted,
            "diff complete"
        );

        if cancel.is_cancelled() {
            return report.finish(RunOutcome::Cancelled);
        }

        let should_persist = !previous_loaded || report.diff.changed();
        if !should_persist || self.options.dry_run {
            return report.finish(RunOutcome::Completed { persisted: false });
        }

        match store.save(&current) {
            Ok(()) => report.finish(RunOutcome::Completed { persisted: true }),
            Err(e) => {
                warn!(error = %e, "persisting catalog failed");
                report.advisories.push(Advisory::at(
                    AdvisoryKind::Catalog,
                    store.path(),
                    e.to_string(),
                ));
                report.finish(RunOutcome::failed(&e))
            }
        }
    }
}
