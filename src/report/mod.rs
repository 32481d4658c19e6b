//! Rendering of a [`RunReport`] for people and for machines.
//!
//! Delivery is somebody else's job: these functions only turn the report
//! into a subject/body pair or JSON and decide whether it is worth sending.

use crate::config::ReportConfig;
use crate::diff::RunKind;
use crate::run::{RunOutcome, RunReport};
use chrono::SecondsFormat;
use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::PathBuf;

/// A report ready to hand to a mail transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    /// One-line summary.
    pub subject: String,
    /// Change listing and advisories.
    pub body: String,
}

/// Subject line: the configured title plus a one-line summary.
#[must_use]
pub fn subject(report: &RunReport, title: &str) -> String {
    let summary = match &report.outcome {
        RunOutcome::Failed { kind, .. } => format!("run failed ({kind})"),
        RunOutcome::Cancelled => "run cancelled".to_string(),
        RunOutcome::Completed { .. } => match report.kind {
            RunKind::FirstRun => format!("first run, {} files recorded", report.counts.new),
            RunKind::NoChanges => "no changes".to_string(),
            RunKind::ChangesDetected => format!(
                "{} new, {} modified, {} deleted",
                report.counts.new, report.counts.modified, report.counts.deleted
            ),
        },
    };
    format!("{title}: {summary}")
}

/// Plain-text rendering. Per-entry visit records only appear in debug mode.
#[must_use]
pub fn render_text(report: &RunReport, config: &ReportConfig) -> RenderedReport {
    let mut body = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(body, "Run kind: {}", report.kind);
    match &report.outcome {
        RunOutcome::Completed { persisted } => {
            let _ = writeln!(
                body,
                "Catalog: {}",
                if *persisted { "updated" } else { "unchanged" }
            );
        }
        RunOutcome::Cancelled => {
            let _ = writeln!(body, "Status: cancelled, catalog not updated");
        }
        RunOutcome::Failed { error, .. } => {
            let _ = writeln!(body, "Status: failed: {error}");
        }
    }
    if !report.roots.is_empty() {
        let _ = writeln!(body, "Roots: {}", report.roots.join(", "));
    }
    let _ = writeln!(
        body,
        "Started: {}",
        report.started_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    let elapsed = (report.finished_at - report.started_at)
        .to_std()
        .unwrap_or_default();
    let _ = writeln!(
        body,
        "Scanned {} files in {} directories ({})",
        report.stats.files,
        report.stats.directories,
        humantime::format_duration(std::time::Duration::from_millis(
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        ))
    );

    write_section(&mut body, "New", '+', &report.diff.new);
    write_section(&mut body, "Modified", '~', &report.diff.modified);
    write_section(&mut body, "Deleted", '-', &report.diff.deleted);

    let messages: Vec<_> = report.visible_advisories().collect();
    if !messages.is_empty() {
        let _ = writeln!(body, "\nMessages:");
        for advisory in messages {
            let _ = writeln!(body, "{advisory}");
        }
    }

    RenderedReport {
        subject: subject(report, &config.title),
        body,
    }
}

fn write_section(body: &mut String, heading: &str, marker: char, paths: &BTreeSet<PathBuf>) {
    if paths.is_empty() {
        return;
    }
    let _ = writeln!(body, "\n{heading} ({}):", paths.len());
    for path in paths {
        let _ = writeln!(body, "{marker} {}", path.display());
    }
}

/// Serializes the whole report as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(report: &RunReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Whether the report deserves delivery. Quiet runs are dropped unless
/// `send_unchanged` is set; failures are always sent.
#[must_use]
pub fn should_send(report: &RunReport, config: &ReportConfig) -> bool {
    match report.outcome {
        RunOutcome::Failed { .. } => true,
        RunOutcome::Cancelled => false,
        RunOutcome::Completed { .. } => {
            report.kind != RunKind::NoChanges || config.send_unchanged
        }
    }
}
