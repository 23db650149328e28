//! Outcome of a reconciliation run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Counts and identifiers of what a run created, skipped, or would do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Milestones processed in live mode, whether found or created
    #[serde(rename = "milestones_created")]
    pub milestones_synced: usize,
    pub epics_created: usize,
    pub epics_skipped: usize,
    pub issues_created: usize,
    pub issues_skipped: usize,
    /// URLs of epics created by this run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub epic_urls: Vec<String>,
    /// Failures that did not abort the run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Actions a dry run would have taken
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub planned: Vec<String>,
    #[serde(default)]
    pub dry_run: bool,
}

impl Report {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Markdown rendering with the summary, created epics, warnings and any
    /// dry-run preview.
    pub fn details(&self) -> ReportDetails<'_> {
        ReportDetails { report: self }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Summary: {} milestones synced, {} epics created ({} skipped), {} issues created ({} skipped)",
            self.milestones_synced,
            self.epics_created,
            self.epics_skipped,
            self.issues_created,
            self.issues_skipped
        )
    }
}

/// Markdown view of a [`Report`] for terminal output.
pub struct ReportDetails<'a> {
    report: &'a Report,
}

impl fmt::Display for ReportDetails<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;

        if report.dry_run {
            writeln!(f, "# Dry run")?;
            writeln!(f)?;
            for action in &report.planned {
                writeln!(f, "- {action}")?;
            }
            if !report.planned.is_empty() {
                writeln!(f)?;
            }
        }

        if !report.epic_urls.is_empty() {
            writeln!(f, "## Created epics")?;
            writeln!(f)?;
            for url in &report.epic_urls {
                writeln!(f, "- {url}")?;
            }
            writeln!(f)?;
        }

        if report.has_warnings() {
            writeln!(f, "## Warnings")?;
            writeln!(f)?;
            for warning in &report.warnings {
                writeln!(f, "- {warning}")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "{report}")
    }
}
