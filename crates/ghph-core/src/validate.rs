//! Structural and referential checks on a plan before it is applied.
//!
//! Validation collects every problem instead of stopping at the first, so a
//! plan author can fix a document in one pass. Each [`ValidationIssue`]
//! carries the path of the offending node (`epics[0].children[1]`).

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ProjectError, Result},
    models::{Plan, RepoRef},
};

/// A single problem found in a plan document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Location of the problem, empty for document-level fields
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Checks a plan and returns every issue found, in document order.
pub fn validate_plan(plan: &Plan) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if plan.repository.trim().is_empty() {
        issues.push(ValidationIssue::new("", "repository is required"));
    } else if plan.repository.parse::<RepoRef>().is_err() {
        issues.push(ValidationIssue::new(
            "",
            format!(
                "repository {:?} must be in owner/repo format",
                plan.repository
            ),
        ));
    }

    if plan.project.trim().is_empty() {
        issues.push(ValidationIssue::new("", "project is required"));
    }

    let mut milestone_titles = HashSet::new();
    for (i, milestone) in plan.milestones.iter().enumerate() {
        let path = format!("milestones[{i}]");
        if milestone.title.is_empty() {
            issues.push(ValidationIssue::new(path, "title is required"));
            continue;
        }
        if !milestone_titles.insert(milestone.title.as_str()) {
            issues.push(ValidationIssue::new(
                &path,
                format!("duplicate title {:?}", milestone.title),
            ));
        }
        if let Err(ProjectError::InvalidInput { reason, .. }) = milestone.due_date() {
            issues.push(ValidationIssue::new(path, reason));
        }
    }

    let mut epic_titles = HashSet::new();
    for (i, epic) in plan.epics.iter().enumerate() {
        let path = format!("epics[{i}]");
        if epic.title.is_empty() {
            issues.push(ValidationIssue::new(path, "title is required"));
            continue;
        }
        if !epic_titles.insert(epic.title.as_str()) {
            issues.push(ValidationIssue::new(
                &path,
                format!("duplicate title {:?}", epic.title),
            ));
        }

        if let Some(milestone) = epic.milestone() {
            if !milestone_titles.contains(milestone) {
                issues.push(ValidationIssue::new(
                    &path,
                    format!(
                        "epic {:?}: milestone {milestone:?} is not defined in milestones section",
                        epic.title
                    ),
                ));
            }
        }

        let mut child_titles = HashSet::new();
        for (j, child) in epic.children.iter().enumerate() {
            let child_path = format!("{path}.children[{j}]");
            if child.title.is_empty() {
                issues.push(ValidationIssue::new(child_path, "title is required"));
                continue;
            }
            if !child_titles.insert(child.title.as_str()) {
                issues.push(ValidationIssue::new(
                    child_path,
                    format!("duplicate title {:?}", child.title),
                ));
            }
        }
    }

    issues
}

/// Numbered list of validation issues, one per line.
pub struct IssueList<'a>(pub &'a [ValidationIssue]);

impl fmt::Display for IssueList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            writeln!(f, "{}. {issue}", i + 1)?;
        }
        Ok(())
    }
}

/// Validates a plan, failing with every issue found.
///
/// # Errors
///
/// Returns `ProjectError::Validation` when [`validate_plan`] reports anything.
pub fn ensure_valid(plan: &Plan) -> Result<()> {
    let issues = validate_plan(plan);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ProjectError::Validation { issues })
    }
}
