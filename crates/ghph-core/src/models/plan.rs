//! Plan document definition.

use jiff::civil::Date;
#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::RepoRef;
use crate::error::{ProjectError, Result};

/// Root of a plan document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Plan {
    /// Display title of the Projects V2 board to link issues to
    #[serde(default)]
    pub project: String,

    /// Target repository in `owner/name` form
    #[serde(default)]
    pub repository: String,

    /// Milestones to sync, in order
    #[serde(default)]
    pub milestones: Vec<Milestone>,

    /// Epics to converge, in order
    #[serde(default)]
    pub epics: Vec<Epic>,
}

impl Plan {
    /// Parses [`Plan::repository`] into its owner and name.
    pub fn repo_ref(&self) -> Result<RepoRef> {
        self.repository.parse()
    }
}

/// A repository milestone, keyed by title.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Milestone {
    /// Milestone title, unique within the plan
    #[serde(default)]
    pub title: String,

    /// Due date as `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_on: Option<String>,

    /// Milestone description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Milestone {
    /// Parses the due date, treating a blank value as absent.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::InvalidInput` when the value is not a
    /// `YYYY-MM-DD` calendar date.
    pub fn due_date(&self) -> Result<Option<Date>> {
        match non_blank(self.due_on.as_deref()) {
            None => Ok(None),
            Some(raw) => Date::strptime("%Y-%m-%d", raw).map(Some).map_err(|e| {
                ProjectError::invalid_input("due_on").with_reason(format!(
                    "milestone {:?} has invalid due date {raw:?}: {e}",
                    self.title
                ))
            }),
        }
    }

    /// Description, treating a blank value as absent.
    pub fn description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }
}

/// A parent issue whose body lists its children as a tasklist.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Epic {
    /// Epic title, unique within the plan
    #[serde(default)]
    pub title: String,

    /// Markdown body placed above the generated tasklist
    #[serde(default)]
    pub body: String,

    /// Title of a milestone declared in the same plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,

    /// Board status option applied to the epic and its children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Label names
    #[serde(default)]
    pub labels: Vec<String>,

    /// Account logins to assign
    #[serde(default)]
    pub assignees: Vec<String>,

    /// Child issues, in tasklist order
    #[serde(default)]
    pub children: Vec<Issue>,
}

impl Epic {
    /// Milestone title, treating a blank value as absent.
    pub fn milestone(&self) -> Option<&str> {
        non_blank(self.milestone.as_deref())
    }

    /// Status option name, treating a blank value as absent.
    pub fn status(&self) -> Option<&str> {
        non_blank(self.status.as_deref())
    }
}

/// A child issue of an epic.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct Issue {
    /// Issue title, unique within the parent epic
    #[serde(default)]
    pub title: String,

    /// Markdown body
    #[serde(default)]
    pub body: String,

    /// Label names
    #[serde(default)]
    pub labels: Vec<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
