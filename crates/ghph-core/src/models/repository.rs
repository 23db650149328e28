//! Repository reference parsing.

use std::fmt;
use std::str::FromStr;

use crate::error::ProjectError;

/// Owner and name of a repository, parsed from `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl FromStr for RepoRef {
    type Err = ProjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ProjectError::invalid_input("repository")
                .with_reason(format!("invalid repository format: {s:?} (expected owner/repo)"))
        };

        let (owner, name) = s.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self::new(owner, name))
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
