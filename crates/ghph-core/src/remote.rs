//! Capability interface the reconciliation engine needs from the remote
//! issue tracker.
//!
//! The engine only ever talks to a [`RemoteBackend`]; the GitHub client in
//! [`crate::github`] is one implementation and scripted doubles in tests are
//! another. Every method performs a single remote operation, is attempted
//! exactly once, and reports absence in idempotency lookups as `None` rather
//! than an error.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::{error::Result, models::RepoRef};

/// Opaque global node id of a remote object (repository, issue, label,
/// user, board, board item, field).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The board's single-select "Status" field and its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusField {
    pub field_id: NodeId,
    /// Option name to option id
    pub options: HashMap<String, String>,
}

impl StatusField {
    /// Looks up an option id by exact, case-sensitive name.
    pub fn option_id(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }
}

/// Milestone fields sent when a milestone has to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneSpec<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub due_on: Option<Date>,
}

/// An issue found by title lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef {
    pub number: u64,
    pub node_id: NodeId,
}

/// Input for creating an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub repository_id: NodeId,
    pub title: String,
    pub body: String,
    pub milestone_id: Option<NodeId>,
    pub label_ids: Vec<NodeId>,
    pub assignee_ids: Vec<NodeId>,
}

/// An issue returned by a create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub id: NodeId,
    pub number: u64,
    pub url: String,
}

/// Input for setting the status of a board item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate<'a> {
    pub board_id: &'a NodeId,
    pub item_id: &'a NodeId,
    pub field_id: &'a NodeId,
    pub option_id: &'a str,
}

/// Atomic remote operations consumed by the reconciliation engine.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Resolves a repository to its node id.
    ///
    /// Fails with `ProjectError::NotFound` if the repository does not exist
    /// or is inaccessible.
    async fn resolve_repository(&self, repo: &RepoRef) -> Result<NodeId>;

    /// Finds a board by exact title among the boards owned by `owner`,
    /// searching the user scope then the organization scope.
    async fn resolve_board(&self, owner: &str, title: &str) -> Result<NodeId>;

    /// Fetches the board's single-select field named exactly "Status".
    async fn resolve_status_field(&self, board_id: &NodeId) -> Result<StatusField>;

    /// Returns the node id of the milestone with this exact title, creating
    /// it when absent.
    async fn get_or_create_milestone(
        &self,
        repo: &RepoRef,
        milestone: &MilestoneSpec<'_>,
    ) -> Result<NodeId>;

    /// Finds an open issue whose title matches exactly.
    async fn find_issue_by_title(&self, repo: &RepoRef, title: &str) -> Result<Option<IssueRef>>;

    /// Returns the node id of the label with this exact name, creating it
    /// only when the lookup reports it missing.
    async fn get_or_create_label(&self, repo: &RepoRef, name: &str) -> Result<NodeId>;

    /// Resolves an account login to its node id.
    async fn resolve_user(&self, login: &str) -> Result<NodeId>;

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue>;

    /// Adds an issue to a board, returning the board item id.
    async fn add_to_board(&self, board_id: &NodeId, content_id: &NodeId) -> Result<NodeId>;

    async fn set_status(&self, update: &StatusUpdate<'_>) -> Result<()>;
}
