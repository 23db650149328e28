//! Data models for project plans.
//!
//! A [`Plan`] is the declarative input to reconciliation: the board it targets,
//! the repository its issues live in, the milestones to sync, and the epics
//! (each with ordered child issues) to converge. Plans deserialize from YAML
//! or JSON with the field names shown in the crate documentation, and are
//! treated as immutable once a run begins.
//!
//! [`RepoRef`] is the parsed `owner/name` form of [`Plan::repository`].

mod plan;
mod repository;

pub use plan::{Epic, Issue, Milestone, Plan};
pub use repository::RepoRef;
