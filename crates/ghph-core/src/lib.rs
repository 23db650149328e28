//! Core library for ghph, which turns a declarative project plan into GitHub
//! milestones, epic issues, child issues and Projects V2 board items.
//!
//! The crate is split along one seam: the reconciliation [`engine`] only
//! talks to a [`RemoteBackend`], and [`GitHubClient`] is the production
//! implementation of it. Everything else prepares input for the engine
//! ([`loader`], [`validate`], [`config`]) or presents its output
//! ([`report`]).
//!
//! # Quick Start
//!
//! ```no_run
//! use ghph_core::{apply, ApplyOptions, ConfigBuilder, GitHubClient, load_plan};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigBuilder::new().build()?;
//! let client = GitHubClient::from_config(&config).await?;
//!
//! let plan = load_plan("plan.yaml")?;
//! ghph_core::ensure_valid(&plan)?;
//!
//! let report = apply(
//!     &CancellationToken::new(),
//!     &client,
//!     &plan,
//!     ApplyOptions { dry_run: true },
//! )
//! .await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod github;
pub mod loader;
pub mod models;
pub mod params;
pub mod remote;
pub mod report;
pub mod validate;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder};
pub use engine::{apply, compose_epic_body, ApplyOptions};
pub use error::{ProjectError, Result};
pub use github::{AuthenticatedUser, GitHubClient};
pub use loader::{load_plan, parse_plan};
pub use models::{Epic, Issue, Milestone, Plan, RepoRef};
pub use params::{ApplyPlan, ValidatePlan};
pub use remote::RemoteBackend;
pub use report::Report;
pub use validate::{ensure_valid, validate_plan, IssueList, ValidationIssue};
