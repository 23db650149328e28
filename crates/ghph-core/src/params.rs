//! Parameter structures for ghph operations.
//!
//! These are shared by the interfaces (CLI and MCP) that drive the engine.
//! Interface layers wrap them to add framework-specific derives and convert
//! into them before calling into the core.

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{engine::ApplyOptions, models::Plan};

/// Parameters for applying a plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ApplyPlan {
    /// The plan document
    #[serde(flatten)]
    pub plan: Plan,

    /// Preview the changes without mutating anything remotely
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplyPlan {
    pub fn options(&self) -> ApplyOptions {
        ApplyOptions {
            dry_run: self.dry_run,
        }
    }
}

/// Parameters for validating a plan without applying it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ValidatePlan {
    /// The plan document
    #[serde(flatten)]
    pub plan: Plan,
}
