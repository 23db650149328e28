//! MCP tool handlers implementation

use std::sync::Arc;

use ghph_core::{apply, params as core, validate_plan, IssueList, RemoteBackend};
use log::{debug, info};
use rmcp::{
    handler::server::tool::Parameters,
    model::{CallToolResult, Content},
    ErrorData,
};
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::errors::{to_mcp_error, tool_failure};

/// Generic MCP wrapper for core parameter types
///
/// Deserializes transparently into the wrapped type and reuses its schema,
/// so core parameter types only need the optional `schema` derive.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct McpParams<T>(T)
where
    T: JsonSchema;

impl<T> JsonSchema for McpParams<T>
where
    T: JsonSchema,
{
    fn schema_name() -> std::borrow::Cow<'static, str> {
        T::schema_name()
    }

    fn json_schema(g: &mut schemars::SchemaGenerator) -> schemars::Schema {
        T::json_schema(g)
    }
}

impl<T> AsRef<T> for McpParams<T>
where
    T: JsonSchema,
{
    fn as_ref(&self) -> &T {
        &self.0
    }
}

pub type ApplyPlan = McpParams<core::ApplyPlan>;
pub type ValidatePlan = McpParams<core::ValidatePlan>;

pub type McpResult = Result<CallToolResult, ErrorData>;

/// Handler implementations for the MCP server
pub struct McpHandlers {
    backend: Arc<dyn RemoteBackend>,
    run_lock: Arc<Mutex<()>>,
    shutdown: CancellationToken,
}

impl McpHandlers {
    pub fn new(
        backend: Arc<dyn RemoteBackend>,
        run_lock: Arc<Mutex<()>>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            backend,
            run_lock,
            shutdown,
        }
    }

    pub async fn apply_project_plan(&self, Parameters(params): Parameters<ApplyPlan>) -> McpResult {
        let params = params.as_ref();
        debug!(
            "apply_project_plan: {} ({}), dry_run={}",
            params.plan.project, params.plan.repository, params.dry_run
        );

        let issues = validate_plan(&params.plan);
        if !issues.is_empty() {
            return Ok(invalid_plan(&issues));
        }

        // Runs against the same repository must not interleave.
        let _running = self.run_lock.lock().await;
        let cancel = self.shutdown.child_token();
        let report = match apply(&cancel, self.backend.as_ref(), &params.plan, params.options())
            .await
        {
            Ok(report) => report,
            Err(e) => return Ok(tool_failure("Failed to apply plan", &e)),
        };
        info!("apply_project_plan finished: {report}");

        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| to_mcp_error("Failed to serialize report", &e))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    pub async fn validate_project_plan(
        &self,
        Parameters(params): Parameters<ValidatePlan>,
    ) -> McpResult {
        let issues = validate_plan(&params.as_ref().plan);
        if issues.is_empty() {
            Ok(CallToolResult::success(vec![Content::text("Plan is valid.")]))
        } else {
            Ok(invalid_plan(&issues))
        }
    }
}

fn invalid_plan(issues: &[ghph_core::ValidationIssue]) -> CallToolResult {
    CallToolResult::error(vec![Content::text(format!(
        "Plan validation failed:\n{}",
        IssueList(issues)
    ))])
}
