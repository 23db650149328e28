//! MCP server for ghph
//!
//! Exposes plan validation and application as tools so an assistant can
//! turn a plan it drafted into GitHub issues without shelling out.

use std::{future::Future, sync::Arc};

use anyhow::Result;
use ghph_core::RemoteBackend;
use log::{debug, error, info};
use rmcp::{
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use tokio::{
    signal::unix::{signal, SignalKind},
    sync::Mutex,
};
use tokio_util::sync::CancellationToken;

pub mod errors;
pub mod handlers;

pub use handlers::{ApplyPlan, McpResult, ValidatePlan};

/// MCP server for ghph
#[derive(Clone)]
pub struct GhphMcpServer {
    backend: Arc<dyn RemoteBackend>,
    run_lock: Arc<Mutex<()>>,
    shutdown: CancellationToken,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl GhphMcpServer {
    pub fn new(backend: Arc<dyn RemoteBackend>) -> Self {
        Self {
            backend,
            run_lock: Arc::new(Mutex::new(())),
            shutdown: CancellationToken::new(),
            tool_router: Self::tool_router(),
        }
    }

    fn handlers(&self) -> handlers::McpHandlers {
        handlers::McpHandlers::new(
            self.backend.clone(),
            self.run_lock.clone(),
            self.shutdown.clone(),
        )
    }

    #[tool(
        name = "apply_project_plan",
        description = "Create GitHub milestones, epic issues and child issues from a project plan and add them to a Projects V2 board. Provide project (board title), repository (owner/repo), milestones and epics; each epic may set milestone, status, labels, assignees and children. Issues whose exact title already exists are reused, so re-running is safe. Set dry_run=true to preview without changing anything. Returns a JSON report of what was created and skipped."
    )]
    async fn apply_project_plan(&self, params: Parameters<ApplyPlan>) -> McpResult {
        self.handlers().apply_project_plan(params).await
    }

    #[tool(
        name = "validate_project_plan",
        description = "Check a project plan for missing or duplicate titles, malformed repository and due dates, and epics that reference undeclared milestones, without contacting GitHub. Returns 'Plan is valid.' or the list of problems."
    )]
    async fn validate_project_plan(&self, params: Parameters<ValidatePlan>) -> McpResult {
        self.handlers().validate_project_plan(params).await
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for GhphMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "ghph".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(r#"ghph turns a declarative project plan into GitHub issues on a Projects V2 board.

## Plan shape
- `project`: title of the Projects V2 board
- `repository`: `owner/repo`
- `milestones`: `title`, optional `due_on` (YYYY-MM-DD) and `description`
- `epics`: `title`, `body`, optional `milestone` (a declared milestone title), `status` (a board Status option), `labels`, `assignees`, `children` (each with `title`, `body`, `labels`)

## Workflow
1. Draft the plan and check it with `validate_project_plan`
2. Preview with `apply_project_plan` and `dry_run=true`
3. Apply with `apply_project_plan`

Children are created before their epic, whose body gets a `- [ ] #N` tasklist line per child. Existing issues are matched by exact title and reused."#.to_string()),
        }
    }
}

/// Run the MCP server with stdio transport
pub async fn run_stdio_server(server: GhphMcpServer) -> Result<()> {
    use rmcp::{transport::stdio, ServiceExt};

    info!("Starting ghph MCP server on stdio");
    debug!(
        "Server created with {} tools",
        server.tool_router.list_all().len()
    );

    let shutdown = server.shutdown.clone();
    let service = server.serve(stdio()).await.inspect_err(|e| {
        error!("serving error: {e:?}");
    })?;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = service.waiting() => {
            match result {
                Ok(_) => info!("MCP server stopped normally"),
                Err(e) => error!("MCP server error: {e:?}"),
            }
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    shutdown.cancel();
    info!("MCP server shutdown complete");
    Ok(())
}
