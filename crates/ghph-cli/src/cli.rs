//! Command handlers for the ghph CLI.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ghph_core::{
    apply, load_plan, validate_plan, Config, ConfigBuilder, GitHubClient, IssueList, Plan,
};
use log::{info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    args::{ApplyArgs, ValidateArgs},
    mcp::{run_stdio_server, GhphMcpServer},
    renderer::TerminalRenderer,
};

pub struct Cli {
    config: ConfigBuilder,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(config: ConfigBuilder, renderer: TerminalRenderer) -> Self {
        Self { config, renderer }
    }

    pub async fn apply(&self, args: &ApplyArgs) -> Result<()> {
        let plan = self.load_valid_plan(&args.file)?;
        let client = self.client().await?;

        let (cancel, watcher) = cancel_on_ctrl_c();
        let result = apply(&cancel, &client, &plan, args.into()).await;
        watcher.abort();

        let report = result.context("Failed to apply plan")?;
        self.renderer.render(&report.details().to_string());
        Ok(())
    }

    pub fn validate(&self, args: &ValidateArgs) -> Result<()> {
        self.load_valid_plan(&args.file)?;
        self.renderer.render("Plan is valid.");
        Ok(())
    }

    pub async fn whoami(&self) -> Result<()> {
        let user = self
            .client()
            .await?
            .authenticated_user()
            .await
            .context("Failed to fetch the authenticated user")?;

        let mut markdown = format!("# {}\n\n", user.login);
        if let Some(name) = user.name.filter(|n| !n.is_empty()) {
            markdown.push_str(&format!("- **Name**: {name}\n"));
        }
        if let Some(email) = user.email.filter(|e| !e.is_empty()) {
            markdown.push_str(&format!("- **Email**: {email}\n"));
        }
        self.renderer.render(&markdown);
        Ok(())
    }

    pub async fn serve(&self) -> Result<()> {
        let client = self.client().await?;
        info!("Starting ghph MCP server");
        run_stdio_server(GhphMcpServer::new(Arc::new(client)))
            .await
            .context("MCP server failed")
    }

    pub fn version(&self) {
        let mut text = format!("ghph {}\n", env!("CARGO_PKG_VERSION"));
        if let Some(commit) = option_env!("GHPH_GIT_COMMIT") {
            text.push_str(&format!("commit: {commit}\n"));
        }
        if let Some(date) = option_env!("GHPH_BUILD_DATE") {
            text.push_str(&format!("built: {date}\n"));
        }
        self.renderer.render(&text);
    }

    fn config(&self) -> Result<Config> {
        self.config
            .clone()
            .build()
            .context("Failed to load configuration")
    }

    async fn client(&self) -> Result<GitHubClient> {
        let config = self.config()?;
        GitHubClient::from_config(&config)
            .await
            .context("Failed to create GitHub client")
    }

    /// Loads a plan, printing every validation issue to stderr before failing.
    fn load_valid_plan(&self, path: &std::path::Path) -> Result<Plan> {
        let plan = load_plan(path)
            .with_context(|| format!("Failed to load plan from {}", path.display()))?;

        let issues = validate_plan(&plan);
        if !issues.is_empty() {
            eprint!(
                "Validation failed with {} error(s):\n{}",
                issues.len(),
                IssueList(&issues)
            );
            bail!("plan validation failed with {} error(s)", issues.len());
        }
        Ok(plan)
    }
}

/// Returns a token cancelled on Ctrl-C and the task watching for it.
fn cancel_on_ctrl_c() -> (CancellationToken, JoinHandle<()>) {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling the run");
            token.cancel();
        }
    });
    (cancel, watcher)
}
