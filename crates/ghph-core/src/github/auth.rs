//! GitHub token discovery.

use log::debug;
use tokio::process::Command;

use crate::error::{ProjectError, Result};

/// Picks the token to authenticate with.
///
/// A configured token wins; otherwise `GITHUB_TOKEN`, and finally the output
/// of `gh auth token`.
///
/// # Errors
///
/// Returns `ProjectError::Configuration` when no source yields a token.
pub async fn resolve_token(configured: Option<&str>) -> Result<String> {
    if let Some(token) = configured.filter(|t| !t.trim().is_empty()) {
        return Ok(token.trim().to_string());
    }

    if let Some(token) = std::env::var("GITHUB_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
    {
        debug!("Using token from GITHUB_TOKEN");
        return Ok(token.trim().to_string());
    }

    gh_cli_token().await
}

async fn gh_cli_token() -> Result<String> {
    debug!("Asking the gh CLI for a token");
    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .await
        .map_err(|e| ProjectError::Configuration {
            message: format!(
                "GitHub token is required; set --token, GHPH_TOKEN, GITHUB_TOKEN or log in with `gh auth login` ({e})"
            ),
        })?;

    if !output.status.success() {
        return Err(ProjectError::Configuration {
            message: format!(
                "`gh auth token` failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(ProjectError::Configuration {
            message: "`gh auth token` returned an empty token".to_string(),
        });
    }
    Ok(token)
}
