//! Configuration loading.
//!
//! Settings come from, in increasing precedence:
//!
//! 1. a YAML config file (`--config`, or `$XDG_CONFIG_HOME/ghph/config.yaml`
//!    when present),
//! 2. environment variables `GHPH_TOKEN`, `GHPH_API_URL` and
//!    `GHPH_TIMEOUT_SECS`,
//! 3. values set explicitly on the builder (command-line flags).
//!
//! A token left unset after all three is resolved later by the GitHub client
//! from `GITHUB_TOKEN` or the `gh` CLI.

use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::error::{ProjectError, Result};

/// Default GitHub REST endpoint; GraphQL lives at `{api_url}/graphql`.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Personal access token, if configured
    pub token: Option<String>,
    pub api_url: String,
    pub timeout_secs: u64,
    /// Config file that was read, if any
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            source: None,
        }
    }
}

/// On-disk shape of the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    token: Option<String>,
    api_url: Option<String>,
    timeout_secs: Option<u64>,
}

/// Builder for resolving a [`Config`] from file, environment and flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    token: Option<String>,
}

impl ConfigBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an explicit config file. Unlike the default location, an
    /// explicit file must exist.
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.config_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Sets a token that overrides file and environment.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
        self
    }

    /// Resolves the configuration using the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::FileSystem` if an explicit config file cannot
    /// be read, `ProjectError::Yaml` if a config file is malformed, and
    /// `ProjectError::Configuration` for unusable environment values.
    pub fn build(self) -> Result<Config> {
        self.build_with_env(|key| std::env::var(key).ok())
    }

    /// Resolves the configuration reading variables through `env`.
    pub fn build_with_env<F>(self, env: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (file, source) = match self.config_path {
            Some(path) => (Some(read_config_file(&path)?), Some(path)),
            None => match default_config_path() {
                Some(path) => (Some(read_config_file(&path)?), Some(path)),
                None => (None, None),
            },
        };
        if let Some(path) = &source {
            debug!("Using config file: {}", path.display());
        }
        let file = file.unwrap_or_default();
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let timeout_secs = match var("GHPH_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|e| ProjectError::Configuration {
                message: format!("GHPH_TIMEOUT_SECS must be a number of seconds: {e}"),
            })?,
            None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let api_url = var("GHPH_API_URL")
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Config {
            token: self.token.or_else(|| var("GHPH_TOKEN")).or(file.token),
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout_secs,
            source,
        })
    }
}

fn read_config_file(path: &Path) -> Result<FileConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ProjectError::FileSystem {
        path: path.to_path_buf(),
        source: e,
    })?;
    if contents.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    Ok(serde_yaml::from_str(&contents)?)
}

/// Returns the XDG config file if it exists.
fn default_config_path() -> Option<PathBuf> {
    xdg::BaseDirectories::with_prefix("ghph").find_config_file(CONFIG_FILE_NAME)
}
