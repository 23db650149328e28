//! GitHub implementation of [`RemoteBackend`](crate::remote::RemoteBackend).
//!
//! Repository, board, user, issue and board-item operations go through the
//! GraphQL API; milestones, labels and the title search use REST, which
//! offers exact lookups for them.

mod auth;
mod backend;
mod wire;

use std::time::Duration;

use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION},
    Client, RequestBuilder, Response, Url,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

pub use auth::resolve_token;

use self::wire::{GraphQlResponse, RestError};
use crate::{
    config::Config,
    error::{ProjectError, Result},
};

/// Profile of the account behind the token.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatedUser {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Authenticated client for the GitHub REST and GraphQL APIs.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: Url,
    graphql_url: Url,
}

impl GitHubClient {
    /// Creates a client for `api_url` authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns `ProjectError::Configuration` for an unusable token or URL and
    /// `ProjectError::Http` if the HTTP client cannot be built.
    pub fn new(token: &str, api_url: &str, timeout: Duration) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            ProjectError::Configuration {
                message: format!("GitHub token contains invalid characters: {e}"),
            }
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let http = Client::builder()
            .user_agent(concat!("ghph/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ProjectError::http("failed to build HTTP client", e))?;

        let api_url = parse_url(api_url)?;
        let graphql_url = graphql_endpoint(&api_url)?;

        Ok(Self {
            http,
            api_url,
            graphql_url,
        })
    }

    /// Creates a client from resolved configuration, discovering the token
    /// when the configuration has none.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let token = resolve_token(config.token.as_deref()).await?;
        Self::new(
            &token,
            &config.api_url,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Fetches the account the token belongs to.
    pub async fn authenticated_user(&self) -> Result<AuthenticatedUser> {
        let url = self.rest_url(&["user"])?;
        self.rest(self.http.get(url)).await
    }

    /// Builds a REST URL from path segments, percent-encoding each segment.
    fn rest_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| ProjectError::Configuration {
                message: format!("API URL {} cannot take a path", self.api_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a REST request and returns the response if it succeeded.
    ///
    /// Non-success statuses become `ProjectError::Api` carrying the status,
    /// so callers can react to specific codes such as 404.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ProjectError::http("GitHub request failed", e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<RestError>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        Err(ProjectError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn rest<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| ProjectError::http("failed to decode GitHub response", e))
    }

    /// Runs a GraphQL document.
    ///
    /// Errors whose type is `NOT_FOUND` are tolerated when data came back, so
    /// callers can turn the resulting null fields into `ProjectError::NotFound`.
    async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let request = self
            .http
            .post(self.graphql_url.clone())
            .json(&json!({ "query": query, "variables": variables }));
        let response: GraphQlResponse<T> = self.rest(request).await?;

        let fatal: Vec<&str> = response
            .errors
            .iter()
            .filter(|e| !e.is_not_found() || response.data.is_none())
            .map(|e| e.message.as_str())
            .collect();
        if !fatal.is_empty() {
            return Err(ProjectError::Api {
                status: 200,
                message: fatal.join("; "),
            });
        }
        if !response.errors.is_empty() {
            debug!(
                "GraphQL reported {} missing object(s)",
                response.errors.len()
            );
        }

        response.data.ok_or_else(|| ProjectError::Api {
            status: 200,
            message: "GraphQL response carried no data".to_string(),
        })
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| ProjectError::Configuration {
        message: format!("invalid API URL {raw:?}: {e}"),
    })
}

/// GraphQL endpoint for a REST base: `https://api.github.com/graphql` for
/// github.com, `https://host/api/graphql` for Enterprise `.../api/v3`.
fn graphql_endpoint(api_url: &Url) -> Result<Url> {
    let base = api_url.as_str().trim_end_matches('/');
    let graphql = match base.strip_suffix("/v3") {
        Some(prefix) => format!("{prefix}/graphql"),
        None => format!("{base}/graphql"),
    };
    parse_url(&graphql)
}
