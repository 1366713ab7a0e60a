//! GitHub repository metadata lookup.
//!
//! Used by the releases and docs builders when no description is
//! configured. One read-only GET per repository per run; the result is
//! memoized on the client.

use crate::env::RepoSlug;
use crate::error::{DeployError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, warn};

pub const GITHUB_API: &str = "https://api.github.com";

/// Source of repository metadata.
#[async_trait]
pub trait RepoMetadata: Send + Sync {
    /// Repository description; empty when the repository has none.
    async fn description(&self, slug: &RepoSlug) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    description: Option<String>,
}

/// Build the error for a non-success response.
///
/// `history` lists the URL originally requested when redirects were followed.
pub(crate) fn http_error(requested: &str, response: &reqwest::Response) -> DeployError {
    let final_url = response.url().to_string();
    let history = if final_url != requested {
        vec![requested.to_string()]
    } else {
        Vec::new()
    };

    warn!(
        status = response.status().as_u16(),
        url = %final_url,
        history = ?history,
        "Unexpected HTTP response"
    );

    DeployError::Http {
        status: response.status().as_u16(),
        url: final_url,
        history,
    }
}

/// GitHub REST client for repository metadata.
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    token: Option<String>,
    cache: Mutex<HashMap<String, String>>,
}

impl GithubClient {
    /// Client against the public GitHub API.
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_base_url(GITHUB_API, token)
    }

    /// Client against another API root (GitHub Enterprise, tests).
    pub fn with_base_url(api_base: &str, token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn cached(&self, slug: &RepoSlug) -> Option<String> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(&slug.to_string()).cloned())
    }

    async fn fetch_description(&self, slug: &RepoSlug) -> Result<String> {
        let url = format!("{}/repos/{}", self.api_base, slug);
        info!(url = %url, "Fetching repository description");

        let mut request = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
            .header(reqwest::header::USER_AGENT, slug.owner.as_str());
        if let Some(token) = &self.token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("token {token}"));
        }

        let response = request.send().await?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(http_error(&url, &response));
        }

        let body: RepoResponse = response.json().await?;
        Ok(body.description.unwrap_or_default())
    }
}

#[async_trait]
impl RepoMetadata for GithubClient {
    async fn description(&self, slug: &RepoSlug) -> Result<String> {
        if let Some(description) = self.cached(slug) {
            debug!(slug = %slug, "Repository description served from cache");
            return Ok(description);
        }

        let description = self.fetch_description(slug).await?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(slug.to_string(), description.clone());
        }
        Ok(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = GithubClient::with_base_url("http://localhost:9/", None).unwrap();
        assert_eq!(client.api_base, "http://localhost:9");
    }

    #[test]
    fn test_repo_response_null_description() {
        let body: RepoResponse = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(body.description, None);
    }
}
