//! Travis CI rebuild trigger.
//!
//! Exchanges the GitHub token for a Travis API token, then posts one
//! rebuild request carrying the assembled pipeline as its `config`.
//! Single attempt: no retry, no backoff.

use crate::descriptor::Pipeline;
use crate::env::RepoSlug;
use crate::error::{DeployError, Result};
use crate::github::http_error;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const TRAVIS_API: &str = "https://api.travis-ci.org";
pub const REBUILD_MESSAGE: &str = "Deployment requested. Rebuilding.";

const TRAVIS_ACCEPT: &str = "application/vnd.travis-ci.2+json";
const CLIENT_AGENT: &str = concat!("unideploy/", env!("CARGO_PKG_VERSION"));

/// Result of a rebuild request that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// HTTP 202: the provider queued the rebuild. The caller should stop.
    Accepted,
    /// Another 2xx status: nothing was queued, local execution continues.
    Unaccepted { status: u16 },
}

/// Something that can request a rebuild carrying a pipeline descriptor.
#[async_trait]
pub trait BuildTrigger: Send + Sync {
    async fn trigger(&self, token: &str, pipeline: &Pipeline) -> Result<TriggerOutcome>;
}

#[async_trait]
impl<'a, T: BuildTrigger + ?Sized> BuildTrigger for &'a T {
    async fn trigger(&self, token: &str, pipeline: &Pipeline) -> Result<TriggerOutcome> {
        (**self).trigger(token, pipeline).await
    }
}

#[derive(Debug, Serialize)]
struct GithubAuthRequest<'a> {
    github_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct GithubAuthResponse {
    access_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct RebuildRequest<'a> {
    message: &'a str,
    branch: &'a str,
    token: &'a str,
    config: &'a Pipeline,
}

#[derive(Debug, Serialize)]
struct RebuildEnvelope<'a> {
    request: RebuildRequest<'a>,
}

/// Travis CI API client for one repository and branch.
pub struct TravisClient {
    http: reqwest::Client,
    api_base: String,
    slug: RepoSlug,
    branch: String,
}

impl TravisClient {
    pub fn new(slug: RepoSlug, branch: impl Into<String>) -> Result<Self> {
        Self::with_base_url(TRAVIS_API, slug, branch)
    }

    pub fn with_base_url(
        api_base: &str,
        slug: RepoSlug,
        branch: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(CLIENT_AGENT).build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            slug,
            branch: branch.into(),
        })
    }

    /// Rebuild endpoint; the slug separator must be percent-encoded.
    pub fn requests_url(&self) -> String {
        format!(
            "{}/repo/{}%2F{}/requests",
            self.api_base, self.slug.owner, self.slug.repo
        )
    }

    /// Exchange a GitHub token for a Travis API token.
    pub async fn github_auth(&self, github_token: &str) -> Result<String> {
        let url = format!("{}/auth/github", self.api_base);
        let response = self
            .http
            .post(&url)
            .header(ACCEPT, TRAVIS_ACCEPT)
            .json(&GithubAuthRequest { github_token })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(http_error(&url, &response));
        }

        let body: GithubAuthResponse = response.json().await?;
        body.access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| DeployError::Response {
                url,
                message: "no access_token in authentication response".to_string(),
            })
    }
}

#[async_trait]
impl BuildTrigger for TravisClient {
    async fn trigger(&self, token: &str, pipeline: &Pipeline) -> Result<TriggerOutcome> {
        let api_token = self.github_auth(token).await?;
        let url = self.requests_url();

        let body = RebuildEnvelope {
            request: RebuildRequest {
                message: REBUILD_MESSAGE,
                branch: &self.branch,
                token: &api_token,
                config: pipeline,
            },
        };

        info!(
            url = %url,
            branch = %self.branch,
            deploys = pipeline.deploy.len(),
            "Requesting rebuild"
        );
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, TRAVIS_ACCEPT)
            .header("Travis-API-Version", "3")
            .header(AUTHORIZATION, format!("token {api_token}"))
            .header(USER_AGENT, CLIENT_AGENT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            info!(status = status.as_u16(), "Rebuild request accepted");
            Ok(TriggerOutcome::Accepted)
        } else if status.is_success() {
            warn!(status = status.as_u16(), "Rebuild request not accepted");
            Ok(TriggerOutcome::Unaccepted {
                status: status.as_u16(),
            })
        } else {
            Err(http_error(&url, &response))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TravisClient {
        let slug = RepoSlug::parse("octo/widgets").unwrap();
        TravisClient::with_base_url("https://travis.example/", slug, "release").unwrap()
    }

    #[test]
    fn test_requests_url_encodes_slug() {
        assert_eq!(
            client().requests_url(),
            "https://travis.example/repo/octo%2Fwidgets/requests"
        );
    }

    #[test]
    fn test_rebuild_envelope_shape() {
        let pipeline = Pipeline {
            language: vec!["objective-c".to_string()],
            install: vec![],
            script: vec![],
            before_deploy: vec![],
            deploy: vec![],
            after_success: None,
            env: Default::default(),
        };
        let body = RebuildEnvelope {
            request: RebuildRequest {
                message: REBUILD_MESSAGE,
                branch: "release",
                token: "api-token",
                config: &pipeline,
            },
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["request"]["message"], REBUILD_MESSAGE);
        assert_eq!(value["request"]["branch"], "release");
        assert_eq!(value["request"]["token"], "api-token");
        assert_eq!(value["request"]["config"]["language"][0], "objective-c");
    }
}
