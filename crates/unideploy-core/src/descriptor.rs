//! Deployment and pipeline descriptors.
//!
//! These serialize to the `.travis.yml`-shaped JSON the CI provider accepts
//! as a request `config`. Equality is structural, which is what the
//! assembler relies on to detect a no-op pipeline.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Deployment target kinds, in assembly order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Pages,
    Releases,
    AssetStore,
}

impl Provider {
    /// Configuration section that drives this provider.
    pub fn section(&self) -> &'static str {
        match self {
            Provider::Pages => "Docs",
            Provider::Releases => "Github",
            Provider::AssetStore => "Asset",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Pages => "Github Pages",
            Provider::Releases => "Github Releases",
            Provider::AssetStore => "Unity's Asset Store",
        };
        f.write_str(name)
    }
}

/// Branch predicate of a deploy stanza (`on:`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOn {
    Branch(String),
    AllBranches,
}

impl DeployOn {
    /// `Branch` for a non-empty configured branch, `AllBranches` otherwise.
    pub fn from_branch(branch: &str) -> Self {
        if branch.is_empty() {
            DeployOn::AllBranches
        } else {
            DeployOn::Branch(branch.to_string())
        }
    }
}

impl Serialize for DeployOn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            DeployOn::Branch(branch) => map.serialize_entry("branch", branch)?,
            DeployOn::AllBranches => map.serialize_entry("all_branches", "true")?,
        }
        map.end()
    }
}

/// GitHub Releases stanza.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleasesDeploy {
    pub api_key: String,
    pub target_commitish: String,
    pub name: String,
    pub draft: bool,
    pub prerelease: bool,
    pub skip_cleanup: String,
    pub on: DeployOn,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub file: String,
}

/// Custom script stanza (docs publishing, asset store upload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptDeploy {
    pub script: String,
    pub skip_cleanup: String,
    pub on: DeployOn,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// One entry of the pipeline's `deploy` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum Deployment {
    Releases(ReleasesDeploy),
    Script(ScriptDeploy),
}

/// `env` block of the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineEnv {
    pub global: Vec<String>,
}

/// Root descriptor of one CI run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pipeline {
    pub language: Vec<String>,
    pub install: Vec<String>,
    pub script: Vec<String>,
    pub before_deploy: Vec<String>,
    pub deploy: Vec<Deployment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_success: Option<Vec<String>>,
    pub env: PipelineEnv,
}

/// Where an enabled provider lands in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Appended to `deploy`.
    Deploy(Deployment),
    /// Appended to the `after_success` hook list.
    AfterSuccess(Vec<String>),
}

/// Output of a descriptor builder for an enabled provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPlan {
    pub provider: Provider,
    pub placement: Placement,
    /// `KEY=value` strings appended to `env.global`.
    pub options: Vec<String>,
}
