//! Deployment descriptor builders.
//!
//! Each provider is split in two steps:
//! - settings: read and type-check its configuration section (no environment,
//!   no network), `None` when the provider is disabled;
//! - build: resolve the settings against the CI environment into a
//!   [`ProviderPlan`].
//!
//! A builder either returns a fully populated plan or an error, never a
//! partial descriptor.

pub mod asset;
pub mod pages;
pub mod releases;

use crate::descriptor::{Provider, ProviderPlan};
use crate::env::{DerivedFlags, Environment};
use crate::error::Result;
use crate::github::RepoMetadata;
use crate::stage::script_path;
use async_trait::async_trait;
use tracing::debug;
use unideploy_ini::Config;

pub use asset::AssetBuilder;
pub use pages::{DocsPlacement, PagesBuilder};
pub use releases::ReleasesBuilder;

/// Inputs shared by every builder.
pub struct BuildContext<'a> {
    pub config: &'a Config,
    pub env: &'a Environment,
    pub flags: &'a DerivedFlags,
    /// Directory holding the pipeline's shell steps, e.g. `./.deploy/travis`.
    pub scripts_dir: &'a str,
    pub metadata: &'a dyn RepoMetadata,
}

impl BuildContext<'_> {
    /// Shell invocation of a script in the scripts directory.
    pub fn sh(&self, script: &str) -> String {
        format!("sh {}", self.script_path(script))
    }

    pub fn script_path(&self, script: &str) -> String {
        script_path(self.scripts_dir, script)
    }
}

/// A deployment provider's descriptor builder.
#[async_trait]
pub trait DescriptorBuilder: Send + Sync {
    fn provider(&self) -> Provider;

    /// Type-check the provider's configuration. `Ok(false)` when disabled.
    fn validate(&self, config: &Config) -> Result<bool>;

    /// Resolve the descriptor, `None` when the provider does not deploy.
    async fn build(&self, ctx: &BuildContext<'_>) -> Result<Option<ProviderPlan>>;
}

/// Read a provider's `enable` flag. An absent section counts as disabled.
pub(crate) fn section_enabled(config: &Config, provider: Provider) -> Result<bool> {
    let section = provider.section();
    if !config.has_section(section) {
        debug!(section = %section, "No configuration section, provider disabled");
        return Ok(false);
    }
    Ok(config.get_bool(section, "enable")?)
}

/// Builders in assembly order: docs, releases, asset store.
pub fn default_builders() -> Vec<Box<dyn DescriptorBuilder>> {
    vec![
        Box::new(PagesBuilder),
        Box::new(ReleasesBuilder),
        Box::new(AssetBuilder),
    ]
}

/// Run every builder, keeping the plans of providers that deploy.
pub async fn build_all(
    builders: &[Box<dyn DescriptorBuilder>],
    ctx: &BuildContext<'_>,
) -> Result<Vec<ProviderPlan>> {
    let mut plans = Vec::new();
    for builder in builders {
        match builder.build(ctx).await? {
            Some(plan) => plans.push(plan),
            None => debug!(provider = %builder.provider(), "Provider not deploying"),
        }
    }
    Ok(plans)
}

/// Type-check every provider section, returning the enabled providers.
pub fn validate_all(
    builders: &[Box<dyn DescriptorBuilder>],
    config: &Config,
) -> Result<Vec<Provider>> {
    let mut enabled = Vec::new();
    for builder in builders {
        if builder.validate(config)? {
            enabled.push(builder.provider());
        }
    }
    Ok(enabled)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::env::{GH_TOKEN, TRAVIS_BRANCH, TRAVIS_COMMIT, TRAVIS_REPO_SLUG, TRAVIS_TAG};

    pub fn env_with_tag(tag: &str) -> Environment {
        Environment::from_pairs([
            (TRAVIS_REPO_SLUG, "octo/widgets"),
            (TRAVIS_BRANCH, "release"),
            (TRAVIS_TAG, tag),
            (TRAVIS_COMMIT, "abc123"),
            (GH_TOKEN, "gh-secret"),
        ])
    }

    pub fn flags(include_version: bool) -> DerivedFlags {
        DerivedFlags {
            verbose: false,
            always_run: false,
            packagename: String::new(),
            include_version,
        }
    }
}
