//! Asset store upload descriptor (`[Asset]` section).

use super::{section_enabled, BuildContext, DescriptorBuilder};
use crate::artifact::{artifact_path, configured_package};
use crate::descriptor::{DeployOn, Deployment, Placement, Provider, ProviderPlan, ScriptDeploy};
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;
use unideploy_ini::Config;

const SECTION: &str = "Asset";
const DEPLOY_SCRIPT: &str = "deploy_asset.sh";

/// Typed `[Asset]` section of an enabled asset store provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSettings {
    pub branch: String,
    pub packagename: String,
    pub include_version: Option<bool>,
}

impl AssetSettings {
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        if !section_enabled(config, Provider::AssetStore)? {
            return Ok(None);
        }

        Ok(Some(Self {
            branch: config.get_string(SECTION, "branch")?.to_string(),
            packagename: config
                .get_opt_string(SECTION, "packagename")?
                .unwrap_or("")
                .to_string(),
            include_version: config.get_opt_bool(SECTION, "include_version")?,
        }))
    }
}

/// Builds the asset store upload stanza.
pub struct AssetBuilder;

#[async_trait]
impl DescriptorBuilder for AssetBuilder {
    fn provider(&self) -> Provider {
        Provider::AssetStore
    }

    fn validate(&self, config: &Config) -> Result<bool> {
        Ok(AssetSettings::from_config(config)?.is_some())
    }

    async fn build(&self, ctx: &BuildContext<'_>) -> Result<Option<ProviderPlan>> {
        let Some(settings) = AssetSettings::from_config(ctx.config)? else {
            return Ok(None);
        };

        let tag = ctx.env.tag()?;
        let package = match configured_package(&settings.packagename, &ctx.flags.packagename) {
            Some(name) => name.to_string(),
            None => ctx.env.repo_slug()?.repo,
        };
        let include_version = settings
            .include_version
            .unwrap_or(ctx.flags.include_version)
            && !tag.trim().is_empty();

        let deployment = ScriptDeploy {
            script: ctx.script_path(DEPLOY_SCRIPT),
            skip_cleanup: "true".to_string(),
            on: DeployOn::from_branch(&settings.branch),
            file: Some(artifact_path(&package, include_version.then_some(tag))),
        };

        info!(
            provider = %Provider::AssetStore,
            file = ?deployment.file,
            "Asset store descriptor resolved"
        );

        Ok(Some(ProviderPlan {
            provider: Provider::AssetStore,
            placement: Placement::Deploy(Deployment::Script(deployment)),
            options: Vec::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::{env_with_tag, flags};
    use crate::fakes::StaticMetadata;

    #[tokio::test]
    async fn test_asset_descriptor() {
        let config = Config::parse(
            "[Asset]\nenable = yes\nbranch = master\ninclude_version = yes\n",
        )
        .unwrap();
        let env = env_with_tag("v0.9.1");
        let flags = flags(false);
        let metadata = StaticMetadata::new("unused");
        let ctx = BuildContext {
            config: &config,
            env: &env,
            flags: &flags,
            scripts_dir: "./.deploy/travis",
            metadata: &metadata,
        };

        let plan = AssetBuilder.build(&ctx).await.unwrap().expect("asset enabled");
        assert_eq!(plan.provider, Provider::AssetStore);
        assert!(plan.options.is_empty());
        assert_eq!(
            plan.placement,
            Placement::Deploy(Deployment::Script(ScriptDeploy {
                script: "./.deploy/travis/deploy_asset.sh".to_string(),
                skip_cleanup: "true".to_string(),
                on: DeployOn::Branch("master".to_string()),
                file: Some("./Deploy/widgets_v0.9.1.zip".to_string()),
            }))
        );
        assert_eq!(metadata.calls(), 0);
    }

    #[test]
    fn test_disabled_asset_settings() {
        let config = Config::parse("[Asset]\nenable = off\nbranch\n").unwrap();
        assert_eq!(AssetSettings::from_config(&config).unwrap(), None);
    }

    #[test]
    fn test_enabled_asset_requires_branch() {
        let config = Config::parse("[Asset]\nenable = on\n").unwrap();
        assert!(AssetSettings::from_config(&config).is_err());
    }
}
