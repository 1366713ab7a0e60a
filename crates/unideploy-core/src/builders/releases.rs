//! GitHub Releases descriptor (`[Github]` section).

use super::{section_enabled, BuildContext, DescriptorBuilder};
use crate::artifact::{artifact_path, configured_package};
use crate::descriptor::{DeployOn, Deployment, Placement, Provider, ProviderPlan, ReleasesDeploy};
use crate::env::{flag_str, GH_TOKEN};
use crate::error::Result;
use crate::tag::resolve_conditional;
use async_trait::async_trait;
use tracing::info;
use unideploy_ini::Config;

const SECTION: &str = "Github";

/// Typed `[Github]` section of an enabled releases provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasesSettings {
    pub branch: String,
    pub title: String,
    pub description: String,
    pub packagename: String,
    /// `None` defers to `[Misc] include_version`.
    pub include_version: Option<bool>,
    pub prerelease: bool,
    pub conditional_prerelease: bool,
    pub draft: bool,
    pub conditional_draft: bool,
}

impl ReleasesSettings {
    /// Read the section; `None` when `enable` is false.
    ///
    /// A conditional key is only read when its primary flag is off.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        if !section_enabled(config, Provider::Releases)? {
            return Ok(None);
        }

        let prerelease = config.get_bool(SECTION, "prerelease")?;
        let conditional_prerelease =
            !prerelease && config.get_bool(SECTION, "conditional_prerelease")?;
        let draft = config.get_bool(SECTION, "draft")?;
        let conditional_draft = !draft && config.get_bool(SECTION, "conditional_draft")?;

        Ok(Some(Self {
            branch: config.get_string(SECTION, "branch")?.to_string(),
            title: config.get_string(SECTION, "title")?.to_string(),
            description: config.get_string(SECTION, "description")?.to_string(),
            packagename: config
                .get_opt_string(SECTION, "packagename")?
                .unwrap_or("")
                .to_string(),
            include_version: config.get_opt_bool(SECTION, "include_version")?,
            prerelease,
            conditional_prerelease,
            draft,
            conditional_draft,
        }))
    }
}

/// Builds the `releases` deploy stanza.
pub struct ReleasesBuilder;

#[async_trait]
impl DescriptorBuilder for ReleasesBuilder {
    fn provider(&self) -> Provider {
        Provider::Releases
    }

    fn validate(&self, config: &Config) -> Result<bool> {
        Ok(ReleasesSettings::from_config(config)?.is_some())
    }

    async fn build(&self, ctx: &BuildContext<'_>) -> Result<Option<ProviderPlan>> {
        let Some(settings) = ReleasesSettings::from_config(ctx.config)? else {
            return Ok(None);
        };

        let env = ctx.env;
        let tag = env.tag()?;
        let prerelease =
            resolve_conditional(settings.prerelease, settings.conditional_prerelease, tag);
        let draft = resolve_conditional(settings.draft, settings.conditional_draft, tag);

        let name = if settings.title.is_empty() {
            tag.to_string()
        } else {
            settings.title.clone()
        };

        let description = if settings.description.is_empty() {
            let remote = ctx.metadata.description(&env.repo_slug()?).await?;
            Some(remote).filter(|d| !d.is_empty())
        } else {
            Some(settings.description.clone())
        };

        let configured = configured_package(&settings.packagename, &ctx.flags.packagename);
        let package = match configured {
            Some(name) => name.to_string(),
            None => env.repo_slug()?.repo,
        };

        let include_version = settings
            .include_version
            .unwrap_or(ctx.flags.include_version)
            && !tag.trim().is_empty();
        let file = artifact_path(&package, include_version.then_some(tag));

        let deployment = ReleasesDeploy {
            api_key: env.get(GH_TOKEN)?.to_string(),
            target_commitish: env.commit()?.to_string(),
            name,
            draft,
            prerelease,
            skip_cleanup: "true".to_string(),
            on: DeployOn::from_branch(&settings.branch),
            description,
            file,
        };

        let packagename_option = match configured {
            Some(name) => format!("packagename=\"{name}\""),
            None => format!("packagename={package}"),
        };
        let options = vec![
            packagename_option,
            format!("gh_version={}", flag_str(include_version)),
        ];

        info!(
            provider = %Provider::Releases,
            file = %deployment.file,
            draft = deployment.draft,
            prerelease = deployment.prerelease,
            "Release descriptor resolved"
        );

        Ok(Some(ProviderPlan {
            provider: Provider::Releases,
            placement: Placement::Deploy(Deployment::Releases(deployment)),
            options,
        }))
    }
}
