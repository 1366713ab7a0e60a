//! GitHub Pages documentation descriptor (`[Docs]` section).

use super::{section_enabled, BuildContext, DescriptorBuilder};
use crate::descriptor::{DeployOn, Deployment, Placement, Provider, ProviderPlan, ScriptDeploy};
use crate::error::{DeployError, Result};
use async_trait::async_trait;
use tracing::info;
use unideploy_ini::Config;

const SECTION: &str = "Docs";
const DEPLOY_SCRIPT: &str = "deploy_docs.sh";

/// Where the docs publishing step is attached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocsPlacement {
    /// `after_success` hook running the script directly.
    #[default]
    AfterSuccess,
    /// `script` provider entry in the `deploy` list.
    Deploy,
}

impl DocsPlacement {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "" | "after_success" => Ok(DocsPlacement::AfterSuccess),
            "deploy" => Ok(DocsPlacement::Deploy),
            other => Err(DeployError::InvalidValue {
                section: SECTION.to_string(),
                key: "placement".to_string(),
                value: other.to_string(),
                expected: "after_success, deploy".to_string(),
            }),
        }
    }
}

/// Typed `[Docs]` section of an enabled docs provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsSettings {
    pub branch: String,
    pub projectname: String,
    pub description: String,
    pub logo: String,
    pub include_version: bool,
    pub include_non_documented: bool,
    pub include_privates: bool,
    pub include_nav_panel: bool,
    pub include_search: bool,
    pub gen_diagrams: bool,
    pub placement: DocsPlacement,
}

/// Branch the docs publish from, `None` when the provider is disabled.
///
/// Only `enable` and `branch` are read, so a section for another branch
/// needs no option keys.
fn docs_branch(config: &Config) -> Result<Option<String>> {
    if !section_enabled(config, Provider::Pages)? {
        return Ok(None);
    }
    Ok(Some(config.get_string(SECTION, "branch")?.to_string()))
}

impl DocsSettings {
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(branch) = docs_branch(config)? else {
            return Ok(None);
        };

        let placement = match config.get_opt_string(SECTION, "placement")? {
            Some(value) => DocsPlacement::parse(value)?,
            None => DocsPlacement::default(),
        };

        Ok(Some(Self {
            branch,
            projectname: config.get_string(SECTION, "projectname")?.to_string(),
            description: config.get_string(SECTION, "description")?.to_string(),
            logo: config.get_string(SECTION, "logo")?.to_string(),
            include_version: config.get_bool(SECTION, "include_version")?,
            include_non_documented: config.get_bool(SECTION, "include_non_documented")?,
            include_privates: config.get_bool(SECTION, "include_privates")?,
            include_nav_panel: config.get_bool(SECTION, "include_nav_panel")?,
            include_search: config.get_bool(SECTION, "include_search")?,
            gen_diagrams: config.get_bool(SECTION, "gen_diagrams")?,
            placement,
        }))
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "YES"
    } else {
        "NO"
    }
}

/// Builds the docs publishing step and the doc generator's options.
pub struct PagesBuilder;

impl PagesBuilder {
    async fn options(
        &self,
        settings: &DocsSettings,
        ctx: &BuildContext<'_>,
    ) -> Result<Vec<String>> {
        let env = ctx.env;
        let slug = env.repo_slug()?;
        let mut options = Vec::with_capacity(11);

        if settings.projectname.is_empty() {
            options.push(format!("projectname={}", slug.repo));
        } else {
            options.push(format!("projectname=\"{}\"", settings.projectname));
        }

        let description = if settings.description.is_empty() {
            ctx.metadata.description(&slug).await?
        } else {
            settings.description.clone()
        };
        options.push(format!("description=\"{description}\""));

        if settings.logo.is_empty() {
            options.push("logo=".to_string());
        } else {
            options.push(format!("logo=\"{}\"", settings.logo));
        }

        if settings.include_version {
            options.push(format!("docs_version={}", env.tag()?));
        } else {
            options.push("docs_version=".to_string());
        }

        options.push(format!(
            "include_non_documented={}",
            yes_no(settings.include_non_documented)
        ));
        options.push(format!("include_privates={}", yes_no(settings.include_privates)));
        options.push(format!("include_nav_panel={}", yes_no(settings.include_nav_panel)));
        options.push(format!("include_search={}", yes_no(settings.include_search)));
        // Class diagrams are the fallback when dot graphs are off
        options.push(format!("gen_diagrams={}", yes_no(settings.gen_diagrams)));
        options.push(format!("class_diagrams={}", yes_no(!settings.gen_diagrams)));
        options.push(format!("GH_REF=github.com/{slug}.git"));

        Ok(options)
    }
}

#[async_trait]
impl DescriptorBuilder for PagesBuilder {
    fn provider(&self) -> Provider {
        Provider::Pages
    }

    fn validate(&self, config: &Config) -> Result<bool> {
        Ok(DocsSettings::from_config(config)?.is_some())
    }

    async fn build(&self, ctx: &BuildContext<'_>) -> Result<Option<ProviderPlan>> {
        let Some(branch) = docs_branch(ctx.config)? else {
            return Ok(None);
        };

        if !branch.is_empty() {
            let current = ctx.env.branch()?;
            if branch != current {
                info!(
                    provider = %Provider::Pages,
                    branch = %branch,
                    current = %current,
                    "Docs branch does not match the build branch"
                );
                return Ok(None);
            }
        }

        let Some(settings) = DocsSettings::from_config(ctx.config)? else {
            return Ok(None);
        };

        let placement = match settings.placement {
            DocsPlacement::AfterSuccess => Placement::AfterSuccess(vec![ctx.sh(DEPLOY_SCRIPT)]),
            DocsPlacement::Deploy => Placement::Deploy(Deployment::Script(ScriptDeploy {
                script: ctx.script_path(DEPLOY_SCRIPT),
                skip_cleanup: "true".to_string(),
                on: DeployOn::from_branch(&settings.branch),
                file: None,
            })),
        };
        let options = self.options(&settings, ctx).await?;

        Ok(Some(ProviderPlan {
            provider: Provider::Pages,
            placement,
            options,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::{env_with_tag, flags};
    use crate::env::Environment;
    use crate::fakes::StaticMetadata;

    const DOCS: &str = "[Docs]\nenable = true\nbranch = release\nprojectname =\ndescription =\n\
        logo =\ninclude_version = true\ninclude_non_documented = false\ninclude_privates = no\n\
        include_nav_panel = yes\ninclude_search = 1\ngen_diagrams = off\n";

    async fn build(
        config: &Config,
        env: &Environment,
        metadata: &StaticMetadata,
    ) -> Result<Option<ProviderPlan>> {
        let flags = flags(false);
        let ctx = BuildContext {
            config,
            env,
            flags: &flags,
            scripts_dir: "./.deploy/travis",
            metadata,
        };
        PagesBuilder.build(&ctx).await
    }

    #[tokio::test]
    async fn test_docs_hook_and_options() {
        let config = Config::parse(DOCS).unwrap();
        let metadata = StaticMetadata::new("Widgets for all");

        let plan = build(&config, &env_with_tag("v1.4.0"), &metadata)
            .await
            .unwrap()
            .expect("docs enabled");

        assert_eq!(
            plan.placement,
            Placement::AfterSuccess(vec!["sh ./.deploy/travis/deploy_docs.sh".to_string()])
        );
        assert_eq!(
            plan.options,
            vec![
                "projectname=widgets",
                "description=\"Widgets for all\"",
                "logo=",
                "docs_version=v1.4.0",
                "include_non_documented=NO",
                "include_privates=NO",
                "include_nav_panel=YES",
                "include_search=YES",
                "gen_diagrams=NO",
                "class_diagrams=YES",
                "GH_REF=github.com/octo/widgets.git",
            ]
        );
        assert_eq!(metadata.calls(), 1);
    }

    #[tokio::test]
    async fn test_configured_values_are_quoted() {
        let config = Config::parse(
            "[Docs]\nenable = true\nbranch =\nprojectname = Widget Kit\ndescription = Docs\n\
             logo = logo.png\ninclude_version = false\ninclude_non_documented = true\n\
             include_privates = true\ninclude_nav_panel = false\ninclude_search = false\n\
             gen_diagrams = true\nplacement = deploy\n",
        )
        .unwrap();
        let metadata = StaticMetadata::new("unused");

        let plan = build(&config, &env_with_tag("v1.4.0"), &metadata)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(plan.options[0], "projectname=\"Widget Kit\"");
        assert_eq!(plan.options[1], "description=\"Docs\"");
        assert_eq!(plan.options[2], "logo=\"logo.png\"");
        assert_eq!(plan.options[3], "docs_version=");
        assert_eq!(plan.options[8], "gen_diagrams=YES");
        assert_eq!(plan.options[9], "class_diagrams=NO");
        assert_eq!(metadata.calls(), 0);

        match plan.placement {
            Placement::Deploy(Deployment::Script(script)) => {
                assert_eq!(script.script, "./.deploy/travis/deploy_docs.sh");
                assert_eq!(script.on, DeployOn::AllBranches);
            }
            other => panic!("unexpected placement: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_branch_mismatch_skips_docs() {
        let config = Config::parse(&DOCS.replace("branch = release", "branch = gh-docs")).unwrap();
        let metadata = StaticMetadata::new("unused");

        let plan = build(&config, &env_with_tag("v1.4.0"), &metadata).await.unwrap();
        assert!(plan.is_none());
        assert_eq!(metadata.calls(), 0);
    }

    #[tokio::test]
    async fn test_other_branch_needs_no_option_keys() {
        let config = Config::parse("[Docs]\nenable = true\nbranch = gh-docs\n").unwrap();
        let metadata = StaticMetadata::new("unused");

        let plan = build(&config, &env_with_tag("v1.4.0"), &metadata).await.unwrap();
        assert!(plan.is_none());
    }

    #[tokio::test]
    async fn test_matching_branch_requires_option_keys() {
        let config = Config::parse("[Docs]\nenable = true\nbranch = release\n").unwrap();
        let metadata = StaticMetadata::new("unused");

        let err = build(&config, &env_with_tag("v1.4.0"), &metadata).await.unwrap_err();
        assert!(matches!(
            err,
            DeployError::Config(unideploy_ini::ConfigError::KeyMissing { .. })
        ));
    }

    #[tokio::test]
    async fn test_disabled_docs() {
        let config = Config::parse("[Docs]\nenable = false\n").unwrap();
        let metadata = StaticMetadata::new("unused");
        let plan = build(&config, &Environment::default(), &metadata).await.unwrap();
        assert!(plan.is_none());
    }

    #[test]
    fn test_invalid_placement() {
        let config = Config::parse(&format!("{DOCS}placement = sideways\n")).unwrap();
        let err = DocsSettings::from_config(&config).unwrap_err();
        assert!(matches!(err, DeployError::InvalidValue { ref value, .. } if value == "sideways"));
    }
}
