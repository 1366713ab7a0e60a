//! Pipeline assembly.
//!
//! Starts from the no-op baseline, merges every provider plan in order and
//! compares the result with the baseline: structural equality means there
//! is nothing to deploy.

use crate::descriptor::{Pipeline, PipelineEnv, Placement, Provider, ProviderPlan};
use crate::env::{flag_str, DerivedFlags};
use crate::stage::BuildStep;
use tracing::info;

/// Language the rebuilt job runs under (macOS image).
pub const PIPELINE_LANGUAGE: &str = "objective-c";

/// The pipeline produced when no provider is enabled.
pub fn baseline(scripts_dir: &str, flags: &DerivedFlags, tag: &str) -> Pipeline {
    Pipeline {
        language: vec![PIPELINE_LANGUAGE.to_string()],
        install: vec![BuildStep::Install.shell_line(scripts_dir)],
        script: vec![BuildStep::Build.shell_line(scripts_dir)],
        before_deploy: vec![BuildStep::PreDeploy.shell_line(scripts_dir)],
        deploy: Vec::new(),
        after_success: None,
        env: PipelineEnv {
            global: vec![
                format!("verbose={}", flag_str(flags.verbose)),
                format!("TRAVIS_TAG={tag}"),
            ],
        },
    }
}

/// Baseline and assembled pipeline of one run.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub baseline: Pipeline,
    pub pipeline: Pipeline,
    /// Providers merged into `pipeline`, in order.
    pub providers: Vec<Provider>,
}

impl Assembly {
    /// Whether the assembled pipeline differs from the baseline.
    pub fn needs_deploy(&self) -> bool {
        self.pipeline != self.baseline
    }
}

/// Merge provider plans into a copy of the baseline.
pub fn assemble(baseline: Pipeline, plans: Vec<ProviderPlan>) -> Assembly {
    let mut pipeline = baseline.clone();
    let mut providers = Vec::with_capacity(plans.len());

    for plan in plans {
        match plan.placement {
            Placement::Deploy(deployment) => pipeline.deploy.push(deployment),
            Placement::AfterSuccess(commands) => pipeline
                .after_success
                .get_or_insert_with(Vec::new)
                .extend(commands),
        }
        pipeline.env.global.extend(plan.options);

        info!(provider = %plan.provider, "Deployment to {} accepted", plan.provider);
        providers.push(plan.provider);
    }

    Assembly {
        baseline,
        pipeline,
        providers,
    }
}
