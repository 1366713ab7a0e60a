//! Deployment orchestration.
//!
//! [`DeployPipeline::prepare`] turns configuration and environment into an
//! assembled pipeline without side effects beyond the derived variables and
//! repository lookups. [`DeployPipeline::execute`] then either hands the
//! pipeline to the CI provider or falls through to the local build steps.

use crate::assemble::{assemble, baseline, Assembly};
use crate::builders::{build_all, default_builders, validate_all, BuildContext};
use crate::descriptor::Provider;
use crate::env::{flag_str, DerivedFlags, Environment, GH_TOKEN, WAIT_TO_DEPLOY};
use crate::error::Result;
use crate::gate::{DeployGate, GateVerdict};
use crate::github::RepoMetadata;
use crate::runner::{LocalBuild, StepRunner};
use crate::schema::check_schema;
use crate::stage::StepConfig;
use crate::telemetry::{
    emit_gate_evaluated, emit_local_build_finished, emit_plan_assembled, emit_trigger_finished,
};
use crate::trigger::{BuildTrigger, TriggerOutcome};
use std::time::Instant;
use tracing::info;
use unideploy_ini::Config;

/// Everything decided before any outbound side effect.
#[derive(Debug, Clone)]
pub struct PlanReport {
    pub schema: u32,
    pub flags: DerivedFlags,
    pub gate: GateVerdict,
    /// `None` when the gate refused deployment.
    pub assembly: Option<Assembly>,
}

impl PlanReport {
    /// Whether the assembled pipeline has anything to deploy.
    pub fn needs_deploy(&self) -> bool {
        self.assembly.as_ref().is_some_and(Assembly::needs_deploy)
    }
}

/// Static validation result of a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub schema: u32,
    pub enabled: Vec<Provider>,
}

/// How a run ended.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The CI provider accepted the rebuild; nothing else runs here.
    Triggered,
    /// Local build steps ran.
    LocalBuild(LocalBuild),
    /// Nothing to deploy and `always_run` is off.
    BuildSkipped,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Triggered | RunOutcome::BuildSkipped => 0,
            RunOutcome::LocalBuild(build) if build.passed() => 0,
            RunOutcome::LocalBuild(_) => 1,
        }
    }
}

/// Deployment orchestrator.
pub struct DeployPipeline;

impl DeployPipeline {
    /// Type-check the configuration without touching the environment.
    pub fn check(config: &Config) -> Result<CheckReport> {
        let schema = check_schema(config)?;
        let enabled = validate_all(&default_builders(), config)?;
        Ok(CheckReport { schema, enabled })
    }

    /// Derive flags, evaluate the gate, then build and assemble descriptors.
    pub async fn prepare(
        config: &Config,
        env: &mut Environment,
        metadata: &dyn RepoMetadata,
        scripts_dir: &str,
    ) -> Result<PlanReport> {
        let schema = check_schema(config)?;
        let flags = env.derive(config)?;

        let gate = DeployGate::evaluate(env)?;
        emit_gate_evaluated(gate.passed, &gate.violations);
        if !gate.passed {
            info!(violations = ?gate.violations, "{}", gate.message);
            return Ok(PlanReport {
                schema,
                flags,
                gate,
                assembly: None,
            });
        }

        let ctx = BuildContext {
            config,
            env: &*env,
            flags: &flags,
            scripts_dir,
            metadata,
        };
        let plans = build_all(&default_builders(), &ctx).await?;
        let assembly = assemble(baseline(scripts_dir, &flags, env.tag()?), plans);
        emit_plan_assembled(&assembly.providers, assembly.needs_deploy());

        Ok(PlanReport {
            schema,
            flags,
            gate,
            assembly: Some(assembly),
        })
    }

    /// Trigger the rebuild or run the local build steps.
    ///
    /// `make_trigger` is only called when there is something to deploy, so
    /// a skipped run never reads the variables a trigger client needs.
    pub async fn execute<T, F>(
        report: &PlanReport,
        env: &mut Environment,
        make_trigger: F,
        steps: &[StepConfig],
    ) -> Result<RunOutcome>
    where
        T: BuildTrigger,
        F: FnOnce(&Environment) -> Result<T>,
    {
        if let Some(assembly) = report.assembly.as_ref().filter(|a| a.needs_deploy()) {
            env.set_once(WAIT_TO_DEPLOY, flag_str(true))?;
            let trigger = make_trigger(&*env)?;
            let token = env.get(GH_TOKEN)?;

            match trigger.trigger(token, &assembly.pipeline).await? {
                TriggerOutcome::Accepted => {
                    emit_trigger_finished(true, 202);
                    return Ok(RunOutcome::Triggered);
                }
                TriggerOutcome::Unaccepted { status } => {
                    emit_trigger_finished(false, status);
                }
            }
        } else {
            info!("Pipeline matches baseline, nothing to deploy");
        }

        if !report.flags.always_run {
            info!("always_run is off, skipping local build");
            return Ok(RunOutcome::BuildSkipped);
        }

        let start = Instant::now();
        let exports: Vec<(&str, &str)> = env.exports().collect();
        let build = StepRunner::run_steps(steps, exports.iter().copied()).await?;
        emit_local_build_finished(build.steps.len(), build.passed());
        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Local build finished"
        );

        Ok(RunOutcome::LocalBuild(build))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{TRAVIS_PULL_REQUEST, TRAVIS_TAG};
    use crate::fakes::{RecordingTrigger, StaticMetadata};
    use crate::runner::StepResult;

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunOutcome::Triggered.exit_code(), 0);
        assert_eq!(RunOutcome::BuildSkipped.exit_code(), 0);

        let failed = LocalBuild {
            steps: vec![StepResult {
                step_name: "build".to_string(),
                exit_code: 2,
                duration_ms: 5,
                success: false,
            }],
        };
        assert_eq!(RunOutcome::LocalBuild(failed).exit_code(), 1);
        assert_eq!(
            RunOutcome::LocalBuild(LocalBuild { steps: vec![] }).exit_code(),
            0
        );
    }

    #[tokio::test]
    async fn test_gated_run_without_slug_is_skipped() {
        let config = Config::parse("[Misc]\nverbose = no\nalways_run = no\n").unwrap();
        let mut env = Environment::from_pairs([(TRAVIS_PULL_REQUEST, "5"), (TRAVIS_TAG, "")]);
        let metadata = StaticMetadata::new("");

        let report = DeployPipeline::prepare(&config, &mut env, &metadata, "./.deploy/travis")
            .await
            .unwrap();
        assert!(!report.gate.passed);

        let mut factory_called = false;
        let outcome = DeployPipeline::execute(
            &report,
            &mut env,
            |env: &Environment| {
                factory_called = true;
                crate::trigger::TravisClient::new(env.repo_slug()?, env.branch()?)
            },
            &[],
        )
        .await
        .unwrap();

        assert!(matches!(outcome, RunOutcome::BuildSkipped));
        assert_eq!(outcome.exit_code(), 0);
        assert!(!factory_called);
    }

    #[tokio::test]
    async fn test_trigger_built_only_when_deploying() {
        let config = Config::parse(
            "[Misc]\nverbose = no\nalways_run = no\n[Asset]\nenable = yes\nbranch =\n",
        )
        .unwrap();
        let mut env = Environment::from_pairs([
            ("TRAVIS_REPO_SLUG", "octo/widgets"),
            ("TRAVIS_BRANCH", "release"),
            (TRAVIS_TAG, "v1.0.0"),
            (TRAVIS_PULL_REQUEST, "false"),
            ("GH_TOKEN", "gh-secret"),
        ]);
        let metadata = StaticMetadata::new("");
        let trigger = RecordingTrigger::accepting();

        let report = DeployPipeline::prepare(&config, &mut env, &metadata, "./.deploy/travis")
            .await
            .unwrap();
        let outcome =
            DeployPipeline::execute(&report, &mut env, |_: &Environment| Ok(&trigger), &[])
                .await
                .unwrap();

        assert!(matches!(outcome, RunOutcome::Triggered));
        assert_eq!(trigger.sent().len(), 1);
    }

    #[test]
    fn test_check_reports_enabled_providers() {
        let config = Config::parse(
            "[Misc]\nverbose = no\nalways_run = no\nschema = 2\n\
             [Asset]\nenable = yes\nbranch = master\n[Docs]\nenable = no\n",
        )
        .unwrap();
        let report = DeployPipeline::check(&config).unwrap();
        assert_eq!(report.schema, 2);
        assert_eq!(report.enabled, vec![Provider::AssetStore]);
    }
}
