//! Local execution of pipeline steps.
//!
//! Used when no rebuild was triggered and `always_run` is set. Steps run
//! in order with the run's derived variables exported, and stop at the
//! first failure.

use crate::error::{DeployError, Result};
use crate::stage::StepConfig;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::{info, warn};

/// Result of a step execution.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Step name.
    pub step_name: String,

    /// Exit code (0 = success, -1 when killed by a signal).
    pub exit_code: i32,

    /// Duration in milliseconds.
    pub duration_ms: u64,

    /// Whether execution succeeded.
    pub success: bool,
}

impl StepResult {
    /// Whether this step passed (exit code 0).
    pub fn passed(&self) -> bool {
        self.success && self.exit_code == 0
    }
}

/// Outcome of a local build.
#[derive(Debug, Clone)]
pub struct LocalBuild {
    pub steps: Vec<StepResult>,
}

impl LocalBuild {
    /// Every executed step passed.
    pub fn passed(&self) -> bool {
        self.steps.iter().all(StepResult::passed)
    }
}

/// Runs pipeline steps as child processes.
pub struct StepRunner;

impl StepRunner {
    /// Execute a single step and return the result.
    ///
    /// Output is inherited so the step's log lands in the CI job log.
    pub async fn execute_step<'a, I>(config: &StepConfig, exports: I) -> Result<StepResult>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let start = Instant::now();

        let Some((exe, args)) = config.command.split_first() else {
            return Err(DeployError::Step {
                step: config.name.clone(),
                message: "empty command".to_string(),
            });
        };

        let mut child = Command::new(exe)
            .args(args)
            .envs(exports)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let status = if config.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(config.timeout_secs),
                child.wait(),
            )
            .await
            .map_err(|_| DeployError::Step {
                step: config.name.clone(),
                message: format!("timed out after {} seconds", config.timeout_secs),
            })??
        } else {
            child.wait().await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;

        Ok(StepResult {
            step_name: config.name.clone(),
            exit_code: status.code().unwrap_or(-1),
            duration_ms,
            success: status.success(),
        })
    }

    /// Run steps in order, stopping after the first failure.
    pub async fn run_steps<'a, I>(steps: &[StepConfig], exports: I) -> Result<LocalBuild>
    where
        I: IntoIterator<Item = (&'a str, &'a str)> + Clone,
    {
        let mut results = Vec::new();

        for config in steps {
            info!(step = %config.name, command = ?config.command, "Executing step");
            let result = Self::execute_step(config, exports.clone()).await?;
            let passed = result.passed();
            info!(
                step = %result.step_name,
                exit_code = result.exit_code,
                duration_ms = result.duration_ms,
                passed,
                "Step finished"
            );
            results.push(result);

            if !passed {
                warn!(step = %config.name, "Step failed, stopping local build");
                break;
            }
        }

        Ok(LocalBuild { steps: results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(name: &str, command: &[&str]) -> StepConfig {
        StepConfig {
            name: name.to_string(),
            command: command.iter().map(|s| s.to_string()).collect(),
            timeout_secs: 60,
        }
    }

    #[test]
    fn test_step_result_passed() {
        let result = StepResult {
            step_name: "install".to_string(),
            exit_code: 0,
            duration_ms: 100,
            success: true,
        };
        assert!(result.passed());
    }

    #[test]
    fn test_step_result_failed() {
        let result = StepResult {
            step_name: "build".to_string(),
            exit_code: 1,
            duration_ms: 100,
            success: false,
        };
        assert!(!result.passed());
    }

    #[tokio::test]
    async fn test_execute_simple_command() {
        let config = custom("true_test", &["true"]);
        let result = StepRunner::execute_step(&config, std::iter::empty())
            .await
            .expect("execute failed");
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn test_execute_failing_command() {
        let config = custom("false_test", &["false"]);
        let result = StepRunner::execute_step(&config, std::iter::empty())
            .await
            .expect("execute failed");
        assert!(!result.success);
        assert_ne!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn test_exports_reach_child() {
        let config = custom("env_test", &["sh", "-c", "test \"$always_run\" = True"]);
        let exports = [("always_run", "True")];
        let result = StepRunner::execute_step(&config, exports)
            .await
            .expect("execute failed");
        assert!(result.passed());
    }

    #[tokio::test]
    async fn test_empty_command_is_error() {
        let config = custom("empty", &[]);
        let err = StepRunner::execute_step(&config, std::iter::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Step { .. }));
    }

    #[tokio::test]
    async fn test_run_steps_stops_at_failure() {
        let steps = vec![
            custom("first", &["false"]),
            custom("second", &["true"]),
        ];
        let build = StepRunner::run_steps(&steps, std::iter::empty())
            .await
            .unwrap();
        assert_eq!(build.steps.len(), 1);
        assert!(!build.passed());
    }

    #[tokio::test]
    async fn test_run_steps_all_pass() {
        let steps = vec![custom("first", &["true"]), custom("second", &["true"])];
        let build = StepRunner::run_steps(&steps, std::iter::empty())
            .await
            .unwrap();
        let names: Vec<_> = build.steps.iter().map(|s| s.step_name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(build.passed());
    }

    #[tokio::test]
    async fn test_step_timeout_is_error() {
        let mut config = custom("slow", &["sleep", "5"]);
        config.timeout_secs = 1;
        let err = StepRunner::execute_step(&config, std::iter::empty())
            .await
            .unwrap_err();
        assert!(
            matches!(err, DeployError::Step { ref message, .. } if message.contains("timed out"))
        );
    }
}
