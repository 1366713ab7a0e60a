//! Deployment gate: whether this build may deploy at all.

use crate::env::Environment;
use crate::error::Result;

/// Gate evaluation verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateVerdict {
    /// Whether the gate passed.
    pub passed: bool,

    /// Preconditions that failed (empty if passed).
    pub violations: Vec<String>,

    /// Summary message.
    pub message: String,
}

/// Deployment preconditions.
pub struct DeployGate;

impl DeployGate {
    /// Evaluate whether the build may deploy.
    ///
    /// Gate rule:
    /// - the build is not a pull request (`TRAVIS_PULL_REQUEST == "false"`)
    /// - the build is for a non-blank tag
    /// - a GitHub token is available
    ///
    /// `TRAVIS_PULL_REQUEST` and `TRAVIS_TAG` must be set; `GH_TOKEN` may be absent.
    pub fn evaluate(env: &Environment) -> Result<GateVerdict> {
        let mut violations = Vec::new();

        let pull_request = env.pull_request()?;
        if pull_request != "false" {
            violations.push(format!("Build is pull request {}", pull_request));
        }

        if env.tag()?.trim().is_empty() {
            violations.push("Build is not for a tag".to_string());
        }

        if env.gh_token().is_none() {
            violations.push("GH_TOKEN is not set".to_string());
        }

        let passed = violations.is_empty();
        let message = if passed {
            "Deployment preconditions met".to_string()
        } else {
            format!("Deployment skipped: {} precondition(s) failed", violations.len())
        };

        Ok(GateVerdict {
            passed,
            violations,
            message,
        })
    }
}
