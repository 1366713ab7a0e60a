//! Tracing initialisation and structured deployment events.
//!
//! Call [`init_tracing`] once at program start. Later calls are ignored
//! because the global subscriber can only be set once per process.

use crate::descriptor::Provider;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the deploy run's log subscriber.
///
/// Log lines go to stderr so `unideploy plan` keeps stdout for the
/// pipeline JSON. `RUST_LOG` overrides `level`; `json` switches the
/// lines to newline-delimited JSON for CI log collectors.
pub fn init_tracing(json: bool, level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer).try_init()
    };
    if installed.is_err() {
        debug!("Log subscriber already installed");
    }
}

/// Emit event: deployment gate evaluated.
pub fn emit_gate_evaluated(passed: bool, violations: &[String]) {
    info!(
        event = "gate.evaluated",
        passed = passed,
        violations = ?violations,
    );
}

/// Emit event: pipeline assembled from the enabled providers.
pub fn emit_plan_assembled(providers: &[Provider], needs_deploy: bool) {
    let providers: Vec<String> = providers.iter().map(ToString::to_string).collect();
    info!(
        event = "plan.assembled",
        providers = ?providers,
        needs_deploy = needs_deploy,
    );
}

/// Emit event: rebuild request answered.
pub fn emit_trigger_finished(accepted: bool, status: u16) {
    if accepted {
        info!(event = "trigger.finished", accepted = accepted, status = status);
    } else {
        warn!(event = "trigger.finished", accepted = accepted, status = status);
    }
}

/// Emit event: local build steps finished.
pub fn emit_local_build_finished(steps: usize, passed: bool) {
    info!(event = "local_build.finished", steps = steps, passed = passed);
}
