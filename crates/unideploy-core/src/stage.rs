//! Pipeline shell steps and their configuration.

/// Default directory of the pipeline's shell steps.
pub const DEFAULT_SCRIPTS_DIR: &str = "./.deploy/travis";

/// Path of a script inside the scripts directory.
pub fn script_path(scripts_dir: &str, script: &str) -> String {
    format!("{}/{}", scripts_dir.trim_end_matches('/'), script)
}

/// Builtin pipeline steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStep {
    /// Install the editor/toolchain
    Install,

    /// Build and package
    Build,

    /// Stage artifacts before deploy providers run
    PreDeploy,
}

impl BuildStep {
    /// Get the step name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            BuildStep::Install => "install",
            BuildStep::Build => "build",
            BuildStep::PreDeploy => "pre_deploy",
        }
    }

    /// Script file implementing the step.
    pub fn script(&self) -> &'static str {
        match self {
            BuildStep::Install => "unity_install.sh",
            BuildStep::Build => "unity_build.sh",
            BuildStep::PreDeploy => "pre_deploy.sh",
        }
    }

    /// Command line as it appears in the pipeline descriptor.
    pub fn shell_line(&self, scripts_dir: &str) -> String {
        format!("sh {}", script_path(scripts_dir, self.script()))
    }

    /// Command as an argv vector.
    pub fn command(&self, scripts_dir: &str) -> Vec<String> {
        vec!["sh".to_string(), script_path(scripts_dir, self.script())]
    }
}

/// Steps run locally when no rebuild was triggered.
pub const LOCAL_STEPS: [BuildStep; 2] = [BuildStep::Install, BuildStep::Build];

/// Configuration for a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepConfig {
    /// Human-readable step name.
    pub name: String,

    /// Command to execute (first element is executable).
    pub command: Vec<String>,

    /// Timeout in seconds, 0 for none.
    pub timeout_secs: u64,
}

impl StepConfig {
    /// Create a step configuration from a builtin step.
    pub fn from_builtin(step: BuildStep, scripts_dir: &str, timeout_secs: u64) -> Self {
        Self {
            name: step.name().to_string(),
            command: step.command(scripts_dir),
            timeout_secs,
        }
    }
}

/// Configurations for [`LOCAL_STEPS`].
pub fn local_steps(scripts_dir: &str, timeout_secs: u64) -> Vec<StepConfig> {
    LOCAL_STEPS
        .iter()
        .map(|step| StepConfig::from_builtin(*step, scripts_dir, timeout_secs))
        .collect()
}
