//! unideploy core - deployment pipeline resolution for tagged CI builds
//!
//! Turns a `.deploy.ini` configuration plus the CI runner's environment into
//! a pipeline descriptor:
//! - Derives the run's flags once into an explicit [`Environment`]
//! - Builds the docs, releases and asset store stanzas
//! - Assembles them onto a baseline and skips when nothing changed
//! - Requests a rebuild or falls through to the local build steps

pub mod artifact;
pub mod assemble;
pub mod builders;
pub mod descriptor;
pub mod env;
pub mod error;
pub mod fakes;
pub mod gate;
pub mod github;
pub mod plan;
pub mod runner;
pub mod schema;
pub mod stage;
pub mod tag;
pub mod telemetry;
pub mod trigger;

// Re-export key types
pub use assemble::{assemble, baseline, Assembly};
pub use builders::{BuildContext, DescriptorBuilder};
pub use descriptor::{Deployment, Pipeline, Placement, Provider, ProviderPlan};
pub use env::{DerivedFlags, Environment, RepoSlug};
pub use error::{DeployError, Result};
pub use gate::{DeployGate, GateVerdict};
pub use github::{GithubClient, RepoMetadata};
pub use plan::{CheckReport, DeployPipeline, PlanReport, RunOutcome};
pub use runner::{LocalBuild, StepResult, StepRunner};
pub use stage::{BuildStep, StepConfig, DEFAULT_SCRIPTS_DIR};
pub use telemetry::init_tracing;
pub use trigger::{BuildTrigger, TravisClient, TriggerOutcome};
pub use unideploy_ini::Config;
