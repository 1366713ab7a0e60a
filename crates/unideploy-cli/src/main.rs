//! unideploy - deployment planner for tagged CI builds
//!
//! ## Commands
//!
//! - `run`: derive flags, build descriptors, trigger the rebuild or run the local build
//! - `plan`: print the assembled pipeline as JSON without side effects
//! - `check`: type-check `.deploy.ini` without the CI environment

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, Level};

use unideploy_core::stage::local_steps;
use unideploy_core::{
    DeployError, DeployPipeline, Environment, GithubClient, PlanReport, RunOutcome, TravisClient,
    DEFAULT_SCRIPTS_DIR,
};
use unideploy_ini::Config;

#[derive(Parser)]
#[command(name = "unideploy")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deployment planner for tagged CI builds", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Deployment configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "UNIDEPLOY_CONFIG",
        default_value = ".deploy.ini"
    )]
    config: PathBuf,

    /// Directory holding the pipeline's shell steps
    #[arg(long, global = true, env = "UNIDEPLOY_SCRIPTS_DIR", default_value = DEFAULT_SCRIPTS_DIR)]
    scripts_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the pipeline, then trigger a rebuild or run the local build
    Run {
        /// Timeout per local build step in seconds (0 = none)
        #[arg(long, env = "UNIDEPLOY_STEP_TIMEOUT", default_value = "0")]
        step_timeout: u64,
    },

    /// Print the assembled pipeline as JSON
    Plan,

    /// Validate the configuration file
    Check,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    unideploy_core::init_tracing(cli.json, level);

    match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", diagnostic(&err));
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Run { step_timeout } => cmd_run(&config, &cli.scripts_dir, step_timeout).await,
        Commands::Plan => cmd_plan(&config, &cli.scripts_dir).await,
        Commands::Check => cmd_check(&config, &cli.config),
    }
}

fn load_config(path: &Path) -> Result<Config> {
    Config::read(path).with_context(|| format!("Failed to load configuration {:?}", path))
}

async fn prepare(
    config: &Config,
    env: &mut Environment,
    scripts_dir: &str,
) -> Result<PlanReport> {
    let github = GithubClient::new(env.gh_token().map(str::to_string))?;
    let report = DeployPipeline::prepare(config, env, &github, scripts_dir)
        .await
        .context("Failed to resolve the deployment pipeline")?;
    Ok(report)
}

async fn cmd_run(config: &Config, scripts_dir: &str, step_timeout: u64) -> Result<ExitCode> {
    let mut env = Environment::from_process();
    let report = prepare(config, &mut env, scripts_dir).await?;

    let steps = local_steps(scripts_dir, step_timeout);
    let outcome = DeployPipeline::execute(&report, &mut env, travis_client, &steps).await?;
    match &outcome {
        RunOutcome::Triggered => info!("Rebuild requested, deployment continues there"),
        RunOutcome::BuildSkipped => info!("Nothing to deploy"),
        RunOutcome::LocalBuild(build) => info!(
            steps = build.steps.len(),
            passed = build.passed(),
            "Local build finished"
        ),
    }

    Ok(exit_code(outcome.exit_code()))
}

/// Rebuild trigger for the repository and branch under build.
fn travis_client(env: &Environment) -> unideploy_core::Result<TravisClient> {
    TravisClient::new(env.repo_slug()?, env.branch()?)
}

async fn cmd_plan(config: &Config, scripts_dir: &str) -> Result<ExitCode> {
    let mut env = Environment::from_process();
    let report = prepare(config, &mut env, scripts_dir).await?;

    match &report.assembly {
        Some(assembly) => {
            println!("{}", serde_json::to_string_pretty(&assembly.pipeline)?);
            if !assembly.needs_deploy() {
                eprintln!("Pipeline equals the baseline: nothing to deploy");
            }
        }
        None => {
            eprintln!("{}", report.gate.message);
            for violation in &report.gate.violations {
                eprintln!("  - {}", violation);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_check(config: &Config, path: &Path) -> Result<ExitCode> {
    let report = DeployPipeline::check(config)
        .with_context(|| format!("Invalid configuration {:?}", path))?;

    println!("Configuration: {:?} (schema {})", path, report.schema);
    if report.enabled.is_empty() {
        println!("No provider enabled");
    }
    for provider in &report.enabled {
        println!("  enabled: {}", provider);
    }

    Ok(ExitCode::SUCCESS)
}

fn exit_code(code: i32) -> ExitCode {
    if code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Human-readable error report printed before a failing exit.
fn diagnostic(err: &anyhow::Error) -> String {
    let mut out = String::from("unideploy failed\n");
    for (depth, cause) in err.chain().enumerate() {
        out.push_str(&format!("  {}: {}\n", depth, cause));
    }

    if let Some(DeployError::Http {
        status,
        url,
        history,
    }) = err.downcast_ref::<DeployError>()
    {
        out.push_str(&format!("  status:  {}\n  url:     {}\n", status, url));
        for previous in history {
            out.push_str(&format!("  history: {}\n", previous));
        }
    }

    out
}
