//! CI runner environment and derived flags.
//!
//! The runner's variables are snapshotted once into an [`Environment`] value
//! that is threaded through the builders. Derived values (`verbose`,
//! `always_run`, `packagename`, `include_version`, `wait_to_deploy`) are
//! written with [`Environment::set_once`]: a name that is already present
//! is an [`DeployError::EnvConflict`], never an overwrite.

use crate::error::{DeployError, Result};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;
use unideploy_ini::Config;

pub const TRAVIS_BRANCH: &str = "TRAVIS_BRANCH";
pub const TRAVIS_TAG: &str = "TRAVIS_TAG";
pub const TRAVIS_COMMIT: &str = "TRAVIS_COMMIT";
pub const TRAVIS_REPO_SLUG: &str = "TRAVIS_REPO_SLUG";
pub const TRAVIS_PULL_REQUEST: &str = "TRAVIS_PULL_REQUEST";
pub const GH_TOKEN: &str = "GH_TOKEN";

pub const VERBOSE: &str = "verbose";
pub const ALWAYS_RUN: &str = "always_run";
pub const PACKAGENAME: &str = "packagename";
pub const INCLUDE_VERSION: &str = "include_version";
pub const WAIT_TO_DEPLOY: &str = "wait_to_deploy";

/// Names written by [`Environment::derive`].
pub const DERIVED_NAMES: [&str; 4] = [VERBOSE, ALWAYS_RUN, PACKAGENAME, INCLUDE_VERSION];

/// Render a flag the way the build scripts compare it (`True` / `False`).
pub fn flag_str(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// `owner/repo` identifier of the repository under build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl RepoSlug {
    pub fn parse(slug: &str) -> Result<Self> {
        match slug.split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(DeployError::InvalidSlug(slug.to_string())),
        }
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Flags derived once per process from `[Misc]` and the runner environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedFlags {
    pub verbose: bool,
    pub always_run: bool,
    /// Package name default for providers; empty means "use the repo name".
    pub packagename: String,
    /// Whether artifact names carry the tag. Always false without a tag.
    pub include_version: bool,
}

/// Snapshot of the CI environment plus values derived during this run.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: BTreeMap<String, String>,
    /// Names written through `set_once`, in write order.
    written: Vec<String>,
    derived: Option<DerivedFlags>,
}

impl Environment {
    /// Snapshot the current process environment.
    pub fn from_process() -> Self {
        Self::from_pairs(std::env::vars())
    }

    /// Build an environment from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            written: Vec::new(),
            derived: None,
        }
    }

    /// Value of a variable, `EnvMissing` if unset.
    pub fn get(&self, name: &str) -> Result<&str> {
        self.get_opt(name)
            .ok_or_else(|| DeployError::EnvMissing(name.to_string()))
    }

    pub fn get_opt(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Write a variable that must not exist yet.
    pub fn set_once(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        if let Some(existing) = self.vars.get(name) {
            return Err(DeployError::EnvConflict {
                name: name.to_string(),
                existing: existing.clone(),
            });
        }
        let value = value.into();
        debug!(name = %name, value = %value, "Setting derived environment variable");
        self.vars.insert(name.to_string(), value);
        self.written.push(name.to_string());
        Ok(())
    }

    /// Variables written during this run, for export to child processes.
    pub fn exports(&self) -> impl Iterator<Item = (&str, &str)> {
        self.written
            .iter()
            .filter_map(|name| self.vars.get_key_value(name))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Compute the derived flags and write them into the environment.
    ///
    /// Runs at most once: a second call, or a runner environment that
    /// already defines one of [`DERIVED_NAMES`], fails with `EnvConflict`
    /// before anything is written.
    pub fn derive(&mut self, config: &Config) -> Result<DerivedFlags> {
        for name in DERIVED_NAMES {
            if let Some(existing) = self.vars.get(name) {
                return Err(DeployError::EnvConflict {
                    name: name.to_string(),
                    existing: existing.clone(),
                });
            }
        }

        let verbose = config.get_bool("Misc", "verbose")?;
        let always_run = config.get_bool("Misc", "always_run")?;
        let packagename = config
            .get_opt_string("Misc", "packagename")?
            .unwrap_or("")
            .to_string();
        let has_tag = !self.tag()?.trim().is_empty();
        let include_version =
            has_tag && config.get_opt_bool("Misc", "include_version")?.unwrap_or(false);

        let flags = DerivedFlags {
            verbose,
            always_run,
            packagename,
            include_version,
        };

        self.set_once(VERBOSE, flag_str(flags.verbose))?;
        self.set_once(ALWAYS_RUN, flag_str(flags.always_run))?;
        self.set_once(PACKAGENAME, flags.packagename.clone())?;
        self.set_once(INCLUDE_VERSION, flag_str(flags.include_version))?;
        self.derived = Some(flags.clone());

        Ok(flags)
    }

    /// Flags computed by [`Environment::derive`], if it has run.
    pub fn derived(&self) -> Option<&DerivedFlags> {
        self.derived.as_ref()
    }

    pub fn repo_slug(&self) -> Result<RepoSlug> {
        RepoSlug::parse(self.get(TRAVIS_REPO_SLUG)?)
    }

    pub fn branch(&self) -> Result<&str> {
        self.get(TRAVIS_BRANCH)
    }

    pub fn tag(&self) -> Result<&str> {
        self.get(TRAVIS_TAG)
    }

    pub fn commit(&self) -> Result<&str> {
        self.get(TRAVIS_COMMIT)
    }

    pub fn pull_request(&self) -> Result<&str> {
        self.get(TRAVIS_PULL_REQUEST)
    }

    pub fn gh_token(&self) -> Option<&str> {
        self.get_opt(GH_TOKEN)
    }
}
