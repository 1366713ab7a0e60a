//! Error taxonomy for deployment planning.

use unideploy_ini::ConfigError;

/// Deployment planning and triggering errors.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("environment variable {0} is not set")]
    EnvMissing(String),

    #[error("environment variable {name} is already set to '{existing}', refusing to overwrite")]
    EnvConflict { name: String, existing: String },

    #[error("invalid repository slug '{0}', expected owner/repo")]
    InvalidSlug(String),

    #[error("invalid value for [{section}] {key}: '{value}' (expected one of {expected})")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        expected: String,
    },

    #[error("unsupported configuration schema '{found}', expected {expected}")]
    UnsupportedSchema { found: String, expected: u32 },

    #[error("HTTP {status} from {url} (history: {history:?})")]
    Http {
        status: u16,
        url: String,
        history: Vec<String>,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unexpected response from {url}: {message}")]
    Response { url: String, message: String },

    #[error("build step {step} failed: {message}")]
    Step { step: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for deployment operations.
pub type Result<T> = std::result::Result<T, DeployError>;
