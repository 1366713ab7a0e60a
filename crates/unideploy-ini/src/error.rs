//! Error types for unideploy-ini

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or querying a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file does not exist
    #[error("configuration file not found: {}", path.display())]
    ConfigMissing { path: PathBuf },

    /// Requested section is absent
    #[error("no section [{section}] in configuration")]
    SectionMissing { section: String },

    /// Requested key is absent from the section (and from [DEFAULT])
    #[error("no key '{key}' in section [{section}]")]
    KeyMissing { section: String, key: String },

    /// Value is not in the boolean vocabulary
    #[error("not a boolean: [{section}] {key} = '{value}'")]
    InvalidBool {
        section: String,
        key: String,
        value: String,
    },

    /// Malformed line
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
