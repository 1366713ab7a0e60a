//! unideploy-ini: INI configuration reader
//!
//! Loads the `.deploy.ini` style files that drive a deployment plan and
//! exposes typed accessors per `(section, key)`.
//!
//! ```ignore
//! let config = Config::read(".deploy.ini")?;
//! if config.get_bool("Github", "enable")? {
//!     let branch = config.get_string("Github", "branch")?;
//! }
//! ```

pub mod config;
pub mod error;
mod parse;

pub use config::{Config, Section, DEFAULT_SECTION};
pub use error::{ConfigError, Result};
