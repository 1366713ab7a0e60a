//! Configuration schema versioning.

use crate::error::{DeployError, Result};
use tracing::debug;
use unideploy_ini::Config;

/// The only supported `.deploy.ini` layout.
pub const SUPPORTED_SCHEMA: u32 = 2;

/// Check `[Misc] schema` (default [`SUPPORTED_SCHEMA`]) and return it.
pub fn check_schema(config: &Config) -> Result<u32> {
    let Some(raw) = config.get_opt_string("Misc", "schema")? else {
        return Ok(SUPPORTED_SCHEMA);
    };

    match raw.trim().parse::<u32>() {
        Ok(SUPPORTED_SCHEMA) => {
            debug!(schema = SUPPORTED_SCHEMA, "Configuration schema accepted");
            Ok(SUPPORTED_SCHEMA)
        }
        _ => Err(DeployError::UnsupportedSchema {
            found: raw.to_string(),
            expected: SUPPORTED_SCHEMA,
        }),
    }
}
