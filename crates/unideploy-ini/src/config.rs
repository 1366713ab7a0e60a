//! Loaded configuration and typed accessors.

use crate::error::{ConfigError, Result};
use crate::parse::parse;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Section whose keys are visible from every other section.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Keys of one section. A key written without a value maps to `None`.
pub type Section = BTreeMap<String, Option<String>>;

const TRUTHY: [&str; 4] = ["1", "yes", "true", "on"];
const FALSY: [&str; 4] = ["0", "no", "false", "off"];

/// Immutable `(section, key) -> value` mapping loaded from an INI file.
///
/// Section names are case-sensitive, key names are not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    defaults: Section,
    sections: BTreeMap<String, Section>,
}

impl Config {
    /// Load a configuration file from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::ConfigMissing {
                path: path.to_path_buf(),
            });
        }

        let text = std::fs::read_to_string(path)?;
        let config = Self::parse(&text)?;
        debug!(path = %path.display(), sections = config.sections.len(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration text.
    pub fn parse(text: &str) -> Result<Self> {
        let parsed = parse(text)?;
        Ok(Self {
            defaults: parsed.defaults,
            sections: parsed.sections,
        })
    }

    /// Whether a named section exists.
    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Names of all sections, sorted.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Raw lookup: `Ok(None)` for a key present without a value.
    fn lookup(&self, section: &str, key: &str) -> Result<Option<&str>> {
        let entries = self
            .sections
            .get(section)
            .ok_or_else(|| ConfigError::SectionMissing {
                section: section.to_string(),
            })?;

        let key = key.to_lowercase();
        entries
            .get(&key)
            .or_else(|| self.defaults.get(&key))
            .map(|value| value.as_deref())
            .ok_or_else(|| ConfigError::KeyMissing {
                section: section.to_string(),
                key: key.clone(),
            })
    }

    /// String value; empty when the key has no value.
    pub fn get_string(&self, section: &str, key: &str) -> Result<&str> {
        Ok(self.lookup(section, key)?.unwrap_or(""))
    }

    /// String value for an optional key: `None` when the key is absent.
    ///
    /// A missing section is still an error.
    pub fn get_opt_string(&self, section: &str, key: &str) -> Result<Option<&str>> {
        match self.lookup(section, key) {
            Ok(value) => Ok(Some(value.unwrap_or(""))),
            Err(ConfigError::KeyMissing { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Boolean value for an optional key: `None` when the key is absent.
    pub fn get_opt_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        match self.get_bool(section, key) {
            Ok(value) => Ok(Some(value)),
            Err(ConfigError::KeyMissing { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Boolean value using the `1/yes/true/on` and `0/no/false/off` vocabulary.
    pub fn get_bool(&self, section: &str, key: &str) -> Result<bool> {
        let value = self.lookup(section, key)?;
        let invalid = || ConfigError::InvalidBool {
            section: section.to_string(),
            key: key.to_lowercase(),
            value: value.unwrap_or("").to_string(),
        };

        let Some(raw) = value else {
            return Err(invalid());
        };
        let normalized = raw.to_lowercase();
        if TRUTHY.contains(&normalized.as_str()) {
            Ok(true)
        } else if FALSY.contains(&normalized.as_str()) {
            Ok(false)
        } else {
            Err(invalid())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
[DEFAULT]
include_version = no

[Misc]
verbose = True
always_run = off

[Github]
Enable = yes
branch =
title
description = My package ; trailing comment
";

    #[test]
    fn test_get_bool_vocabulary() {
        let config = Config::parse(SAMPLE).unwrap();
        assert!(config.get_bool("Misc", "verbose").unwrap());
        assert!(!config.get_bool("Misc", "always_run").unwrap());
        assert!(config.get_bool("Github", "enable").unwrap());
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let config = Config::parse(SAMPLE).unwrap();
        assert!(config.get_bool("Github", "ENABLE").unwrap());
    }

    #[test]
    fn test_sections_are_case_sensitive() {
        let config = Config::parse(SAMPLE).unwrap();
        let err = config.get_bool("github", "enable").unwrap_err();
        assert!(matches!(err, ConfigError::SectionMissing { .. }));
    }

    #[test]
    fn test_get_string_empty_and_valueless() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.get_string("Github", "branch").unwrap(), "");
        assert_eq!(config.get_string("Github", "title").unwrap(), "");
        assert_eq!(
            config.get_string("Github", "description").unwrap(),
            "My package"
        );
    }

    #[test]
    fn test_default_section_fallback() {
        let config = Config::parse(SAMPLE).unwrap();
        assert!(!config.get_bool("Github", "include_version").unwrap());
        assert!(!config.has_section(DEFAULT_SECTION));
    }

    #[test]
    fn test_missing_key() {
        let config = Config::parse(SAMPLE).unwrap();
        let err = config.get_string("Github", "packagename").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::KeyMissing { ref section, ref key }
                if section == "Github" && key == "packagename"
        ));
    }

    #[test]
    fn test_invalid_bool() {
        let config = Config::parse("[Github]\ndraft = maybe\nprerelease\n").unwrap();
        let err = config.get_bool("Github", "draft").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { ref value, .. } if value == "maybe"));

        let err = config.get_bool("Github", "prerelease").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { .. }));
    }

    #[test]
    fn test_get_opt_string() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.get_opt_string("Misc", "schema").unwrap(), None);
        assert_eq!(config.get_opt_string("Github", "title").unwrap(), Some(""));
        assert!(config.get_opt_string("Asset", "enable").is_err());
    }

    #[test]
    fn test_get_opt_bool() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.get_opt_bool("Misc", "verbose").unwrap(), Some(true));
        assert_eq!(config.get_opt_bool("Misc", "packagename").unwrap(), None);
        assert!(config.get_opt_bool("Github", "title").is_err());
    }
}
