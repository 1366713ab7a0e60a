//! Line parser for the INI dialect.

use crate::config::{Section, DEFAULT_SECTION};
use crate::error::{ConfigError, Result};
use std::collections::BTreeMap;

/// Parsed file: the `[DEFAULT]` section plus every named section.
pub(crate) struct Parsed {
    pub defaults: Section,
    pub sections: BTreeMap<String, Section>,
}

pub(crate) fn parse(text: &str) -> Result<Parsed> {
    let mut defaults = Section::new();
    let mut sections: BTreeMap<String, Section> = BTreeMap::new();

    // Name of the section currently being filled, `None` before the first header.
    let mut current: Option<String> = None;
    // Last key seen in the current section, target of continuation lines.
    let mut last_key: Option<String> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r');
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        // Continuation of the previous value
        if line.starts_with(char::is_whitespace) {
            if let (Some(section), Some(key)) = (current.as_deref(), last_key.as_deref()) {
                let target = if section == DEFAULT_SECTION {
                    &mut defaults
                } else {
                    sections.entry(section.to_string()).or_default()
                };
                // Continuation text is taken verbatim, comments included
                if let Some(Some(value)) = target.get_mut(key) {
                    value.push('\n');
                    value.push_str(trimmed);
                    continue;
                }
            }
            return Err(ConfigError::Syntax {
                line: line_no,
                message: "indented line does not continue a value".to_string(),
            });
        }

        if let Some(rest) = trimmed.strip_prefix('[') {
            let name = match rest.find(']') {
                Some(end) if end > 0 => rest[..end].to_string(),
                _ => {
                    return Err(ConfigError::Syntax {
                        line: line_no,
                        message: format!("malformed section header: {trimmed}"),
                    })
                }
            };
            if name != DEFAULT_SECTION {
                sections.entry(name.clone()).or_default();
            }
            current = Some(name);
            last_key = None;
            continue;
        }

        let Some(section) = current.as_deref() else {
            return Err(ConfigError::Syntax {
                line: line_no,
                message: "key defined before any section header".to_string(),
            });
        };

        let (key, value) = split_option(trimmed);
        if key.is_empty() {
            return Err(ConfigError::Syntax {
                line: line_no,
                message: format!("empty key: {trimmed}"),
            });
        }

        let target = if section == DEFAULT_SECTION {
            &mut defaults
        } else {
            sections.entry(section.to_string()).or_default()
        };
        target.insert(key.clone(), value);
        last_key = Some(key);
    }

    Ok(Parsed { defaults, sections })
}

/// Split `key = value` / `key: value` at the first delimiter.
///
/// A line without a delimiter is a key with no value.
fn split_option(line: &str) -> (String, Option<String>) {
    match line.find(['=', ':']) {
        Some(pos) => {
            let key = line[..pos].trim().to_lowercase();
            let value = strip_inline_comment(line[pos + 1..].trim()).to_string();
            (key, Some(value))
        }
        None => (line.to_lowercase(), None),
    }
}

/// Drop an inline comment: only the first `;` is considered, and only when
/// whitespace precedes it.
fn strip_inline_comment(value: &str) -> &str {
    match value.find(';') {
        Some(pos) if value[..pos].ends_with(char::is_whitespace) => value[..pos].trim_end(),
        _ => value,
    }
}
