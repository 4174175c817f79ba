//! Write-path validation for entry names and YAML text.

use serde_yaml::Value;
use thiserror::Error;

use crate::domain::state::MAX_REFRESH_INTERVAL_MINUTES;

/// Reasons a submitted entry is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("config is not valid YAML: {0}")]
    InvalidYaml(String),

    #[error("specified YAML is valid, but root element is not a mapping; use key-value format for the root element")]
    NonMappingRoot,

    #[error("remote source field '{0}' cannot be empty")]
    MissingRemoteField(&'static str),

    #[error("name '{0}' is used by more than one config")]
    DuplicateName(String),

    #[error("refresh interval of {0} minutes exceeds the maximum of {max} minutes", max = MAX_REFRESH_INTERVAL_MINUTES)]
    IntervalTooLarge(i64),
}

/// Outcome of a YAML check that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YamlCheck {
    /// Mapping-rooted document.
    Valid,
    /// Blank input; allowed, but worth a warning.
    Empty,
}

impl YamlCheck {
    pub fn message(&self) -> &'static str {
        match self {
            YamlCheck::Valid => "YAML config is valid",
            YamlCheck::Empty => "config is empty",
        }
    }
}

/// Validates a config name: anything but empty or whitespace-only.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

/// Validates that `text` is empty or a YAML document with a mapping root.
///
/// Syntax errors and non-mapping roots are reported separately because every
/// consumer assumes mapping-shaped configuration.
pub fn validate_yaml_text(text: &str) -> Result<YamlCheck, ValidationError> {
    if text.trim().is_empty() {
        return Ok(YamlCheck::Empty);
    }

    let root: Value =
        serde_yaml::from_str(text).map_err(|e| ValidationError::InvalidYaml(e.to_string()))?;

    match root {
        Value::Mapping(_) => Ok(YamlCheck::Valid),
        _ => Err(ValidationError::NonMappingRoot),
    }
}

/// Rejects a blank required field of a remote source descriptor.
pub fn require_field(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingRemoteField(field));
    }
    Ok(())
}

/// Accepts any interval up to [`MAX_REFRESH_INTERVAL_MINUTES`]; `<= 0` means disabled.
pub fn validate_refresh_interval(minutes: i64) -> Result<(), ValidationError> {
    if minutes > MAX_REFRESH_INTERVAL_MINUTES {
        return Err(ValidationError::IntervalTooLarge(minutes));
    }
    Ok(())
}
