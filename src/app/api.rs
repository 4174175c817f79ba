//! Consumer query surface and administrative write surface.
//!
//! Query functions write progress lines to a caller-supplied listener (a build log,
//! a terminal) and hand back owned data only.

use std::collections::HashSet;
use std::io::Write;

use serde::Deserialize;
use tracing::{info, warn};

use crate::app::{AppContext, ConfigRegistry};
use crate::domain::{
    AppError, ConfigEntry, ConfigMap, ConfigSource, EntryRecord, RemoteSource, ValidationError,
    YamlCheck, validate_name, validate_refresh_interval, validate_yaml_text,
};

const LOG_PREFIX: &str = "[yamlprops]";

// =============================================================================
// Query surface
// =============================================================================

/// Isolated mapping of the named config; `None` or an empty name selects the default.
pub fn get_config(
    registry: &ConfigRegistry,
    name: Option<&str>,
    log: &mut dyn Write,
) -> Result<ConfigMap, AppError> {
    let name = name.filter(|n| !n.is_empty());
    let snapshot = registry.snapshot(name)?;

    match name {
        Some(name) => writeln!(log, "{LOG_PREFIX} Obtaining configuration for {name}")?,
        None => {
            writeln!(log, "{LOG_PREFIX} Obtaining default configuration ({})", snapshot.name)?
        }
    }

    if snapshot.is_empty() {
        warn!(entry = %snapshot.name, "returned configuration is empty");
        writeln!(log, "{LOG_PREFIX} Warning: Configuration is empty")?;
    }
    Ok(snapshot.values)
}

pub fn get_config_names(
    registry: &ConfigRegistry,
    log: &mut dyn Write,
) -> Result<Vec<String>, AppError> {
    let names = registry.names();
    warn_if_empty(log, names.is_empty(), "No configs are defined")?;
    Ok(names)
}

pub fn get_categories(
    registry: &ConfigRegistry,
    log: &mut dyn Write,
) -> Result<Vec<String>, AppError> {
    let categories: Vec<String> = registry.categories().into_iter().collect();
    warn_if_empty(log, categories.is_empty(), "No categories are defined")?;
    Ok(categories)
}

pub fn get_config_names_by_category(
    registry: &ConfigRegistry,
    category: &str,
    log: &mut dyn Write,
) -> Result<Vec<String>, AppError> {
    let names = registry.names_by_category(category);
    warn_if_empty(log, names.is_empty(), &format!("No configs in category '{category}'"))?;
    Ok(names)
}

fn warn_if_empty(log: &mut dyn Write, empty: bool, message: &str) -> Result<(), AppError> {
    if empty {
        writeln!(log, "{LOG_PREFIX} Warning: {message}")?;
    }
    Ok(())
}

// =============================================================================
// Administrative write surface
// =============================================================================

/// A full replacement of the registry as submitted by an administrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigBatch {
    #[serde(default)]
    pub refresh_interval_minutes: Option<i64>,
    #[serde(default)]
    pub configs: Vec<EntryRecord>,
}

impl ConfigBatch {
    pub fn from_yaml(content: &str) -> Result<Self, AppError> {
        serde_yaml::from_str(content)
            .map_err(|e| AppError::config_error(format!("Invalid config batch: {}", e)))
    }
}

/// Result of a committed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub entries: usize,
    /// Non-fatal notes, such as configs that are empty.
    pub warnings: Vec<String>,
}

/// Check every entry of a batch without touching the registry.
///
/// Returns warnings for empty inline configs; any hard failure rejects the batch.
pub fn validate_batch(batch: &ConfigBatch) -> Result<Vec<String>, AppError> {
    if let Some(minutes) = batch.refresh_interval_minutes {
        validate_refresh_interval(minutes)?;
    }

    let mut warnings = Vec::new();
    let mut seen = HashSet::new();

    for record in &batch.configs {
        validate_name(&record.name).map_err(|e| AppError::invalid_entry(&record.name, e))?;
        if !seen.insert(record.name.as_str()) {
            return Err(AppError::invalid_entry(
                &record.name,
                ValidationError::DuplicateName(record.name.clone()),
            ));
        }

        match &record.source {
            ConfigSource::Inline(inline) => {
                let check = validate_yaml_text(&inline.text)
                    .map_err(|e| AppError::invalid_entry(&record.name, e))?;
                if check == YamlCheck::Empty {
                    warnings.push(format!("{}: {}", record.name, check.message()));
                }
            }
            ConfigSource::Remote(remote) => {
                remote.validate().map_err(|e| AppError::invalid_entry(&record.name, e))?;
            }
        }
    }

    Ok(warnings)
}

/// Validate a batch and, only if every entry passes, replace the registry with it.
pub fn submit(registry: &ConfigRegistry, batch: ConfigBatch) -> Result<SubmitOutcome, AppError> {
    let warnings = validate_batch(&batch)?;
    let ConfigBatch { refresh_interval_minutes, configs } = batch;
    let count = configs.len();

    // Carry-over reads the entries being replaced, under the registry's writer lock.
    registry.replace_with(
        |current| {
            configs
                .into_iter()
                .map(|record| {
                    let source = match record.source {
                        ConfigSource::Remote(remote) => {
                            ConfigSource::Remote(carry_cached_text(remote, &record.name, current))
                        }
                        inline => inline,
                    };
                    ConfigEntry::new(record.name, record.category, source)
                })
                .collect()
        },
        refresh_interval_minutes,
    )?;
    info!(entries = count, "config batch applied");

    Ok(SubmitOutcome { entries: count, warnings })
}

/// Keep previously fetched text when a remote entry is resubmitted unchanged.
fn carry_cached_text(mut remote: RemoteSource, name: &str, current: &[ConfigEntry]) -> RemoteSource {
    remote.cached_text = current
        .iter()
        .find(|entry| entry.name() == name)
        .and_then(|entry| match entry.source() {
            ConfigSource::Remote(old) if old.same_location(&remote) => old.cached_text.clone(),
            _ => None,
        });
    remote
}

// =============================================================================
// Remote checks
// =============================================================================

/// What a one-off fetch of a remote descriptor returned.
#[derive(Debug)]
pub struct RemoteCheck {
    pub text: String,
    pub check: Result<YamlCheck, ValidationError>,
}

/// Fetch a remote descriptor once, without storing anything, and validate the text.
pub fn check_remote(context: &AppContext, source: &RemoteSource) -> Result<RemoteCheck, AppError> {
    source.validate()?;
    let text = source.fetch(context.repository(), context.credentials())?;
    let check = validate_yaml_text(&text);
    Ok(RemoteCheck { text, check })
}
