//! yamlprops: a shared registry of named YAML configurations, kept inline or
//! fetched from GitHub repositories and refreshed on a schedule.
//!
//! Consumers read isolated snapshots; administrators replace the registry as a
//! whole. State survives restarts through a JSON file.

pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

use std::path::Path;

pub use app::api::{
    ConfigBatch, RemoteCheck, SubmitOutcome, check_remote, get_categories, get_config,
    get_config_names, get_config_names_by_category, submit, validate_batch,
};
pub use app::config::{load_settings, open_context};
pub use app::{
    AppContext, ConfigRegistry, RefreshFailure, RefreshReport, RefreshScheduler, SchedulerOptions,
};
pub use domain::{
    AppError, ConfigEntry, ConfigMap, ConfigSource, ConfigValue, EntryRecord, RemoteSource,
    Settings, Snapshot, ValidationError, YamlCheck,
};

/// Open the registry and remote access described by the settings at `settings_path`.
///
/// Falls back to `$YAMLPROPS_SETTINGS`, then `./yamlprops.toml`, then defaults.
pub fn open(settings_path: Option<&Path>) -> Result<AppContext, AppError> {
    let settings = load_settings(settings_path)?;
    open_context(&settings, None)
}
