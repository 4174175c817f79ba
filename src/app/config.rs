//! Settings discovery and context assembly for the binary and library callers.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::app::{AppContext, ConfigRegistry};
use crate::domain::{AppError, Settings};
use crate::services::{GitHubRepository, JsonFileRegistryStore, SettingsCredentialProvider};

/// Environment variable naming the settings file.
pub const SETTINGS_ENV: &str = "YAMLPROPS_SETTINGS";

/// Settings file looked up in the working directory when nothing else is given.
pub const DEFAULT_SETTINGS_FILE: &str = "yamlprops.toml";

/// Load settings from `path`, `$YAMLPROPS_SETTINGS`, or `./yamlprops.toml`, in that order.
///
/// An explicitly named file must exist. Without one, a missing default file yields defaults.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, AppError> {
    let explicit = path.map(Path::to_path_buf).or_else(|| env::var_os(SETTINGS_ENV).map(PathBuf::from));

    let (path, required) = match explicit {
        Some(path) => (path, true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };

    if !path.exists() {
        if required {
            return Err(AppError::config_error(format!(
                "Settings file not found: {}",
                path.display()
            )));
        }
        debug!(path = %path.display(), "no settings file; using defaults");
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(&path)?;
    let settings = Settings::parse(&content)?;
    debug!(path = %path.display(), credentials = settings.credentials.len(), "settings loaded");
    Ok(settings)
}

/// Wire the registry, GitHub client, and credentials described by `settings`.
///
/// `state_path` overrides `storage.state_path`.
pub fn open_context(settings: &Settings, state_path: Option<&Path>) -> Result<AppContext, AppError> {
    let state_path = state_path.unwrap_or(&settings.storage.state_path);
    let registry = ConfigRegistry::open(JsonFileRegistryStore::new(state_path))?;
    let repository = GitHubRepository::new(&settings.github)?;
    let credentials = SettingsCredentialProvider::new(settings.credentials.clone());

    Ok(AppContext::new(Arc::new(registry), Arc::new(repository), Arc::new(credentials)))
}
