//! Process settings loaded from `yamlprops.toml`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::AppError;

/// Top-level settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub github: GitHubSettings,
    /// Credentials keyed by the id remote sources refer to.
    #[serde(default)]
    pub credentials: BTreeMap<String, CredentialSettings>,
}

impl Settings {
    /// Parse settings from TOML content and validate them.
    pub fn parse(content: &str) -> Result<Self, AppError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.storage.validate()?;
        self.github.validate()?;
        for (id, credential) in &self.credentials {
            credential.validate(id)?;
        }
        Ok(())
    }
}

/// Where registry state lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSettings {
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self { state_path: default_state_path() }
    }
}

impl StorageSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.state_path.as_os_str().is_empty() {
            return Err(AppError::config_error("storage.state_path must not be empty"));
        }
        Ok(())
    }
}

fn default_state_path() -> PathBuf {
    PathBuf::from(".yamlprops/state.json")
}

/// GitHub API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitHubSettings {
    #[serde(default = "default_api_url")]
    pub api_url: Url,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl GitHubSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.timeout_secs == 0 {
            return Err(AppError::config_error("github.timeout_secs must be greater than 0"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(AppError::config_error("github.user_agent must not be empty"));
        }
        Ok(())
    }
}

fn default_api_url() -> Url {
    Url::parse("https://api.github.com").expect("Default API URL must be valid")
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("yamlprops/", env!("CARGO_PKG_VERSION")).to_string()
}

/// A credential given inline or through an environment variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialSettings {
    pub token: Option<String>,
    pub token_env: Option<String>,
}

impl CredentialSettings {
    pub fn validate(&self, id: &str) -> Result<(), AppError> {
        match (&self.token, &self.token_env) {
            (Some(_), Some(_)) => Err(AppError::config_error(format!(
                "credentials.{id}: set either token or token_env, not both"
            ))),
            (None, None) => Err(AppError::config_error(format!(
                "credentials.{id}: one of token or token_env is required"
            ))),
            _ => Ok(()),
        }
    }
}
