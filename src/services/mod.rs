mod github_repository;
mod json_registry_store;
mod settings_credentials;

pub use github_repository::GitHubRepository;
pub use json_registry_store::JsonFileRegistryStore;
pub use settings_credentials::SettingsCredentialProvider;
