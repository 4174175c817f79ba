pub mod entry;
pub mod error;
pub mod settings;
pub mod snapshot;
pub mod source;
pub mod state;
pub mod validation;

pub use entry::{ConfigEntry, EntryRecord, FetchedText, parse_mapping};
pub use error::AppError;
pub use settings::{CredentialSettings, GitHubSettings, Settings, StorageSettings};
pub use snapshot::{ConfigMap, ConfigValue, Snapshot, deep_copy};
pub use source::{ConfigSource, InlineSource, RemoteSource};
pub use state::{MAX_REFRESH_INTERVAL_MINUTES, RegistryRecord, refresh_period};
pub use validation::{
    ValidationError, YamlCheck, validate_name, validate_refresh_interval, validate_yaml_text,
};
