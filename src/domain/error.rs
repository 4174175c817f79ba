use std::io;

use thiserror::Error;

use crate::domain::validation::ValidationError;

/// Library-wide error type for yamlprops operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Configuration or environment issue.
    #[error("{0}")]
    Configuration(String),

    /// Submitted entry failed validation.
    #[error("Entry '{entry}' rejected: {source}")]
    InvalidEntry {
        entry: String,
        #[source]
        source: ValidationError,
    },

    /// Standalone validation failure (no entry context).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No entry with the requested name.
    #[error("Config with name '{0}' not found")]
    ConfigNotFound(String),

    /// Default lookup against a registry with no entries.
    #[error("Registry has no configs; a default config is unavailable")]
    EmptyRegistry,

    /// Credential id did not resolve.
    #[error("No credentials found with ID: {0}")]
    CredentialNotFound(String),

    /// Remote repository fetch failed.
    #[error("Failed to fetch {location}: {details}")]
    FetchFailed { location: String, details: String },

    /// Text could not be parsed into a mapping.
    #[error("Failed to parse config '{entry}': {details}")]
    Parse { entry: String, details: String },

    /// Snapshot copy could not be produced.
    #[error("Snapshot of config '{entry}' failed: {details}")]
    SnapshotFailed { entry: String, details: String },

    /// Persisted registry state could not be read or written.
    #[error("Registry state error: {0}")]
    State(String),

    /// A refresh pass is already running.
    #[error("A refresh pass is already in progress")]
    RefreshInProgress,

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

impl AppError {
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }

    pub(crate) fn invalid_entry<S: Into<String>>(entry: S, source: ValidationError) -> Self {
        AppError::InvalidEntry { entry: entry.into(), source }
    }

    /// True for failures produced while obtaining remote text.
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, AppError::CredentialNotFound(_) | AppError::FetchFailed { .. })
    }

    /// True for failures a reader sees when a lookup misses.
    pub fn is_lookup_error(&self) -> bool {
        matches!(self, AppError::ConfigNotFound(_) | AppError::EmptyRegistry)
    }

    /// Provide an `io::ErrorKind`-like view for callers expecting coarse categories.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            AppError::Io(err) => err.kind(),
            AppError::Configuration(_)
            | AppError::InvalidEntry { .. }
            | AppError::Validation(_)
            | AppError::Parse { .. }
            | AppError::TomlParseError(_) => io::ErrorKind::InvalidInput,
            AppError::ConfigNotFound(_)
            | AppError::EmptyRegistry
            | AppError::CredentialNotFound(_) => io::ErrorKind::NotFound,
            AppError::State(_) | AppError::SnapshotFailed { .. } => io::ErrorKind::InvalidData,
            AppError::RefreshInProgress => io::ErrorKind::WouldBlock,
            AppError::FetchFailed { .. } => io::ErrorKind::Other,
        }
    }
}
