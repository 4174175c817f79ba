//! Where an entry's raw text comes from.

use serde::{Deserialize, Serialize};

use crate::domain::AppError;
use crate::domain::validation::{ValidationError, require_field};
use crate::ports::{CredentialProvider, FileRequest, RemoteRepository};

/// Origin of a config entry's text. New kinds of origin are new variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigSource {
    Inline(InlineSource),
    Remote(RemoteSource),
}

/// Text supplied directly by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InlineSource {
    #[serde(default)]
    pub text: String,
}

/// Text read from a file in a remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteSource {
    pub repository_owner: String,
    pub repository_name: String,
    /// Branch, tag, or commit. Empty selects the default branch.
    #[serde(rename = "ref", default)]
    pub git_ref: String,
    pub path: String,
    pub credential_id: String,
    /// Last successfully fetched text; survives restarts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_text: Option<String>,
}

impl ConfigSource {
    pub fn inline(text: impl Into<String>) -> Self {
        ConfigSource::Inline(InlineSource { text: text.into() })
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ConfigSource::Remote(_))
    }

    /// Text currently held by the source without touching the network.
    pub fn current_text(&self) -> &str {
        match self {
            ConfigSource::Inline(inline) => &inline.text,
            ConfigSource::Remote(remote) => remote.cached_text.as_deref().unwrap_or_default(),
        }
    }

    /// Obtain fresh text from the source.
    ///
    /// Inline sources always succeed. Remote sources go to the repository and leave
    /// `cached_text` untouched; the caller decides what to do with the result.
    pub fn produce_text(
        &self,
        repository: &dyn RemoteRepository,
        credentials: &dyn CredentialProvider,
    ) -> Result<String, AppError> {
        match self {
            ConfigSource::Inline(inline) => Ok(inline.text.clone()),
            ConfigSource::Remote(remote) => remote.fetch(repository, credentials),
        }
    }
}

impl RemoteSource {
    pub fn new(
        repository_owner: impl Into<String>,
        repository_name: impl Into<String>,
        git_ref: impl Into<String>,
        path: impl Into<String>,
        credential_id: impl Into<String>,
    ) -> Self {
        Self {
            repository_owner: repository_owner.into(),
            repository_name: repository_name.into(),
            git_ref: git_ref.into(),
            path: path.into(),
            credential_id: credential_id.into(),
            cached_text: None,
        }
    }

    pub fn request(&self) -> FileRequest<'_> {
        let git_ref = self.git_ref.trim();
        FileRequest {
            owner: &self.repository_owner,
            repository: &self.repository_name,
            git_ref: if git_ref.is_empty() { None } else { Some(git_ref) },
            path: &self.path,
        }
    }

    /// True when both descriptors point at the same file with the same credential.
    pub fn same_location(&self, other: &RemoteSource) -> bool {
        self.repository_owner == other.repository_owner
            && self.repository_name == other.repository_name
            && self.git_ref == other.git_ref
            && self.path == other.path
            && self.credential_id == other.credential_id
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_field("repository_owner", &self.repository_owner)?;
        require_field("repository_name", &self.repository_name)?;
        require_field("path", &self.path)?;
        require_field("credential_id", &self.credential_id)?;
        Ok(())
    }

    pub fn fetch(
        &self,
        repository: &dyn RemoteRepository,
        credentials: &dyn CredentialProvider,
    ) -> Result<String, AppError> {
        let credential = credentials
            .lookup(&self.credential_id)
            .ok_or_else(|| AppError::CredentialNotFound(self.credential_id.clone()))?;
        repository.read_file(&self.request(), &credential)
    }
}
