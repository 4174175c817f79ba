//! Remote repository and credential ports.

use std::fmt;

use crate::domain::AppError;

/// A secret used to authenticate against the remote repository host.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: String,
    pub token: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").field("id", &self.id).field("token", &"[REDACTED]").finish()
    }
}

/// A single file at a ref of a remote repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRequest<'a> {
    pub owner: &'a str,
    pub repository: &'a str,
    /// `None` selects the repository's default branch.
    pub git_ref: Option<&'a str>,
    pub path: &'a str,
}

impl fmt::Display for FileRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repository)?;
        if let Some(git_ref) = self.git_ref {
            write!(f, "@{git_ref}")?;
        }
        write!(f, ":{}", self.path)
    }
}

/// Port for reading files out of a remote repository.
pub trait RemoteRepository: Send + Sync {
    /// Return the decoded text of the requested file.
    ///
    /// Every transport, authorization, and not-found condition is reported as
    /// `AppError::FetchFailed`.
    fn read_file(&self, request: &FileRequest<'_>, credential: &Credential)
    -> Result<String, AppError>;
}

/// Port resolving credential ids to secrets.
pub trait CredentialProvider: Send + Sync {
    fn lookup(&self, id: &str) -> Option<Credential>;
}
