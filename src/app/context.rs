use std::sync::Arc;

use crate::app::ConfigRegistry;
use crate::ports::{CredentialProvider, RemoteRepository};

/// Application context holding the registry and the remote access it refreshes with.
#[derive(Clone)]
pub struct AppContext {
    registry: Arc<ConfigRegistry>,
    repository: Arc<dyn RemoteRepository>,
    credentials: Arc<dyn CredentialProvider>,
}

impl AppContext {
    /// Create a new application context.
    pub fn new(
        registry: Arc<ConfigRegistry>,
        repository: Arc<dyn RemoteRepository>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self { registry, repository, credentials }
    }

    /// Get a reference to the registry.
    pub fn registry(&self) -> &Arc<ConfigRegistry> {
        &self.registry
    }

    /// Get a reference to the remote repository client.
    pub fn repository(&self) -> &dyn RemoteRepository {
        self.repository.as_ref()
    }

    /// Get a reference to the credential provider.
    pub fn credentials(&self) -> &dyn CredentialProvider {
        self.credentials.as_ref()
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").field("registry", &self.registry).finish_non_exhaustive()
    }
}
