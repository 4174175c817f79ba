mod registry_store;
mod remote_repository;

pub use registry_store::RegistryStore;
pub use remote_repository::{Credential, CredentialProvider, FileRequest, RemoteRepository};
