mod fake_repository;
mod memory_registry_store;
mod static_credentials;

pub use self::fake_repository::{FakeRepository, FetchGate};
pub use self::memory_registry_store::MemoryRegistryStore;
pub use self::static_credentials::StaticCredentials;
