//! Durable storage port for registry state.

use crate::domain::{AppError, RegistryRecord};

/// Port for loading and saving the registry as one unit.
pub trait RegistryStore: Send + Sync {
    /// Load the persisted registry, or `None` when nothing was ever saved.
    fn load(&self) -> Result<Option<RegistryRecord>, AppError>;

    /// Replace the persisted registry with `record`.
    fn save(&self, record: &RegistryRecord) -> Result<(), AppError>;
}
