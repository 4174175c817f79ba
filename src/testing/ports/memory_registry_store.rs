use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{AppError, RegistryRecord};
use crate::ports::RegistryStore;

/// In-memory registry store; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegistryStore {
    record: Arc<Mutex<Option<RegistryRecord>>>,
    saves: Arc<Mutex<usize>>,
    fail_saves: Arc<Mutex<bool>>,
}

impl MemoryRegistryStore {
    pub fn with_record(record: RegistryRecord) -> Self {
        let store = Self::default();
        *store.record.lock() = Some(record);
        store
    }

    pub fn record(&self) -> Option<RegistryRecord> {
        self.record.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }

    pub fn fail_saves(&self, fail: bool) {
        *self.fail_saves.lock() = fail;
    }
}

impl RegistryStore for MemoryRegistryStore {
    fn load(&self) -> Result<Option<RegistryRecord>, AppError> {
        Ok(self.record.lock().clone())
    }

    fn save(&self, record: &RegistryRecord) -> Result<(), AppError> {
        if *self.fail_saves.lock() {
            return Err(AppError::State("disk full".to_string()));
        }
        *self.record.lock() = Some(record.clone());
        *self.saves.lock() += 1;
        Ok(())
    }
}
