use std::collections::BTreeMap;
use std::sync::RwLock;

use super::Store;
use crate::error::CertigenError;

/// In-process store. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> CertigenError {
    CertigenError::Storage("memory store lock poisoned".to_string())
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CertigenError> {
        Ok(self.entries.read().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CertigenError> {
        self.entries
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, CertigenError> {
        Ok(self.entries.read().map_err(poisoned)?.keys().cloned().collect())
    }

    fn delete(&self, key: &str) -> Result<bool, CertigenError> {
        Ok(self.entries.write().map_err(poisoned)?.remove(key).is_some())
    }
}
