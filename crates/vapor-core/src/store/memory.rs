//! In-memory state store backed by a sorted map.
//!
//! The only store implementation vapor ships: the emulator's state is
//! process-local and rebuilt from scratch for every test run, so there is no
//! on-disk format. A `BTreeMap` keeps keys sorted, which makes prefix
//! listings deterministic without a separate sort.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{StateStore, StoreError};

/// Process-local [`StateStore`] implementation.
///
/// All records live in one `RwLock`-guarded `BTreeMap`. Reads take the
/// shared lock; `set`/`delete`/`update` take the exclusive lock, which is
/// what makes [`StateStore::update_raw`] atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Return `true` if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl StateStore for MemoryStore {
    fn exists(&self, key: &str) -> bool {
        self.records.read().contains_key(key)
    }

    fn get_raw(&self, key: &str) -> Result<serde_json::Value, StoreError> {
        self.records
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn set_raw(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.records.write().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.records
            .write()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn list(&self, prefix: &str) -> Vec<String> {
        self.records
            .read()
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn update_raw(
        &self,
        key: &str,
        mutator: &mut dyn FnMut(&mut serde_json::Value),
    ) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let value = records
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        mutator(value);
        Ok(())
    }
}
