//! In-process storage backend.
//!
//! Keeps serialized bytes in a map, so it behaves like [`LocalStorage`]
//! (including corrupt-slot handling) without touching the filesystem.
//!
//! [`LocalStorage`]: crate::storage::LocalStorage

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::Result;
use crate::storage::SlotStore;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // The map is only ever replaced entry-wise, so a poisoned lock still
        // holds consistent data.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }
}

#[async_trait]
impl SlotStore for MemoryStorage {
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.slots().get(key).cloned())
    }

    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.slots().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.slots().remove(key);
        Ok(())
    }
}
