use super::{Cache, CacheEntry};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

const LOG_TARGET: &str = "     cache";

/// An in-process [`Cache`] backed by a hash map.
///
/// Entries live until they are deleted or the cache is dropped.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn set(&self, key: &str, bytes: Bytes) {
        log::trace!(target: LOG_TARGET, "Storing {} bytes for '{key}'", bytes.len());
        let _ = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), CacheEntry::new(bytes));
    }

    fn delete(&self, key: &str) {
        if self.entries.write().unwrap_or_else(PoisonError::into_inner).remove(key).is_some() {
            log::trace!(target: LOG_TARGET, "Evicted '{key}'");
        }
    }

    fn refresh(&self, key: &str) {
        if let Some(entry) = self.entries.write().unwrap_or_else(PoisonError::into_inner).get_mut(key) {
            entry.refresh();
        }
    }
}
