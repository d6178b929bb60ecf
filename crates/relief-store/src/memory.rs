use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::{validate_key, KeyValueStore};

/// In-memory, HashMap-based key-value store.
///
/// Intended for tests and embedding. An optional byte quota mimics the
/// storage limit of a browser origin: a write that would push the sum of all
/// key and value lengths past the quota fails with
/// [`StoreError::QuotaExceeded`] and leaves the old value untouched.
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<u64>,
    read_only: AtomicBool,
}

impl InMemoryStore {
    /// Create a new empty store with no quota.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes: None,
            read_only: AtomicBool::new(false),
        }
    }

    /// Create a new empty store limited to `quota_bytes`.
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::new()
        }
    }

    /// Reject (or accept again) all writes.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Returns `true` if writes are currently rejected.
    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::SeqCst)
    }

    /// Configured quota, if any.
    pub fn quota_bytes(&self) -> Option<u64> {
        self.quota_bytes
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> StoreResult<u64> {
        let map = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(footprint(&map))
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn footprint(map: &HashMap<String, String>) -> u64 {
    map.iter()
        .map(|(k, v)| (k.len() + v.len()) as u64)
        .sum()
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let map = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        validate_key(key)?;
        if self.is_read_only() {
            return Err(StoreError::ReadOnly);
        }
        let mut map = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(limit) = self.quota_bytes {
            let existing = map.get(key).map(|v| (key.len() + v.len()) as u64);
            let required =
                footprint(&map) - existing.unwrap_or(0) + (key.len() + value.len()) as u64;
            if required > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    limit,
                    required,
                });
            }
        }
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        if self.is_read_only() {
            return Err(StoreError::ReadOnly);
        }
        let mut map = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.remove(key).is_some())
    }

    fn keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let map = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut keys: Vec<String> = map
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("key_count", &self.len())
            .field("quota_bytes", &self.quota_bytes)
            .field("read_only", &self.is_read_only())
            .finish()
    }
}
