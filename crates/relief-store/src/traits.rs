use crate::error::{StoreError, StoreResult};

/// String-keyed, string-valued durable store.
///
/// All implementations must satisfy these invariants:
/// - `set` replaces the whole value; readers never observe a partial write.
/// - A failed `set` leaves the previous value in place.
/// - All I/O errors are propagated, never silently ignored.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`. Returns `true` if a value existed.
    fn delete(&self, key: &str) -> StoreResult<bool>;

    /// All keys starting with `prefix`, sorted.
    fn keys(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Check whether a value exists under `key`.
    fn contains(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Reject keys that are empty or contain anything other than ASCII
/// alphanumerics, `_` and `-`.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let ok = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
