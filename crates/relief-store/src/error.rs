/// Errors from key-value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Writing the value would exceed the configured storage quota.
    #[error("storage quota exceeded writing {key}: {required} bytes needed, limit is {limit}")]
    QuotaExceeded {
        key: String,
        limit: u64,
        required: u64,
    },

    /// Storage backend is read-only or otherwise unavailable.
    #[error("store is read-only")]
    ReadOnly,

    /// Key contains characters the backend cannot represent.
    #[error("invalid key {0:?}: only ASCII letters, digits, '_' and '-' are allowed")]
    InvalidKey(String),

    /// Stored bytes are not valid UTF-8.
    #[error("value under {key} is not valid UTF-8")]
    InvalidEncoding { key: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
