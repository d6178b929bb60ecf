use relief_crypto::ChainError;
use relief_store::StoreError;
use relief_types::ReliefCategory;

use crate::block::Block;

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The block was appended in memory but the store rejected the write.
    /// The chain stays non-durable until a later persist succeeds.
    #[error("block {seq} appended but not persisted: {source}")]
    NotDurable {
        seq: u64,
        block: Box<Block>,
        #[source]
        source: StoreError,
    },

    #[error("store error: {0}")]
    Persistence(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// The persisted value exists but is not a usable block sequence.
    #[error("corrupt chain under {key}: {reason}")]
    CorruptChain { key: String, reason: String },

    #[error("chain has no blocks")]
    EmptyChain,

    #[error("integrity violation: {0}")]
    Integrity(#[from] ChainError),

    #[error("category {category} already claimed on this chain")]
    DuplicateCategory { category: ReliefCategory },

    #[error("claim belongs to {found}, not to chain owner {expected}")]
    BeneficiaryMismatch { expected: String, found: String },

    #[error("ledger lock poisoned")]
    LockPoisoned,
}
