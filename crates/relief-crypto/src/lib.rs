//! Digest primitives for the ReliefProof ledger.
//!
//! Provides the explicit canonical encoding of a block, domain-separated
//! BLAKE3 hashing, and hash chain verification.
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod canonical;
pub mod chain;
pub mod hasher;

pub use canonical::{block_digest, encode_block, CanonicalEncoder};
pub use chain::{ChainError, ChainLink, HashChainVerifier};
pub use hasher::DigestHasher;
