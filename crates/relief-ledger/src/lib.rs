//! Append-only, hash-linked relief ledgers.
//!
//! This crate is the core of ReliefProof. It provides:
//! - [`Block`], the immutable hash-linked record
//! - [`Chain`], a persisted block sequence with validation and lookup
//! - [`IdentityChain`], a per-beneficiary chain with the duplicate-claim guard
//! - Validation reports listing every integrity violation
//! - Audit projections (flattened export rows, dashboard summary)

pub mod block;
pub mod chain;
pub mod error;
pub mod identity;
pub mod projection;
pub mod validation;

pub use block::Block;
pub use chain::{
    identity_chain_key, Chain, RecordVerification, GLOBAL_CHAIN_KEY, IDENTITY_CHAIN_PREFIX,
};
pub use error::LedgerError;
pub use identity::IdentityChain;
pub use projection::{AuditEntry, ChainSummary, IntegrityStatus, ProjectionBuilder};
pub use validation::{ChainValidator, ValidationReport, Violation, ViolationKind};
