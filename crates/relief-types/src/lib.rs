//! Foundation types for the ReliefProof ledger.
//!
//! This crate provides the identifier, digest, temporal, and record types used
//! throughout the workspace. Every other `relief-*` crate depends on
//! `relief-types`.
//!
//! # Key Types
//!
//! - [`Digest`]: BLAKE3 block digest, hex-encoded on the wire
//! - [`PreviousDigest`]: backward link of a block (`"0"` sentinel for genesis)
//! - [`BeneficiaryId`]: stable beneficiary identifier derived from a credential
//! - [`ReliefId`]: human-readable relief record identifier
//! - [`ReliefCategory`]: relief type used by the duplicate-claim guard
//! - [`Timestamp`]: ISO-8601 capture time, stored verbatim
//! - [`Payload`]: tagged union of genesis, disbursement, and claim records

pub mod digest;
pub mod error;
pub mod identity;
pub mod record;
pub mod temporal;

pub use digest::{Digest, PreviousDigest};
pub use error::TypeError;
pub use identity::{credential_digest, BeneficiaryId};
pub use record::{
    is_valid_pin_code, ClaimRecord, DisbursementRecord, GenesisRecord, Location, Origin, Payload,
    PayloadKind, ReliefCategory, ReliefId, NOT_APPLICABLE,
};
pub use temporal::Timestamp;
