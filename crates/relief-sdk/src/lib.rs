//! High-level SDK for ReliefProof.
//!
//! [`LedgerCoordinator`] is the entry point for applications: it owns the
//! global ledger, opens identity-scoped ledgers on demand, enforces the
//! duplicate-claim guard, replicates claims into the global ledger, and
//! tracks the verification session.

pub mod collaborators;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod session;

pub use collaborators::{
    CollaboratorError, IdentityVerifier, LocationLookup, SimulatedIdentityVerifier,
    StaticLocationLookup, VerificationOutcome,
};
pub use config::{ConfigError, LedgerConfig};
pub use coordinator::{
    ClaimDetails, DisbursementDetails, LedgerCoordinator, ReconcileReport, SEQUENCE_KEY,
};
pub use error::{CoordinatorError, CoordinatorResult};
pub use session::{Session, VerifiedIdentity};

// Re-export key types
pub use relief_ledger::{
    AuditEntry, Block, ChainSummary, IntegrityStatus, RecordVerification, ValidationReport,
};
pub use relief_types::{BeneficiaryId, Location, ReliefCategory, ReliefId};
