use thiserror::Error;

use relief_ledger::{Block, LedgerError};
use relief_types::{BeneficiaryId, ReliefCategory};

use crate::collaborators::CollaboratorError;
use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("no verified session for this beneficiary")]
    Unauthenticated,

    #[error("identity verification failed: {0}")]
    VerificationFailed(String),

    #[error("{category} already claimed by this beneficiary")]
    DuplicateClaim { category: ReliefCategory },

    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// No identity-scoped ledger is stored for this beneficiary.
    #[error("no ledger for beneficiary {0}")]
    BeneficiaryNotFound(BeneficiaryId),

    #[error("relief id sequence is corrupt: {value:?}")]
    CorruptSequence { value: String },

    /// The claim stands on the identity chain but its global copy was not
    /// written. Run reconciliation to replicate it.
    #[error("claim {} recorded, global replication pending: {source}", claim.relief_id())]
    ReplicationPending {
        claim: Box<Block>,
        #[source]
        source: Box<LedgerError>,
    },

    #[error("collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("store error: {0}")]
    Store(#[from] relief_store::StoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid input: {0}")]
    InvalidInput(#[from] relief_types::TypeError),
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
