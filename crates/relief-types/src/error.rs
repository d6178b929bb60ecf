use thiserror::Error;

/// Errors produced by type construction and parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid PIN code {0:?}: expected 6 digits")]
    InvalidPinCode(String),

    #[error("invalid beneficiary id: {0}")]
    InvalidBeneficiaryId(String),

    #[error("category {0} is reserved for the genesis block")]
    ReservedCategory(String),

    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
}
