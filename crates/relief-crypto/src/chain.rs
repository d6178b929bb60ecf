use relief_types::{Digest, PreviousDigest};

/// Trait for records that participate in a hash chain.
pub trait ChainLink {
    /// Zero-based position the record claims to occupy.
    fn sequence_index(&self) -> u64;
    /// The stored digest.
    fn stored_digest(&self) -> Digest;
    /// The stored backward link.
    fn previous_digest(&self) -> PreviousDigest;
    /// Digest recomputed from the stored hashed fields.
    fn recompute_digest(&self) -> Digest;
}

/// Hash chain integrity verifier.
///
/// Walks a sequence of records from index 1 to the end. For each record it
/// recomputes the digest from the stored fields, checks the backward link
/// against the predecessor's stored digest, and checks the sequence index.
/// The genesis record is exempt from the backward-link check.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify a chain, stopping at the first failure.
    pub fn verify_chain(links: &[impl ChainLink]) -> Result<(), ChainError> {
        let Some(genesis) = links.first() else {
            return Ok(());
        };
        if !genesis.previous_digest().is_sentinel() {
            return Err(ChainError::GenesisHasLink);
        }

        for index in 1..links.len() {
            Self::verify_link(&links[index - 1], &links[index], index)?;
        }
        Ok(())
    }

    /// Verify a single record against its predecessor.
    pub fn verify_link(
        previous: &impl ChainLink,
        current: &impl ChainLink,
        index: usize,
    ) -> Result<(), ChainError> {
        match Self::link_violations(previous, current, index).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Every check `current` fails against `previous`, in check order:
    /// digest, then link, then sequence index.
    pub fn link_violations(
        previous: &impl ChainLink,
        current: &impl ChainLink,
        index: usize,
    ) -> Vec<ChainError> {
        let mut errors = Vec::new();
        if current.recompute_digest() != current.stored_digest() {
            errors.push(ChainError::HashMismatch { index });
        }

        match current.previous_digest() {
            PreviousDigest::Block(prev) if prev == previous.stored_digest() => {}
            PreviousDigest::Block(_) => errors.push(ChainError::BrokenLink { index }),
            PreviousDigest::Sentinel => errors.push(ChainError::MissingLink { index }),
        }

        if current.sequence_index() != index as u64 {
            errors.push(ChainError::SequenceGap {
                index,
                found: current.sequence_index(),
            });
        }
        errors
    }

    /// Every check the genesis record fails, its re-hash included. The
    /// re-hash is not part of [`verify_chain`], which trusts the locally
    /// synthesized genesis.
    ///
    /// [`verify_chain`]: HashChainVerifier::verify_chain
    pub fn genesis_violations(genesis: &impl ChainLink) -> Vec<ChainError> {
        let mut errors = Vec::new();
        if !genesis.previous_digest().is_sentinel() {
            errors.push(ChainError::GenesisHasLink);
        }
        if genesis.sequence_index() != 0 {
            errors.push(ChainError::SequenceGap {
                index: 0,
                found: genesis.sequence_index(),
            });
        }
        if genesis.recompute_digest() != genesis.stored_digest() {
            errors.push(ChainError::HashMismatch { index: 0 });
        }
        errors
    }
}

/// Errors from chain verification.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("genesis block links to a predecessor (should carry the sentinel)")]
    GenesisHasLink,

    #[error("hash mismatch at index {index}: computed digest differs from stored")]
    HashMismatch { index: usize },

    #[error("broken link at index {index}: previous digest does not match")]
    BrokenLink { index: usize },

    #[error("missing link at index {index}: sentinel found after genesis")]
    MissingLink { index: usize },

    #[error("sequence gap at index {index}: block claims index {found}")]
    SequenceGap { index: usize, found: u64 },
}

impl ChainError {
    /// Index at which verification failed.
    pub fn index(&self) -> usize {
        match self {
            Self::GenesisHasLink => 0,
            Self::HashMismatch { index }
            | Self::BrokenLink { index }
            | Self::MissingLink { index }
            | Self::SequenceGap { index, .. } => *index,
        }
    }
}
