use relief_crypto::{ChainError, HashChainVerifier};

use crate::block::Block;

/// Result of a full chain walk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub key: String,
    pub block_count: u64,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Lowest index at which a violation was found.
    pub fn first_failure(&self) -> Option<u64> {
        self.violations.iter().map(|v| v.index).min()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub index: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// Genesis block carries a backward link.
    GenesisLinked,
    /// Genesis block's stored digest differs from its recomputed digest.
    GenesisRehash,
    HashMismatch,
    BrokenLink,
    MissingLink,
    SequenceGap,
}

impl From<&ChainError> for ViolationKind {
    fn from(err: &ChainError) -> Self {
        match err {
            ChainError::GenesisHasLink => Self::GenesisLinked,
            ChainError::HashMismatch { index: 0 } => Self::GenesisRehash,
            ChainError::HashMismatch { .. } => Self::HashMismatch,
            ChainError::BrokenLink { .. } => Self::BrokenLink,
            ChainError::MissingLink { .. } => Self::MissingLink,
            ChainError::SequenceGap { .. } => Self::SequenceGap,
        }
    }
}

impl From<&ChainError> for Violation {
    fn from(err: &ChainError) -> Self {
        Self {
            index: err.index() as u64,
            kind: ViolationKind::from(err),
            description: err.to_string(),
        }
    }
}

/// Chain integrity validator.
///
/// Unlike [`HashChainVerifier::verify_chain`], which stops at the first
/// failure, this walks every block and records every violation, the
/// genesis re-hash included.
pub struct ChainValidator;

impl ChainValidator {
    pub fn validate(key: &str, blocks: &[Block]) -> ValidationReport {
        let mut errors = match blocks.first() {
            Some(genesis) => HashChainVerifier::genesis_violations(genesis),
            None => Vec::new(),
        };
        for (offset, pair) in blocks.windows(2).enumerate() {
            errors.extend(HashChainVerifier::link_violations(
                &pair[0],
                &pair[1],
                offset + 1,
            ));
        }

        ValidationReport {
            key: key.to_string(),
            block_count: blocks.len() as u64,
            violations: errors.iter().map(Violation::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use relief_types::{
        Digest, DisbursementRecord, GenesisRecord, Location, Payload, PreviousDigest,
        ReliefCategory, ReliefId, Timestamp,
    };

    use super::*;

    fn build(count: usize) -> Vec<Block> {
        let mut blocks = vec![Block::genesis(GenesisRecord::global())];
        for i in 1..count {
            let payload = Payload::Disbursement(DisbursementRecord::officer(
                ReliefId::generate("RP-WB", "20260201", i as u64),
                Location::new("Howrah", "West Bengal", "", "", "711101").unwrap(),
                ReliefCategory::new("FOOD").unwrap(),
                "",
                "",
            ));
            let prev = PreviousDigest::Block(blocks[i - 1].digest);
            blocks.push(Block::new(i as u64, Timestamp::now(), payload, prev));
        }
        blocks
    }

    #[test]
    fn valid_chain_passes() {
        let report = ChainValidator::validate("relief_chain", &build(5));
        assert!(report.is_valid());
        assert_eq!(report.block_count, 5);
        assert_eq!(report.first_failure(), None);
    }

    #[test]
    fn empty_chain_has_no_violations() {
        let report = ChainValidator::validate("relief_chain", &[]);
        assert!(report.is_valid());
        assert_eq!(report.block_count, 0);
    }

    #[test]
    fn collects_every_violation() {
        let mut blocks = build(5);
        blocks[1].timestamp = Timestamp::from_raw("1999-01-01T00:00:00.000Z");
        blocks[3].previous_digest = PreviousDigest::Block(Digest::from_hash([0; 32]));
        let report = ChainValidator::validate("relief_chain", &blocks);

        let kinds: Vec<_> = report.violations.iter().map(|v| (v.index, v.kind)).collect();
        assert!(kinds.contains(&(1, ViolationKind::HashMismatch)));
        assert!(kinds.contains(&(3, ViolationKind::HashMismatch)));
        assert!(kinds.contains(&(3, ViolationKind::BrokenLink)));
        assert_eq!(report.first_failure(), Some(1));
    }

    #[test]
    fn tampered_genesis_reported_separately() {
        let mut blocks = build(2);
        if let Payload::Genesis(g) = &mut blocks[0].payload {
            g.note = "forged".into();
        }
        let report = ChainValidator::validate("relief_chain", &blocks);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::GenesisRehash);
    }

    #[test]
    fn removed_block_reports_gap_and_link() {
        let mut blocks = build(4);
        blocks.remove(2);
        let report = ChainValidator::validate("relief_chain", &blocks);
        let kinds: Vec<_> = report.violations.iter().map(|v| (v.index, v.kind)).collect();
        assert!(kinds.contains(&(2, ViolationKind::BrokenLink)));
        assert!(kinds.contains(&(2, ViolationKind::SequenceGap)));
    }

    #[test]
    fn linked_genesis_reported() {
        let mut blocks = build(1);
        blocks[0].previous_digest = PreviousDigest::Block(Digest::from_hash([4; 32]));
        let report = ChainValidator::validate("relief_chain", &blocks);
        let kinds: Vec<_> = report.violations.iter().map(|v| v.kind).collect();
        assert!(kinds.contains(&ViolationKind::GenesisLinked));
        assert!(kinds.contains(&ViolationKind::GenesisRehash));
        assert!(report.violations.iter().all(|v| v.index == 0));
    }

    #[test]
    fn chain_error_maps_to_kind() {
        assert_eq!(
            ViolationKind::from(&ChainError::HashMismatch { index: 0 }),
            ViolationKind::GenesisRehash
        );
        assert_eq!(
            ViolationKind::from(&ChainError::SequenceGap { index: 2, found: 5 }),
            ViolationKind::SequenceGap
        );
    }
}
