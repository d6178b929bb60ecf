use serde::{Deserialize, Serialize};

use relief_crypto::{block_digest, ChainLink};
use relief_types::{Digest, GenesisRecord, Payload, PreviousDigest, ReliefId, Timestamp};

/// One immutable, hash-linked ledger entry.
///
/// `digest` covers the other four fields through the canonical block
/// encoding. Fields are public for inspection and export; a block is never
/// mutated once it has been appended to a chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub sequence_index: u64,
    pub timestamp: Timestamp,
    pub payload: Payload,
    pub previous_digest: PreviousDigest,
    pub digest: Digest,
}

impl Block {
    /// Build a block, computing its digest from the four hashed fields.
    pub fn new(
        sequence_index: u64,
        timestamp: Timestamp,
        payload: Payload,
        previous_digest: PreviousDigest,
    ) -> Self {
        let digest = block_digest(sequence_index, &timestamp, &payload, &previous_digest);
        Self {
            sequence_index,
            timestamp,
            payload,
            previous_digest,
            digest,
        }
    }

    /// Genesis block for `record`.
    ///
    /// The global genesis uses the fixed global timestamp so every fresh
    /// installation starts from the same digest. Identity-scoped genesis
    /// blocks are stamped with the current time.
    pub fn genesis(record: GenesisRecord) -> Self {
        let timestamp = if record.beneficiary_id.is_some() {
            Timestamp::now()
        } else {
            Timestamp::global_genesis()
        };
        Self::new(0, timestamp, Payload::Genesis(record), PreviousDigest::Sentinel)
    }

    /// Digest recomputed from the stored fields.
    pub fn recompute_digest(&self) -> Digest {
        block_digest(
            self.sequence_index,
            &self.timestamp,
            &self.payload,
            &self.previous_digest,
        )
    }

    /// Returns `true` if the stored digest matches the recomputed one.
    pub fn is_intact(&self) -> bool {
        self.recompute_digest() == self.digest
    }

    pub fn relief_id(&self) -> &ReliefId {
        self.payload.relief_id()
    }

    pub fn is_genesis(&self) -> bool {
        self.payload.is_genesis()
    }
}

impl ChainLink for Block {
    fn sequence_index(&self) -> u64 {
        self.sequence_index
    }

    fn stored_digest(&self) -> Digest {
        self.digest
    }

    fn previous_digest(&self) -> PreviousDigest {
        self.previous_digest
    }

    fn recompute_digest(&self) -> Digest {
        Block::recompute_digest(self)
    }
}
