use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use relief_crypto::HashChainVerifier;
use relief_store::KeyValueStore;
use relief_types::{BeneficiaryId, GenesisRecord, Payload, PreviousDigest, Timestamp};

use crate::block::Block;
use crate::error::LedgerError;
use crate::projection::{AuditEntry, ChainSummary, IntegrityStatus, ProjectionBuilder};
use crate::validation::{ChainValidator, ValidationReport};

/// Storage key of the global relief ledger.
pub const GLOBAL_CHAIN_KEY: &str = "relief_chain";

/// Storage key prefix of identity-scoped ledgers.
pub const IDENTITY_CHAIN_PREFIX: &str = "ben_chain_";

/// Storage key of the identity-scoped ledger owned by `beneficiary_id`.
pub fn identity_chain_key(beneficiary_id: &BeneficiaryId) -> String {
    format!("{IDENTITY_CHAIN_PREFIX}{beneficiary_id}")
}

/// Outcome of verifying a single record by its relief id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordVerification {
    /// The record exists and its stored digest matches.
    Intact(Block),
    /// The record exists but its stored fields no longer hash to its digest.
    Tampered(Block),
    NotFound,
}

impl RecordVerification {
    pub fn is_intact(&self) -> bool {
        matches!(self, Self::Intact(_))
    }

    pub fn block(&self) -> Option<&Block> {
        match self {
            Self::Intact(b) | Self::Tampered(b) => Some(b),
            Self::NotFound => None,
        }
    }
}

/// A persisted, hash-linked block sequence.
///
/// The whole sequence is written to the store under one key after every
/// append. Reads and appends go through an internal `RwLock`; `append`
/// holds the write lock from reading the tip until the new sequence has been
/// handed to the store, so concurrent appends always link correctly.
pub struct Chain {
    key: String,
    store: Arc<dyn KeyValueStore>,
    inner: RwLock<ChainState>,
}

struct ChainState {
    blocks: Vec<Block>,
    /// relief id -> position of its first occurrence
    index: HashMap<String, usize>,
    durable: bool,
}

impl ChainState {
    fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut index = HashMap::new();
        for (position, block) in blocks.iter().enumerate() {
            index
                .entry(block.relief_id().as_str().to_string())
                .or_insert(position);
        }
        Self {
            blocks,
            index,
            durable: true,
        }
    }

    fn push(&mut self, block: Block) {
        let position = self.blocks.len();
        self.index
            .entry(block.relief_id().as_str().to_string())
            .or_insert(position);
        self.blocks.push(block);
    }
}

impl Chain {
    /// Load the chain stored under `key`, or create it with a genesis block
    /// built from `genesis` if nothing is stored yet.
    ///
    /// Loaded blocks are taken verbatim; digests are not recomputed here.
    /// A stored value that does not decode to a non-empty block sequence is
    /// reported as [`LedgerError::CorruptChain`] rather than replaced.
    pub fn initialize(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        genesis: GenesisRecord,
    ) -> Result<Self, LedgerError> {
        let key = key.into();
        let blocks = match load(store.as_ref(), &key)? {
            Some(blocks) => blocks,
            None => {
                let blocks = vec![Block::genesis(genesis)];
                store.set(&key, &encode(&blocks)?)?;
                debug!(key = %key, "created chain with genesis block");
                blocks
            }
        };
        Ok(Self::from_parts(store, key, blocks))
    }

    /// Load the chain stored under `key` without creating it.
    ///
    /// Returns `None` when nothing is stored; the store is never written.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
    ) -> Result<Option<Self>, LedgerError> {
        let key = key.into();
        Ok(load(store.as_ref(), &key)?.map(|blocks| Self::from_parts(store, key, blocks)))
    }

    fn from_parts(store: Arc<dyn KeyValueStore>, key: String, blocks: Vec<Block>) -> Self {
        Self {
            key,
            store,
            inner: RwLock::new(ChainState::from_blocks(blocks)),
        }
    }

    /// Load or create the global relief ledger.
    pub fn initialize_global(store: Arc<dyn KeyValueStore>) -> Result<Self, LedgerError> {
        Self::initialize(store, GLOBAL_CHAIN_KEY, GenesisRecord::global())
    }

    /// Storage key of this chain.
    pub fn key(&self) -> &str {
        &self.key
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, ChainState>, LedgerError> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, ChainState>, LedgerError> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Run `f` over the current block sequence under the read lock.
    pub(crate) fn with_blocks<T>(&self, f: impl FnOnce(&[Block]) -> T) -> Result<T, LedgerError> {
        let state = self.read_state()?;
        Ok(f(&state.blocks))
    }

    /// Last block of the chain.
    pub fn tip(&self) -> Result<Block, LedgerError> {
        self.read_state()?
            .blocks
            .last()
            .cloned()
            .ok_or(LedgerError::EmptyChain)
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.read_state()?.blocks.len())
    }

    pub fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    /// Append a block carrying `payload` and persist the full sequence.
    ///
    /// On a store failure the block stays appended in memory, the chain is
    /// marked non-durable, and [`LedgerError::NotDurable`] is returned.
    pub fn append(&self, payload: Payload) -> Result<Block, LedgerError> {
        self.append_checked(payload, |_| Ok(()))
    }

    /// Append after `guard` approves the current sequence.
    ///
    /// The guard runs under the same write lock as the append, so no other
    /// append can slip in between the check and the write.
    pub fn append_checked(
        &self,
        payload: Payload,
        guard: impl FnOnce(&[Block]) -> Result<(), LedgerError>,
    ) -> Result<Block, LedgerError> {
        let mut state = self.write_state()?;
        guard(&state.blocks)?;

        let tip = state.blocks.last().ok_or(LedgerError::EmptyChain)?;
        let block = Block::new(
            state.blocks.len() as u64,
            Timestamp::now(),
            payload,
            PreviousDigest::Block(tip.digest),
        );
        state.push(block.clone());
        state.durable = false;

        let encoded = encode(&state.blocks)?;
        match self.store.set(&self.key, &encoded) {
            Ok(()) => {
                state.durable = true;
                debug!(key = %self.key, seq = block.sequence_index, "appended block");
                Ok(block)
            }
            Err(source) => {
                warn!(
                    key = %self.key,
                    seq = block.sequence_index,
                    error = %source,
                    "block appended but not persisted"
                );
                Err(LedgerError::NotDurable {
                    seq: block.sequence_index,
                    block: Box::new(block),
                    source,
                })
            }
        }
    }

    /// Write the full in-memory sequence to the store again.
    pub fn persist(&self) -> Result<(), LedgerError> {
        let mut state = self.write_state()?;
        let encoded = encode(&state.blocks)?;
        self.store.set(&self.key, &encoded)?;
        state.durable = true;
        debug!(key = %self.key, blocks = state.blocks.len(), "persisted chain");
        Ok(())
    }

    /// Returns `false` after an append whose write failed, until a later
    /// write succeeds.
    pub fn is_durable(&self) -> Result<bool, LedgerError> {
        Ok(self.read_state()?.durable)
    }

    /// Returns `true` if every non-genesis block recomputes to its digest,
    /// links to its predecessor, and sits at its own index.
    pub fn validate(&self) -> bool {
        self.verify().is_ok()
    }

    /// Like [`Chain::validate`], but reports the first failure.
    pub fn verify(&self) -> Result<(), LedgerError> {
        let state = self.read_state()?;
        HashChainVerifier::verify_chain(&state.blocks).map_err(|err| {
            warn!(key = %self.key, index = err.index(), error = %err, "chain integrity failure");
            LedgerError::Integrity(err)
        })
    }

    /// Full walk collecting every violation, genesis re-hash included.
    pub fn validation_report(&self) -> Result<ValidationReport, LedgerError> {
        let state = self.read_state()?;
        Ok(ChainValidator::validate(&self.key, &state.blocks))
    }

    /// First block whose payload carries `relief_id`.
    pub fn find_by_record_id(&self, relief_id: &str) -> Result<Option<Block>, LedgerError> {
        let state = self.read_state()?;
        Ok(state
            .index
            .get(relief_id)
            .and_then(|&position| state.blocks.get(position))
            .cloned())
    }

    /// First block matching `predicate`, in chain order.
    pub fn find_where(
        &self,
        predicate: impl Fn(&Block) -> bool,
    ) -> Result<Option<Block>, LedgerError> {
        let state = self.read_state()?;
        Ok(state.blocks.iter().find(|b| predicate(b)).cloned())
    }

    /// Locate `relief_id` and recompute its digest.
    pub fn verify_record(&self, relief_id: &str) -> Result<RecordVerification, LedgerError> {
        Ok(match self.find_by_record_id(relief_id)? {
            Some(block) if block.is_intact() => RecordVerification::Intact(block),
            Some(block) => {
                warn!(
                    key = %self.key,
                    seq = block.sequence_index,
                    relief_id,
                    "record digest mismatch"
                );
                RecordVerification::Tampered(block)
            }
            None => RecordVerification::NotFound,
        })
    }

    /// Full ordered block list.
    pub fn export(&self) -> Result<Vec<Block>, LedgerError> {
        Ok(self.read_state()?.blocks.clone())
    }

    /// Full ordered block list as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String, LedgerError> {
        let state = self.read_state()?;
        serde_json::to_string_pretty(&state.blocks)
            .map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Flattened audit-log rows.
    pub fn audit_entries(&self) -> Result<Vec<AuditEntry>, LedgerError> {
        self.with_blocks(ProjectionBuilder::audit_entries)
    }

    /// Dashboard figures, integrity included.
    pub fn summary(&self) -> Result<ChainSummary, LedgerError> {
        let state = self.read_state()?;
        let integrity =
            IntegrityStatus::from_valid(HashChainVerifier::verify_chain(&state.blocks).is_ok());
        Ok(ProjectionBuilder::summary(&state.blocks, integrity))
    }

    pub fn integrity(&self) -> IntegrityStatus {
        IntegrityStatus::from_valid(self.validate())
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.len().unwrap_or(0);
        f.debug_struct("Chain")
            .field("key", &self.key)
            .field("blocks", &len)
            .finish()
    }
}

fn load(store: &dyn KeyValueStore, key: &str) -> Result<Option<Vec<Block>>, LedgerError> {
    let Some(text) = store.get(key)? else {
        return Ok(None);
    };
    let blocks: Vec<Block> = serde_json::from_str(&text).map_err(|e| LedgerError::CorruptChain {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    if blocks.is_empty() {
        return Err(LedgerError::CorruptChain {
            key: key.to_string(),
            reason: "stored block sequence is empty".into(),
        });
    }
    debug!(key, blocks = blocks.len(), "loaded chain");
    Ok(Some(blocks))
}

fn encode(blocks: &[Block]) -> Result<String, LedgerError> {
    serde_json::to_string(blocks).map_err(|e| LedgerError::Serialization(e.to_string()))
}
