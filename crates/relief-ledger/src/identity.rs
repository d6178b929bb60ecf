use std::sync::Arc;

use tracing::{info, warn};

use relief_store::KeyValueStore;
use relief_types::{BeneficiaryId, ClaimRecord, GenesisRecord, Payload, ReliefCategory};

use crate::block::Block;
use crate::chain::{identity_chain_key, Chain};
use crate::error::LedgerError;

/// A beneficiary's own claim history.
///
/// Holds at most one granted claim per relief category. The category check
/// and the append happen under the same chain lock.
#[derive(Debug)]
pub struct IdentityChain {
    beneficiary_id: BeneficiaryId,
    chain: Chain,
}

impl IdentityChain {
    /// Load or create the chain stored under `ben_chain_<id>`.
    pub fn initialize(
        store: Arc<dyn KeyValueStore>,
        beneficiary_id: BeneficiaryId,
    ) -> Result<Self, LedgerError> {
        let chain = Chain::initialize(
            store,
            identity_chain_key(&beneficiary_id),
            GenesisRecord::for_beneficiary(beneficiary_id.clone()),
        )?;
        Ok(Self {
            beneficiary_id,
            chain,
        })
    }

    /// Load an existing chain. Returns `None` for a beneficiary with no
    /// stored chain, without writing anything.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        beneficiary_id: BeneficiaryId,
    ) -> Result<Option<Self>, LedgerError> {
        let chain = Chain::open(store, identity_chain_key(&beneficiary_id))?;
        Ok(chain.map(|chain| Self {
            beneficiary_id,
            chain,
        }))
    }

    pub fn beneficiary_id(&self) -> &BeneficiaryId {
        &self.beneficiary_id
    }

    /// Read access to the underlying chain.
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Returns `true` if a non-genesis block already carries `category`.
    pub fn has_category(&self, category: &ReliefCategory) -> Result<bool, LedgerError> {
        self.chain.with_blocks(|blocks| contains_category(blocks, category))
    }

    /// Append `claim` unless its category was already granted.
    pub fn append_claim(&self, claim: ClaimRecord) -> Result<Block, LedgerError> {
        if claim.beneficiary_id != self.beneficiary_id {
            return Err(LedgerError::BeneficiaryMismatch {
                expected: self.beneficiary_id.to_string(),
                found: claim.beneficiary_id.to_string(),
            });
        }
        let category = claim.category.clone();
        let block = self
            .chain
            .append_checked(Payload::Claim(claim), |blocks| {
                if contains_category(blocks, &category) {
                    return Err(LedgerError::DuplicateCategory {
                        category: category.clone(),
                    });
                }
                Ok(())
            })
            .inspect_err(|err| {
                if let LedgerError::DuplicateCategory { .. } = err {
                    warn!(
                        beneficiary = %self.beneficiary_id,
                        category = %category,
                        "duplicate claim rejected"
                    );
                }
            })?;
        info!(
            beneficiary = %self.beneficiary_id,
            category = %category,
            seq = block.sequence_index,
            "claim recorded"
        );
        Ok(block)
    }

    /// Granted claims in chain order.
    pub fn claims(&self) -> Result<Vec<ClaimRecord>, LedgerError> {
        self.chain.with_blocks(|blocks| {
            blocks
                .iter()
                .filter_map(|b| match &b.payload {
                    Payload::Claim(c) => Some(c.clone()),
                    _ => None,
                })
                .collect()
        })
    }
}

fn contains_category(blocks: &[Block], category: &ReliefCategory) -> bool {
    blocks
        .iter()
        .skip(1)
        .any(|b| b.payload.category() == *category)
}
