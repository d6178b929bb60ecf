use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use relief_crypto::DigestHasher;
use relief_types::{Digest, Location, Timestamp};

use crate::block::Block;

/// Integrity status shown to users.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegrityStatus {
    Verified,
    Compromised,
}

impl IntegrityStatus {
    pub fn from_valid(valid: bool) -> Self {
        if valid {
            Self::Verified
        } else {
            Self::Compromised
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => f.write_str("Verified"),
            Self::Compromised => f.write_str("Compromised"),
        }
    }
}

/// Row in the audit-log download.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub block_number: u64,
    pub relief_id: String,
    pub district: String,
    pub state: String,
    pub pin_code: String,
    pub category: String,
    pub timestamp: String,
    pub digest: String,
    pub previous_digest: String,
}

/// Dashboard figures for one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChainSummary {
    /// Non-genesis block count.
    pub record_count: u64,
    pub district_count: u64,
    pub category_counts: BTreeMap<String, u64>,
    pub last_updated: Option<Timestamp>,
    pub integrity: IntegrityStatus,
}

/// Deterministic projection builders.
pub struct ProjectionBuilder;

impl ProjectionBuilder {
    pub fn audit_entries(blocks: &[Block]) -> Vec<AuditEntry> {
        let system = Location::system();
        blocks
            .iter()
            .map(|block| {
                let location = block.payload.location().unwrap_or(&system);
                AuditEntry {
                    block_number: block.sequence_index,
                    relief_id: block.relief_id().to_string(),
                    district: location.district.clone(),
                    state: location.state.clone(),
                    pin_code: location.pin_code.clone(),
                    category: block.payload.category().to_string(),
                    timestamp: block.timestamp.to_string(),
                    digest: block.digest.to_hex(),
                    previous_digest: block.previous_digest.as_text(),
                }
            })
            .collect()
    }

    /// Digest of an exported audit document, for publishing alongside the
    /// download so a copy can be checked against it later.
    pub fn export_digest(document: &str) -> Digest {
        DigestHasher::EXPORT.hash(document.as_bytes())
    }

    pub fn summary(blocks: &[Block], integrity: IntegrityStatus) -> ChainSummary {
        let records = || blocks.iter().filter(|b| !b.is_genesis());

        let districts: BTreeSet<&str> = records()
            .filter_map(|b| b.payload.location())
            .map(|l| l.district.as_str())
            .collect();

        let mut category_counts = BTreeMap::new();
        for block in records() {
            *category_counts
                .entry(block.payload.category().to_string())
                .or_insert(0) += 1;
        }

        ChainSummary {
            record_count: records().count() as u64,
            district_count: districts.len() as u64,
            category_counts,
            last_updated: records().last().map(|b| b.timestamp.clone()),
            integrity,
        }
    }
}
