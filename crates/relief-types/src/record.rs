//! Relief records carried as block payloads.
//!
//! Payloads are a closed tagged union: a genesis placeholder, an
//! officer- or beneficiary-originated disbursement, or a beneficiary claim.
//! Constructors validate required fields; deserialization restores stored
//! values verbatim so that digests recompute bit-for-bit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::BeneficiaryId;

/// Placeholder used for optional free-text fields left blank.
pub const NOT_APPLICABLE: &str = "N/A";

/// Human-readable relief record identifier, e.g. `RP-WB-20260201-007`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReliefId(String);

impl ReliefId {
    /// Identifier carried by every genesis block.
    pub const GENESIS: &'static str = "GENESIS";

    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(TypeError::MissingField("relief_id"));
        }
        Ok(Self(id))
    }

    /// `<prefix>-<YYYYMMDD>-<NNN>`, with `sequence` zero-padded to 3 digits.
    pub fn generate(prefix: &str, date_stamp: &str, sequence: u64) -> Self {
        Self(format!("{prefix}-{date_stamp}-{sequence:03}"))
    }

    pub fn genesis() -> Self {
        Self(Self::GENESIS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ReliefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReliefId({})", self.0)
    }
}

impl fmt::Display for ReliefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Relief type, the key of the one-grant-per-category rule.
///
/// Normalized to trimmed upper case on construction so `food` and `FOOD`
/// are the same category.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReliefCategory(String);

impl ReliefCategory {
    /// Category reported by genesis blocks. Never valid for a real record.
    pub const GENESIS: &'static str = "GENESIS_BLOCK";

    pub fn new(name: &str) -> Result<Self, TypeError> {
        let normalized = name.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(TypeError::MissingField("category"));
        }
        if normalized == Self::GENESIS {
            return Err(TypeError::ReservedCategory(normalized));
        }
        Ok(Self(normalized))
    }

    pub fn genesis() -> Self {
        Self(Self::GENESIS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ReliefCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReliefCategory({})", self.0)
    }
}

impl fmt::Display for ReliefCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where relief was delivered, as resolved from a postal PIN code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub district: String,
    pub state: String,
    pub post_office: String,
    pub block_code: String,
    pub pin_code: String,
}

impl Location {
    /// Validate and build a location. A blank block code becomes `N/A`.
    pub fn new(
        district: impl Into<String>,
        state: impl Into<String>,
        post_office: impl Into<String>,
        block_code: impl Into<String>,
        pin_code: impl Into<String>,
    ) -> Result<Self, TypeError> {
        let district = district.into().trim().to_string();
        if district.is_empty() {
            return Err(TypeError::MissingField("district"));
        }
        let pin_code = pin_code.into().trim().to_string();
        if !is_valid_pin_code(&pin_code) {
            return Err(TypeError::InvalidPinCode(pin_code));
        }
        Ok(Self {
            district,
            state: state.into().trim().to_string(),
            post_office: post_office.into().trim().to_string(),
            block_code: or_not_applicable(block_code.into()),
            pin_code,
        })
    }

    /// Placeholder location of genesis blocks.
    pub fn system() -> Self {
        Self {
            district: "SYSTEM".into(),
            state: String::new(),
            post_office: String::new(),
            block_code: "INIT".into(),
            pin_code: String::new(),
        }
    }
}

/// Returns `true` for a 6-digit postal PIN code.
pub fn is_valid_pin_code(pin: &str) -> bool {
    pin.len() == 6 && pin.chars().all(|c| c.is_ascii_digit())
}

fn or_not_applicable(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        NOT_APPLICABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Who initiated a global-ledger disbursement record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Recorded by a relief officer.
    Officer,
    /// Replicated from a beneficiary's own claim.
    Beneficiary,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Officer => "officer",
            Self::Beneficiary => "beneficiary",
        }
    }
}

/// System placeholder stored at index 0 of every chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisRecord {
    pub relief_id: ReliefId,
    pub beneficiary_id: Option<BeneficiaryId>,
    pub note: String,
}

impl GenesisRecord {
    pub fn global() -> Self {
        Self {
            relief_id: ReliefId::genesis(),
            beneficiary_id: None,
            note: "ReliefProof WB Genesis Block".into(),
        }
    }

    pub fn for_beneficiary(beneficiary_id: BeneficiaryId) -> Self {
        Self {
            relief_id: ReliefId::genesis(),
            beneficiary_id: Some(beneficiary_id),
            note: "Beneficiary Relief Chain Genesis Block".into(),
        }
    }
}

/// A relief handout recorded on the global ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisbursementRecord {
    pub relief_id: ReliefId,
    pub location: Location,
    pub category: ReliefCategory,
    pub quantity: String,
    pub notes: String,
    pub origin: Origin,
}

impl DisbursementRecord {
    /// Officer-recorded disbursement. Blank quantity or notes become `N/A`.
    pub fn officer(
        relief_id: ReliefId,
        location: Location,
        category: ReliefCategory,
        quantity: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            relief_id,
            location,
            category,
            quantity: or_not_applicable(quantity.into()),
            notes: or_not_applicable(notes.into()),
            origin: Origin::Officer,
        }
    }

    /// Global-ledger copy of a beneficiary claim.
    pub fn replicated_from(claim: &ClaimRecord) -> Self {
        Self {
            relief_id: claim.relief_id.clone(),
            location: claim.location.clone(),
            category: claim.category.clone(),
            quantity: "Beneficiary Claimed".into(),
            notes: "Citizen-initiated claim".into(),
            origin: Origin::Beneficiary,
        }
    }
}

/// A beneficiary's own claim, stored on their identity-scoped chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub relief_id: ReliefId,
    pub beneficiary_id: BeneficiaryId,
    pub location: Location,
    pub category: ReliefCategory,
    pub receipt_date: Option<String>,
}

/// Discriminant of a [`Payload`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Genesis,
    Disbursement,
    Claim,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Genesis => "genesis",
            Self::Disbursement => "disbursement",
            Self::Claim => "claim",
        }
    }
}

/// Block payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Genesis(GenesisRecord),
    Disbursement(DisbursementRecord),
    Claim(ClaimRecord),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Genesis(_) => PayloadKind::Genesis,
            Self::Disbursement(_) => PayloadKind::Disbursement,
            Self::Claim(_) => PayloadKind::Claim,
        }
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self, Self::Genesis(_))
    }

    /// The identifying field used for record lookup.
    pub fn relief_id(&self) -> &ReliefId {
        match self {
            Self::Genesis(g) => &g.relief_id,
            Self::Disbursement(d) => &d.relief_id,
            Self::Claim(c) => &c.relief_id,
        }
    }

    /// Category of the record; genesis reports [`ReliefCategory::GENESIS`].
    pub fn category(&self) -> ReliefCategory {
        match self {
            Self::Genesis(_) => ReliefCategory::genesis(),
            Self::Disbursement(d) => d.category.clone(),
            Self::Claim(c) => c.category.clone(),
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::Genesis(_) => None,
            Self::Disbursement(d) => Some(&d.location),
            Self::Claim(c) => Some(&c.location),
        }
    }

    pub fn beneficiary_id(&self) -> Option<&BeneficiaryId> {
        match self {
            Self::Genesis(g) => g.beneficiary_id.as_ref(),
            Self::Disbursement(_) => None,
            Self::Claim(c) => Some(&c.beneficiary_id),
        }
    }

    /// Named fields in their fixed encoding order.
    ///
    /// This order is part of the digest format. Appending a field is a format
    /// change and requires a new hasher domain.
    pub fn fields(&self) -> Vec<(&'static str, Option<&str>)> {
        match self {
            Self::Genesis(g) => vec![
                ("relief_id", Some(g.relief_id.as_str())),
                ("beneficiary_id", g.beneficiary_id.as_ref().map(BeneficiaryId::as_str)),
                ("note", Some(g.note.as_str())),
            ],
            Self::Disbursement(d) => {
                let mut fields = vec![("relief_id", Some(d.relief_id.as_str()))];
                push_location(&mut fields, &d.location);
                fields.extend([
                    ("category", Some(d.category.as_str())),
                    ("quantity", Some(d.quantity.as_str())),
                    ("notes", Some(d.notes.as_str())),
                    ("origin", Some(d.origin.as_str())),
                ]);
                fields
            }
            Self::Claim(c) => {
                let mut fields = vec![
                    ("relief_id", Some(c.relief_id.as_str())),
                    ("beneficiary_id", Some(c.beneficiary_id.as_str())),
                ];
                push_location(&mut fields, &c.location);
                fields.extend([
                    ("category", Some(c.category.as_str())),
                    ("receipt_date", c.receipt_date.as_deref()),
                ]);
                fields
            }
        }
    }
}

fn push_location<'a>(fields: &mut Vec<(&'static str, Option<&'a str>)>, location: &'a Location) {
    fields.extend([
        ("district", Some(location.district.as_str())),
        ("state", Some(location.state.as_str())),
        ("post_office", Some(location.post_office.as_str())),
        ("block_code", Some(location.block_code.as_str())),
        ("pin_code", Some(location.pin_code.as_str())),
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kolkata() -> Location {
        Location::new("Kolkata", "West Bengal", "GPO", "", "700001").unwrap()
    }

    #[test]
    fn category_is_normalized() {
        let c = ReliefCategory::new("  food ").unwrap();
        assert_eq!(c.as_str(), "FOOD");
        assert_eq!(c, ReliefCategory::new("FOOD").unwrap());
    }

    #[test]
    fn genesis_category_is_reserved() {
        let err = ReliefCategory::new("genesis_block").unwrap_err();
        assert_eq!(err, TypeError::ReservedCategory("GENESIS_BLOCK".into()));
        assert!(ReliefCategory::new("   ").is_err());
    }

    #[test]
    fn relief_id_generation_pads_sequence() {
        let id = ReliefId::generate("RP-WB", "20260201", 7);
        assert_eq!(id.as_str(), "RP-WB-20260201-007");
        let wide = ReliefId::generate("RP-WB", "20260201", 1234);
        assert_eq!(wide.as_str(), "RP-WB-20260201-1234");
    }

    #[test]
    fn location_validates_pin_code() {
        assert!(Location::new("X", "S", "PO", "B", "12345").is_err());
        assert!(Location::new("X", "S", "PO", "B", "12a456").is_err());
        assert!(matches!(
            Location::new(" ", "S", "PO", "B", "123456"),
            Err(TypeError::MissingField("district"))
        ));
        assert_eq!(kolkata().block_code, NOT_APPLICABLE);
    }

    #[test]
    fn officer_disbursement_fills_blank_fields() {
        let d = DisbursementRecord::officer(
            ReliefId::new("RP-1").unwrap(),
            kolkata(),
            ReliefCategory::new("food").unwrap(),
            "",
            " ",
        );
        assert_eq!(d.quantity, NOT_APPLICABLE);
        assert_eq!(d.notes, NOT_APPLICABLE);
        assert_eq!(d.origin, Origin::Officer);
    }

    #[test]
    fn replicated_claim_keeps_relief_id_and_tags_origin() {
        let claim = ClaimRecord {
            relief_id: ReliefId::new("RP-2").unwrap(),
            beneficiary_id: BeneficiaryId::derive("123456789012"),
            location: kolkata(),
            category: ReliefCategory::new("medicine").unwrap(),
            receipt_date: None,
        };
        let d = DisbursementRecord::replicated_from(&claim);
        assert_eq!(d.relief_id, claim.relief_id);
        assert_eq!(d.category, claim.category);
        assert_eq!(d.origin, Origin::Beneficiary);
    }

    #[test]
    fn payload_is_internally_tagged() {
        let payload = Payload::Genesis(GenesisRecord::global());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "genesis");
        assert_eq!(json["relief_id"], "GENESIS");
        let parsed: Payload = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn genesis_reports_reserved_category() {
        let payload = Payload::Genesis(GenesisRecord::for_beneficiary(BeneficiaryId::derive(
            "123456789012",
        )));
        assert_eq!(payload.category().as_str(), ReliefCategory::GENESIS);
        assert!(payload.beneficiary_id().is_some());
        assert!(payload.location().is_none());
    }

    #[test]
    fn field_order_is_fixed() {
        let payload = Payload::Disbursement(DisbursementRecord::officer(
            ReliefId::new("RP-3").unwrap(),
            kolkata(),
            ReliefCategory::new("water").unwrap(),
            "10",
            "",
        ));
        let names: Vec<_> = payload.fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            [
                "relief_id",
                "district",
                "state",
                "post_office",
                "block_code",
                "pin_code",
                "category",
                "quantity",
                "notes",
                "origin"
            ]
        );
    }
}
