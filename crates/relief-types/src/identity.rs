use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::error::TypeError;

const BENEFICIARY_PREFIX: &str = "BEN-";
const BENEFICIARY_HEX_LEN: usize = 12;

/// Digest of an identity credential.
///
/// Sessions keep this instead of the raw credential. The domain tag keeps it
/// distinct from block digests computed over the same bytes.
pub fn credential_digest(credential: &str) -> Digest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"relief-credential-v1:");
    hasher.update(credential.as_bytes());
    Digest::from_hash(*hasher.finalize().as_bytes())
}

/// Stable identifier of a beneficiary.
///
/// Derived deterministically from the verified identity credential:
/// `BEN-` followed by the first 12 hex characters (upper case) of the
/// credential digest. The same credential always yields the same id, which
/// is what ties repeat logins to the same identity-scoped chain.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BeneficiaryId(String);

impl BeneficiaryId {
    /// Derive the beneficiary id for a credential.
    pub fn derive(credential: &str) -> Self {
        let hex = credential_digest(credential).to_hex();
        Self(format!(
            "{BENEFICIARY_PREFIX}{}",
            hex[..BENEFICIARY_HEX_LEN].to_uppercase()
        ))
    }

    /// Parse and validate an id of the form `BEN-XXXXXXXXXXXX`.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let Some(rest) = s.strip_prefix(BENEFICIARY_PREFIX) else {
            return Err(TypeError::InvalidBeneficiaryId(s.to_string()));
        };
        let well_formed = rest.len() == BENEFICIARY_HEX_LEN
            && rest
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c));
        if !well_formed {
            return Err(TypeError::InvalidBeneficiaryId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for BeneficiaryId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BeneficiaryId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BeneficiaryId> for String {
    fn from(id: BeneficiaryId) -> Self {
        id.0
    }
}

impl fmt::Debug for BeneficiaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BeneficiaryId({})", self.0)
    }
}

impl fmt::Display for BeneficiaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        let a = BeneficiaryId::derive("123456789012");
        let b = BeneficiaryId::derive("123456789012");
        assert_eq!(a, b);
    }

    #[test]
    fn different_credentials_produce_different_ids() {
        let a = BeneficiaryId::derive("123456789012");
        let b = BeneficiaryId::derive("123456789013");
        assert_ne!(a, b);
    }

    #[test]
    fn derived_id_has_expected_shape() {
        let id = BeneficiaryId::derive("999988887777");
        assert!(id.as_str().starts_with("BEN-"));
        assert_eq!(id.as_str().len(), 16);
        assert_eq!(BeneficiaryId::parse(id.as_str()).unwrap(), id);
    }

    #[test]
    fn parse_rejects_malformed_ids() {
        assert!(BeneficiaryId::parse("BEN-123").is_err());
        assert!(BeneficiaryId::parse("XYZ-0123456789AB").is_err());
        assert!(BeneficiaryId::parse("BEN-0123456789ab").is_err());
    }

    #[test]
    fn serde_validates_on_read() {
        let id = BeneficiaryId::derive("111122223333");
        let json = serde_json::to_string(&id).unwrap();
        let parsed: BeneficiaryId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);

        let bad: Result<BeneficiaryId, _> = serde_json::from_str("\"BEN-nope\"");
        assert!(bad.is_err());
    }

    #[test]
    fn credential_digest_is_domain_separated() {
        let d = credential_digest("123456789012");
        assert_ne!(d.as_bytes(), blake3::hash(b"123456789012").as_bytes());
    }
}
