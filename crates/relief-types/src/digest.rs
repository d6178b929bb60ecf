use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Text written in place of a backward link on the genesis block.
pub const GENESIS_SENTINEL: &str = "0";

/// 32-byte block digest.
///
/// Serialized as 64 lowercase hex characters so persisted chains stay
/// readable in an audit download.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Create a `Digest` from a pre-computed hash.
    pub const fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Backward link stored on every block.
///
/// The genesis block carries the fixed sentinel `"0"`; every other block
/// carries the digest of its predecessor.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviousDigest {
    Sentinel,
    Block(Digest),
}

impl PreviousDigest {
    /// Returns `true` if this is the genesis sentinel.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::Sentinel)
    }

    /// The linked digest, if any.
    pub fn digest(&self) -> Option<&Digest> {
        match self {
            Self::Sentinel => None,
            Self::Block(d) => Some(d),
        }
    }

    /// Returns `true` if this link points at `digest`.
    pub fn links_to(&self, digest: &Digest) -> bool {
        self.digest() == Some(digest)
    }

    /// Wire text: `"0"` or 64 hex characters.
    pub fn as_text(&self) -> String {
        match self {
            Self::Sentinel => GENESIS_SENTINEL.to_string(),
            Self::Block(d) => d.to_hex(),
        }
    }

    /// Parse wire text produced by [`PreviousDigest::as_text`].
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s == GENESIS_SENTINEL {
            Ok(Self::Sentinel)
        } else {
            Digest::from_hex(s).map(Self::Block)
        }
    }
}

impl From<Digest> for PreviousDigest {
    fn from(digest: Digest) -> Self {
        Self::Block(digest)
    }
}

impl fmt::Debug for PreviousDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sentinel => write!(f, "PreviousDigest(sentinel)"),
            Self::Block(d) => write!(f, "PreviousDigest({})", d.short_hex()),
        }
    }
}

impl fmt::Display for PreviousDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl Serialize for PreviousDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_text())
    }
}

impl<'de> Deserialize<'de> for PreviousDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
