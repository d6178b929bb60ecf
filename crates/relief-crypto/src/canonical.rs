//! Canonical byte encoding of a block's hashed fields.
//!
//! The encoding is written by hand rather than derived from serde so that the
//! digest does not depend on any serializer's field ordering, whitespace, or
//! escaping rules. Layout:
//!
//! ```text
//! u64 BE   sequence_index
//! str      timestamp
//! str      payload kind tag
//! u32 BE   field count
//! (str name, opt value)*   payload fields in declared order
//! str      previous digest text ("0" or 64 hex chars)
//!
//! str = u32 BE byte length + UTF-8 bytes
//! opt = 0x00 (absent) | 0x01 str
//! ```

use relief_types::{Digest, Payload, PreviousDigest, Timestamp};

use crate::hasher::DigestHasher;

/// Append-only writer for the canonical layout.
#[derive(Debug, Default)]
pub struct CanonicalEncoder {
    buf: Vec<u8>,
}

impl CanonicalEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u64(&mut self, value: u64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_str(&mut self, value: &str) -> &mut Self {
        self.put_u32(value.len() as u32);
        self.buf.extend_from_slice(value.as_bytes());
        self
    }

    pub fn put_optional_str(&mut self, value: Option<&str>) -> &mut Self {
        match value {
            None => self.buf.push(0x00),
            Some(v) => {
                self.buf.push(0x01);
                self.put_str(v);
            }
        }
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Encode the four hashed fields of a block.
pub fn encode_block(
    sequence_index: u64,
    timestamp: &Timestamp,
    payload: &Payload,
    previous_digest: &PreviousDigest,
) -> Vec<u8> {
    let fields = payload.fields();
    let mut enc = CanonicalEncoder::new();
    enc.put_u64(sequence_index)
        .put_str(timestamp.as_str())
        .put_str(payload.kind().as_str())
        .put_u32(fields.len() as u32);
    for (name, value) in fields {
        enc.put_str(name).put_optional_str(value);
    }
    enc.put_str(&previous_digest.as_text());
    enc.finish()
}

/// Digest of a block's hashed fields.
pub fn block_digest(
    sequence_index: u64,
    timestamp: &Timestamp,
    payload: &Payload,
    previous_digest: &PreviousDigest,
) -> Digest {
    DigestHasher::BLOCK.hash(&encode_block(
        sequence_index,
        timestamp,
        payload,
        previous_digest,
    ))
}
