use relief_types::Digest;

/// Domain-separated BLAKE3 hasher.
///
/// Each hasher carries a domain tag (e.g. `"relief-block-v1"`) that is
/// prepended to every hash computation, so a block encoding and an audit
/// export with identical bytes never share a digest.
pub struct DigestHasher {
    domain: &'static str,
}

impl DigestHasher {
    /// Hasher for canonical block encodings.
    pub const BLOCK: Self = Self {
        domain: "relief-block-v1",
    };
    /// Hasher for exported audit documents.
    pub const EXPORT: Self = Self {
        domain: "relief-export-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Digest::from_hash(*hasher.finalize().as_bytes())
    }
}
