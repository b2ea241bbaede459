use weft_types::BlobId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g., `"weft-frozen-v1"`) that is
/// prepended to every hash computation. This prevents cross-type hash
/// collisions: a frozen record and a blob with identical bytes produce
/// different identities.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for frozen-storage content.
    pub const FROZEN: Self = Self {
        domain: "weft-frozen-v1",
    };
    /// Hasher for blob content.
    pub const BLOB: Self = Self {
        domain: "weft-blob-v1",
    };
    /// Hasher for serialized delta checksums.
    pub const DELTA: Self = Self {
        domain: "weft-delta-v1",
    };
    /// Hasher for user-storage record identities.
    pub const RECORD: Self = Self {
        domain: "weft-record-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// Hash the concatenation of two byte strings with domain separation.
    ///
    /// Used for derived identities (e.g. record id = storage id + user key).
    pub fn hash_pair(&self, a: &[u8], b: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(a);
        hasher.update(b);
        *hasher.finalize().as_bytes()
    }

    /// Verify that data produces the expected hash.
    pub fn verify(&self, data: &[u8], expected: &[u8; 32]) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Incremental hasher for streamed blob content.
///
/// Blob identity is computed as data is written and finalized at close, so
/// the id depends only on the total byte sequence, never on how the writes
/// were chunked.
pub struct BlobHasher {
    inner: blake3::Hasher,
    bytes_hashed: u64,
}

impl BlobHasher {
    /// Start a new incremental blob hash.
    pub fn new() -> Self {
        let mut inner = blake3::Hasher::new();
        inner.update(ContentHasher::BLOB.domain.as_bytes());
        inner.update(b":");
        Self {
            inner,
            bytes_hashed: 0,
        }
    }

    /// Feed the next chunk of blob content.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
        self.bytes_hashed += data.len() as u64;
    }

    /// Total content bytes hashed so far.
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes_hashed
    }

    /// Finalize and return the blob's content identity.
    pub fn finalize(self) -> BlobId {
        BlobId::from_array(*self.inner.finalize().as_bytes())
    }
}

impl Default for BlobHasher {
    fn default() -> Self {
        Self::new()
    }
}
