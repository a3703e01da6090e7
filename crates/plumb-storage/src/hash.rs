//! Content hashing using SHA-1.
//!
//! An object's id is the SHA-1 digest of its full framed byte stream:
//! `<kind> <size>\0<payload>`. No salt or metadata is mixed in.

use crate::{codec, ObjectId, ObjectKind};
use sha1::{Digest, Sha1};

/// Hashes an already framed object.
pub fn hash(encoded: &[u8]) -> ObjectId {
    let digest = Sha1::digest(encoded);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&digest);
    ObjectId::from_bytes(bytes)
}

/// Incremental hasher for an object whose payload arrives in chunks.
///
/// The header is hashed up front from the declared length, so the caller
/// must feed exactly `len` payload bytes before calling [`finish`].
///
/// [`finish`]: ObjectHasher::finish
pub struct ObjectHasher {
    inner: Sha1,
}

impl ObjectHasher {
    /// Starts hashing an object of `kind` with a payload of `len` bytes.
    pub fn new(kind: ObjectKind, len: usize) -> Self {
        let mut inner = Sha1::new();
        inner.update(codec::encode_header(kind, len));
        Self { inner }
    }

    /// Feeds a chunk of payload.
    pub fn update(&mut self, chunk: &[u8]) {
        self.inner.update(chunk);
    }

    /// Returns the object id.
    pub fn finish(self) -> ObjectId {
        let digest = self.inner.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest);
        ObjectId::from_bytes(bytes)
    }
}
