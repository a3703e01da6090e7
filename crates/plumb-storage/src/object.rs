//! Object types and identifiers.

use crate::{codec, hash, Result, StorageError};
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 20-byte SHA-1 object identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 20]);

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ObjectId::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl ObjectId {
    /// Length of the raw digest in bytes.
    pub const LEN: usize = 20;

    /// Length of the hex form.
    pub const HEX_LEN: usize = 40;

    /// Creates an ObjectId from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an ObjectId from a raw slice, which must be exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; 20] = bytes.try_into().map_err(|_| {
            StorageError::InvalidObjectId(format!("expected 20 raw bytes, got {}", bytes.len()))
        })?;
        Ok(Self(raw))
    }

    /// Creates an ObjectId from a 40-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() != Self::HEX_LEN {
            return Err(StorageError::InvalidObjectId(format!(
                "invalid object id length: {}",
                hex.len()
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex, &mut bytes)
            .map_err(|e| StorageError::InvalidObjectId(format!("{hex}: {e}")))?;
        Ok(Self(bytes))
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns the lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The shard directory name: the first two hex characters.
    pub fn shard(&self) -> String {
        hex::encode(&self.0[..1])
    }

    /// The object file name inside the shard: the remaining 38 hex characters.
    pub fn file_name(&self) -> String {
        hex::encode(&self.0[1..])
    }

    /// Computes the id of an object of the given kind holding `payload`.
    pub fn hash_object(kind: ObjectKind, payload: &[u8]) -> Self {
        let mut hasher = hash::ObjectHasher::new(kind, payload.len());
        hasher.update(payload);
        hasher.finish()
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for ObjectId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

/// Object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// File content.
    Blob,
    /// Directory listing.
    Tree,
    /// Commit object. Never produced here, but readable.
    Commit,
    /// Annotated tag. Never produced here, but readable.
    Tag,
}

impl ObjectKind {
    /// Returns the type tag used in the object header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }

    /// Parses a header type tag.
    pub fn parse(tag: &[u8]) -> Result<Self> {
        match tag {
            b"blob" => Ok(Self::Blob),
            b"tree" => Ok(Self::Tree),
            b"commit" => Ok(Self::Commit),
            b"tag" => Ok(Self::Tag),
            _ => Err(StorageError::MalformedObject(format!(
                "unknown object type: {:?}",
                String::from_utf8_lossy(tag)
            ))),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded object as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    /// The kind from the header.
    pub kind: ObjectKind,
    /// The size declared in the header. Always equals `payload.len()`.
    pub size: usize,
    /// The uncompressed payload, without header.
    pub payload: Bytes,
}

impl Object {
    /// Creates an object, taking the size from the payload.
    pub fn new(kind: ObjectKind, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        Self {
            kind,
            size: payload.len(),
            payload,
        }
    }

    /// Creates a blob object from file content.
    pub fn blob(content: impl Into<Bytes>) -> Self {
        Self::new(ObjectKind::Blob, content)
    }

    /// Returns the framed bytes: header followed by payload.
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self.kind, &self.payload)
    }

    /// Recomputes the content hash of this object.
    pub fn id(&self) -> ObjectId {
        ObjectId::hash_object(self.kind, &self.payload)
    }
}
