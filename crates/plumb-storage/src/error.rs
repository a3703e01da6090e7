//! Storage error types.

use crate::ObjectId;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested object has no backing file.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// The stored bytes are not a valid compressed stream.
    #[error("corrupt storage: {0}")]
    CorruptStorage(String),

    /// The object header framing is invalid.
    #[error("malformed object: {0}")]
    MalformedObject(String),

    /// The tree payload framing is invalid.
    #[error("malformed tree entry: {0}")]
    MalformedTreeEntry(String),

    /// A string could not be parsed as an object id.
    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    /// An underlying filesystem operation failed.
    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        /// Path the operation was acting on.
        path: PathBuf,
        /// The I/O error reported by the OS.
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    /// Returns a closure that wraps an I/O error with the given path.
    ///
    /// Intended for `map_err`: `fs::read(&p).map_err(StorageError::fs(&p))`.
    pub fn fs(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Attaches the id of the object being decoded to parse errors.
    pub(crate) fn in_object(self, id: &ObjectId) -> Self {
        match self {
            Self::CorruptStorage(detail) => Self::CorruptStorage(format!("{id}: {detail}")),
            Self::MalformedObject(detail) => Self::MalformedObject(format!("{id}: {detail}")),
            Self::MalformedTreeEntry(detail) => {
                Self::MalformedTreeEntry(format!("{id}: {detail}"))
            }
            other => other,
        }
    }
}
