//! Tree entries and directory snapshots.

use crate::{codec, ObjectId, ObjectKind, ObjectStore, Result, StorageError};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Numeric file mode of a tree entry, rendered in octal on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryMode(u32);

impl EntryMode {
    /// A subdirectory.
    pub const DIRECTORY: Self = Self(0o40000);
    /// A regular, non-executable file.
    pub const REGULAR: Self = Self(0o100644);
    /// A regular, executable file.
    pub const EXECUTABLE: Self = Self(0o100755);
    /// A symbolic link. Never produced by [`TreeBuilder`].
    pub const SYMLINK: Self = Self(0o120000);
    /// A submodule commit reference. Never produced by [`TreeBuilder`].
    pub const GITLINK: Self = Self(0o160000);

    const REGULAR_TYPE: u32 = 0o100000;
    const PERMISSION_MASK: u32 = 0o777;

    /// Wraps a raw mode value.
    pub fn from_raw(mode: u32) -> Self {
        Self(mode)
    }

    /// Mode of a regular file with the given permission bits.
    pub fn regular_file(permissions: u32) -> Self {
        Self(Self::REGULAR_TYPE | (permissions & Self::PERMISSION_MASK))
    }

    /// Derives the mode of a regular file from its metadata.
    #[cfg(unix)]
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        use std::os::unix::fs::PermissionsExt;
        Self::regular_file(metadata.permissions().mode())
    }

    /// Derives the mode of a regular file from its metadata.
    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &fs::Metadata) -> Self {
        Self::REGULAR
    }

    /// Parses the octal mode token of a tree entry.
    pub fn parse(token: &[u8]) -> Option<Self> {
        if token.is_empty() || !token.iter().all(|b| (b'0'..=b'7').contains(b)) {
            return None;
        }
        let token = std::str::from_utf8(token).ok()?;
        u32::from_str_radix(token, 8).ok().map(Self)
    }

    /// Returns the raw mode value.
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Whether the entry references a tree.
    pub fn is_tree(&self) -> bool {
        *self == Self::DIRECTORY
    }

    /// The kind of object this entry points at.
    pub fn object_kind(&self) -> ObjectKind {
        match *self {
            Self::DIRECTORY => ObjectKind::Tree,
            Self::GITLINK => ObjectKind::Commit,
            _ => ObjectKind::Blob,
        }
    }
}

impl fmt::Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Octal::fmt(&self.0, f)
    }
}

/// One named reference inside a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// File mode.
    pub mode: EntryMode,
    /// Path segment, never containing a separator.
    pub name: String,
    /// The referenced blob or tree.
    pub id: ObjectId,
}

/// Snapshots a directory hierarchy into an [`ObjectStore`].
///
/// Files become blobs, subdirectories become trees, depth first. A failure
/// anywhere aborts the build; objects already written stay in the store.
pub struct TreeBuilder<'a> {
    store: &'a ObjectStore,
    excluded: Vec<OsString>,
}

impl<'a> TreeBuilder<'a> {
    /// Creates a builder that skips the store's own root directory name.
    pub fn new(store: &'a ObjectStore) -> Self {
        let excluded = store
            .config()
            .reserved_name()
            .map(OsStr::to_os_string)
            .into_iter()
            .collect();
        Self { store, excluded }
    }

    /// Adds a directory entry name to skip at every level.
    pub fn exclude(mut self, name: impl Into<OsString>) -> Self {
        self.excluded.push(name.into());
        self
    }

    /// Writes the tree for `dir` and everything below it, returning its id.
    pub fn build(&self, dir: &Path) -> Result<ObjectId> {
        let mut entries = Vec::new();

        for dirent in fs::read_dir(dir).map_err(StorageError::fs(dir))? {
            let dirent = dirent.map_err(StorageError::fs(dir))?;
            let file_name = dirent.file_name();
            if self.excluded.contains(&file_name) {
                tracing::trace!(dir = %dir.display(), name = ?file_name, "skipping excluded entry");
                continue;
            }

            let path = dirent.path();
            let file_type = dirent.file_type().map_err(StorageError::fs(&path))?;
            let name = file_name.into_string().map_err(|_| StorageError::Filesystem {
                path: path.clone(),
                source: io::Error::new(io::ErrorKind::InvalidData, "file name is not valid UTF-8"),
            })?;

            if file_type.is_dir() {
                if self.is_store_dir(&path) {
                    tracing::trace!(path = %path.display(), "skipping store directory");
                    continue;
                }
                let id = self.build(&path)?;
                entries.push(TreeEntry {
                    mode: EntryMode::DIRECTORY,
                    name,
                    id,
                });
            } else if file_type.is_file() {
                let metadata = dirent.metadata().map_err(StorageError::fs(&path))?;
                let id = self.store.write_blob_file(&path)?;
                entries.push(TreeEntry {
                    mode: EntryMode::from_metadata(&metadata),
                    name,
                    id,
                });
            } else {
                tracing::debug!(path = %path.display(), "skipping entry that is neither file nor directory");
            }
        }

        let payload = codec::encode_tree(&entries);
        let id = self.store.write(ObjectKind::Tree, &payload)?;
        tracing::debug!(dir = %dir.display(), %id, entries = entries.len(), "wrote tree");
        Ok(id)
    }

    /// Whether `path` resolves to the storage root or its object directory.
    ///
    /// Catches roots such as `.` or `work/..` that have no name to exclude.
    fn is_store_dir(&self, path: &Path) -> bool {
        let Ok(path) = fs::canonicalize(path) else {
            return false;
        };
        let config = self.store.config();
        [config.git_dir().to_path_buf(), config.objects_dir()]
            .iter()
            .filter_map(|root| fs::canonicalize(root).ok())
            .any(|root| root == path)
    }
}
