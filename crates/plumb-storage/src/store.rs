//! On-disk content-addressed object store.
//!
//! Objects live at `<objects>/<2 hex chars>/<38 hex chars>`, each file holding
//! the zlib-compressed framed object. The directory layout is the only index.

use crate::{
    codec, compression, hash, Object, ObjectHasher, ObjectId, ObjectKind, Result, StorageError,
    StoreConfig, TreeEntry,
};
use bytes::Bytes;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Content-addressed object store backed by a directory.
///
/// There is no cache and no locking: every call goes to disk, and a single
/// process is assumed to own the directory.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    config: StoreConfig,
    objects_dir: PathBuf,
}

impl ObjectStore {
    /// Creates a store for the given configuration. Nothing is touched on disk.
    pub fn new(config: StoreConfig) -> Self {
        let objects_dir = config.objects_dir();
        Self {
            config,
            objects_dir,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the directory holding the shard directories.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Returns where the object with `id` is stored.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        self.objects_dir.join(id.shard()).join(id.file_name())
    }

    /// Stores an object and returns its id.
    ///
    /// The file is staged in the shard directory and renamed over the target,
    /// so an existing file is replaced even when it is read-only. Identical
    /// ids imply identical content.
    pub fn write(&self, kind: ObjectKind, payload: &[u8]) -> Result<ObjectId> {
        let encoded = codec::encode(kind, payload);
        let id = hash::hash(&encoded);

        let shard = self.objects_dir.join(id.shard());
        fs::create_dir_all(&shard).map_err(StorageError::fs(&shard))?;
        self.apply_mode(&shard, self.config.dir_mode)?;

        let compressed = compression::compress(&encoded, self.config.compression)?;
        let path = shard.join(id.file_name());

        // Renamed into place so a read-only file from an earlier write is replaced.
        let mut staged = NamedTempFile::new_in(&shard).map_err(StorageError::fs(&shard))?;
        staged
            .write_all(&compressed)
            .map_err(StorageError::fs(staged.path()))?;
        self.apply_mode(staged.path(), self.config.file_mode)?;
        staged
            .persist(&path)
            .map_err(|e| StorageError::fs(&path)(e.error))?;

        tracing::debug!(%id, %kind, size = payload.len(), "wrote object");
        Ok(id)
    }

    /// Reads and decodes the object with `id`.
    ///
    /// A missing or unreadable file is reported as
    /// [`StorageError::ObjectNotFound`].
    pub fn read(&self, id: &ObjectId) -> Result<Object> {
        let path = self.object_path(id);
        let compressed = fs::read(&path).map_err(|e| {
            tracing::debug!(%id, path = %path.display(), error = %e, "object file unavailable");
            StorageError::ObjectNotFound(id.to_hex())
        })?;

        let decompressed = compression::decompress(&compressed).map_err(|e| e.in_object(id))?;
        let encoded = Bytes::from(decompressed);
        let (header, payload) = codec::decode(&encoded).map_err(|e| e.in_object(id))?;
        let payload = encoded.slice_ref(payload);

        tracing::trace!(%id, kind = %header.kind, size = header.size, "read object");
        Ok(Object {
            kind: header.kind,
            size: header.size,
            payload,
        })
    }

    /// Reads the object named by a 40-character hex id.
    pub fn read_hex(&self, hex: &str) -> Result<Object> {
        self.read(&ObjectId::from_hex(hex)?)
    }

    /// Whether an object file exists for `id`.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.object_path(id).is_file()
    }

    /// Reads a tree object and decodes its entries in stored order.
    pub fn read_tree(&self, id: &ObjectId) -> Result<Vec<TreeEntry>> {
        let object = self.read(id)?;
        if object.kind != ObjectKind::Tree {
            return Err(StorageError::MalformedObject(format!(
                "{id}: expected tree, found {}",
                object.kind
            )));
        }
        codec::decode_tree_entries(&object.payload).map_err(|e| e.in_object(id))
    }

    /// Reads a file from disk and stores it as a blob.
    pub fn write_blob_file(&self, path: &Path) -> Result<ObjectId> {
        let content = fs::read(path).map_err(StorageError::fs(path))?;
        self.write(ObjectKind::Blob, &content)
    }

    /// Computes the blob id of a file without storing it.
    pub fn hash_file(path: &Path) -> Result<ObjectId> {
        let mut file = fs::File::open(path).map_err(StorageError::fs(path))?;
        let len = file.metadata().map_err(StorageError::fs(path))?.len();
        let len = usize::try_from(len).map_err(|_| StorageError::Filesystem {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "file too large"),
        })?;

        let mut hasher = ObjectHasher::new(ObjectKind::Blob, len);
        let mut buf = [0u8; 8192];
        let mut seen = 0usize;
        loop {
            let n = file.read(&mut buf).map_err(StorageError::fs(path))?;
            if n == 0 {
                break;
            }
            seen += n;
            hasher.update(&buf[..n]);
        }
        if seen != len {
            return Err(StorageError::Filesystem {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("file changed while hashing: expected {len} bytes, read {seen}"),
                ),
            });
        }
        Ok(hasher.finish())
    }

    #[cfg(unix)]
    fn apply_mode(&self, path: &Path, mode: Option<u32>) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        if let Some(mode) = mode {
            fs::set_permissions(path, fs::Permissions::from_mode(mode))
                .map_err(StorageError::fs(path))?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn apply_mode(&self, _path: &Path, _mode: Option<u32>) -> Result<()> {
        Ok(())
    }
}
