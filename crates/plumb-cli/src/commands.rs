//! CLI command implementations.

use plumb_storage::{
    ObjectId, ObjectKind, ObjectStore, StorageError, StoreConfig, TreeBuilder, TreeEntry,
};
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Initial contents of `HEAD`.
const DEFAULT_HEAD: &str = "ref: refs/heads/main\n";

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// What `cat-file` should print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatFile {
    Kind,
    Size,
    Pretty,
}

/// Create the storage root, its `objects` and `refs` directories, and `HEAD`.
pub fn init(config: &StoreConfig, out: &mut impl Write) -> Result<()> {
    let git_dir = config.git_dir();
    tracing::info!(path = %git_dir.display(), "Initializing storage root");

    for dir in [
        git_dir.to_path_buf(),
        config.objects_dir(),
        git_dir.join("refs"),
    ] {
        fs::create_dir_all(&dir).map_err(StorageError::fs(&dir))?;
    }

    let head = git_dir.join("HEAD");
    if head.exists() {
        tracing::debug!(path = %head.display(), "HEAD already present, leaving it untouched");
    } else {
        fs::write(&head, DEFAULT_HEAD).map_err(StorageError::fs(&head))?;
    }

    writeln!(out, "Initialized git directory")?;
    Ok(())
}

/// Print an object's kind, size or content.
pub fn cat_file(
    config: &StoreConfig,
    mode: CatFile,
    object: &str,
    out: &mut impl Write,
) -> Result<()> {
    let store = ObjectStore::new(config.clone());
    let object = store.read(&ObjectId::from_hex(object)?)?;

    match mode {
        CatFile::Kind => writeln!(out, "{}", object.kind)?,
        CatFile::Size => writeln!(out, "{}", object.size)?,
        CatFile::Pretty if object.kind == ObjectKind::Tree => {
            let entries = plumb_storage::codec::decode_tree_entries(&object.payload)?;
            write_entries(&entries, false, out)?;
        }
        CatFile::Pretty => out.write_all(&object.payload)?,
    }
    Ok(())
}

/// Whether an object exists and decodes. Prints nothing.
pub fn object_exists(config: &StoreConfig, object: &str) -> Result<bool> {
    let store = ObjectStore::new(config.clone());
    let id = ObjectId::from_hex(object)?;

    match store.read(&id) {
        Ok(_) => Ok(true),
        Err(e) => {
            tracing::debug!(%id, error = %e, "object check failed");
            Ok(false)
        }
    }
}

/// Print a file's blob hash, storing the blob when `write` is set.
pub fn hash_object(
    config: &StoreConfig,
    file: &Path,
    write: bool,
    out: &mut impl Write,
) -> Result<()> {
    let id = if write {
        ObjectStore::new(config.clone()).write_blob_file(file)?
    } else {
        ObjectStore::hash_file(file)?
    };
    tracing::info!(%id, file = %file.display(), stored = write, "Hashed file");

    writeln!(out, "{id}")?;
    Ok(())
}

/// List the entries of a tree.
pub fn ls_tree(
    config: &StoreConfig,
    tree: &str,
    name_only: bool,
    out: &mut impl Write,
) -> Result<()> {
    let store = ObjectStore::new(config.clone());
    let id = ObjectId::from_hex(tree)?;
    let entries = store.read_tree(&id)?;

    write_entries(&entries, name_only, out)
}

/// Snapshot `path` and print the root tree hash.
pub fn write_tree(config: &StoreConfig, path: &Path, out: &mut impl Write) -> Result<()> {
    let store = ObjectStore::new(config.clone());
    let id = TreeBuilder::new(&store).build(path)?;
    tracing::info!(%id, path = %path.display(), "Wrote tree");

    writeln!(out, "{id}")?;
    Ok(())
}

fn write_entries(entries: &[TreeEntry], name_only: bool, out: &mut impl Write) -> Result<()> {
    for entry in entries {
        if name_only {
            writeln!(out, "{}", entry.name)?;
        } else {
            writeln!(
                out,
                "{:06o} {} {}\t{}",
                entry.mode.raw(),
                entry.mode.object_kind(),
                entry.id,
                entry.name
            )?;
        }
    }
    Ok(())
}
