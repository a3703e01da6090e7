//! Content-addressed object storage for Plumb.
//!
//! Objects (blobs and trees) are framed as `<kind> <size>\0<payload>`,
//! identified by the SHA-1 of that framing, zlib-compressed, and stored under
//! a sharded `objects/` directory. [`TreeBuilder`] maps a directory hierarchy
//! onto a DAG of such objects.
//!
//! ```no_run
//! use plumb_storage::{ObjectKind, ObjectStore, StoreConfig, TreeBuilder};
//! use std::path::Path;
//!
//! # fn main() -> plumb_storage::Result<()> {
//! let store = ObjectStore::new(StoreConfig::default());
//! let blob = store.write(ObjectKind::Blob, b"hello\n")?;
//! assert_eq!(blob.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
//!
//! let tree = TreeBuilder::new(&store).build(Path::new("."))?;
//! for entry in store.read_tree(&tree)? {
//!     println!("{} {}", entry.mode, entry.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod compression;
mod config;
mod error;
pub mod hash;
mod object;
mod store;
mod tree;

pub use compression::CompressionLevel;
pub use config::{StoreConfig, DEFAULT_GIT_DIR, OBJECTS_DIR};
pub use error::StorageError;
pub use hash::ObjectHasher;
pub use object::{Object, ObjectId, ObjectKind};
pub use store::ObjectStore;
pub use tree::{EntryMode, TreeBuilder, TreeEntry};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
