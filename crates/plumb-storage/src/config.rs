//! Store configuration.

use crate::CompressionLevel;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Default name of the storage root directory.
pub const DEFAULT_GIT_DIR: &str = ".git";

/// Name of the object directory under the storage root.
pub const OBJECTS_DIR: &str = "objects";

/// Configuration for an [`ObjectStore`](crate::ObjectStore).
///
/// Permission bits are applied to created files and directories explicitly on
/// Unix, so the result does not depend on the process umask. `None` leaves
/// whatever the OS chose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Storage root, e.g. `.git`.
    pub git_dir: PathBuf,
    /// Compression applied to object files.
    pub compression: CompressionLevel,
    /// Permission bits for shard directories.
    pub dir_mode: Option<u32>,
    /// Permission bits for object files.
    pub file_mode: Option<u32>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            git_dir: PathBuf::from(DEFAULT_GIT_DIR),
            compression: CompressionLevel::default(),
            dir_mode: Some(0o755),
            file_mode: Some(0o644),
        }
    }
}

impl StoreConfig {
    /// Creates a configuration rooted at `git_dir` with default settings.
    pub fn with_git_dir(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
            ..Self::default()
        }
    }

    /// The directory holding the shard directories.
    pub fn objects_dir(&self) -> PathBuf {
        self.git_dir.join(OBJECTS_DIR)
    }

    /// The directory name a tree snapshot must skip to avoid walking the store.
    pub fn reserved_name(&self) -> Option<&OsStr> {
        self.git_dir.file_name()
    }

    /// Returns the storage root.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.git_dir, PathBuf::from(".git"));
        assert_eq!(config.objects_dir(), PathBuf::from(".git/objects"));
        assert_eq!(config.reserved_name(), Some(OsStr::new(".git")));
        assert_eq!(config.compression, CompressionLevel::Default);
    }

    #[test]
    fn test_reserved_name_uses_last_component() {
        let config = StoreConfig::with_git_dir("/srv/repo/.plumb");
        assert_eq!(config.reserved_name(), Some(OsStr::new(".plumb")));
        assert_eq!(config.objects_dir(), PathBuf::from("/srv/repo/.plumb/objects"));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"git_dir": "store", "compression": "best"}"#).unwrap();
        assert_eq!(config.git_dir, PathBuf::from("store"));
        assert_eq!(config.compression, CompressionLevel::Best);
        assert_eq!(config.dir_mode, Some(0o755));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = StoreConfig {
            file_mode: None,
            ..StoreConfig::with_git_dir("x/.git")
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: StoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
