//! Property-based tests for the object pipeline.
//!
//! Covers the codec, compression and store round-trips for arbitrary
//! payloads, and tree snapshots against generated directory layouts.

use plumb_storage::{
    codec, compression, hash, CompressionLevel, EntryMode, ObjectId, ObjectKind, ObjectStore,
    StorageError, StoreConfig, TreeBuilder, TreeEntry,
};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;

fn kind_strategy() -> impl Strategy<Value = ObjectKind> {
    prop_oneof![
        Just(ObjectKind::Blob),
        Just(ObjectKind::Tree),
        Just(ObjectKind::Commit),
        Just(ObjectKind::Tag),
    ]
}

fn level_strategy() -> impl Strategy<Value = CompressionLevel> {
    prop_oneof![
        Just(CompressionLevel::None),
        Just(CompressionLevel::Fast),
        Just(CompressionLevel::Default),
        Just(CompressionLevel::Best),
    ]
}

/// Payloads deflate shrinks a lot: long runs of a byte, or a short pattern
/// repeated up to 64 KiB.
fn compressible_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        (any::<u8>(), 0usize..=64 * 1024).prop_map(|(b, n)| vec![b; n]),
        (prop::collection::vec(any::<u8>(), 1..32), 1usize..2048)
            .prop_map(|(pattern, times)| pattern.repeat(times)),
    ]
}

fn object_id_strategy() -> impl Strategy<Value = ObjectId> {
    prop::array::uniform20(any::<u8>()).prop_map(ObjectId::from_bytes)
}

/// Entry names: no separators, no NUL, no spaces, unique per tree.
fn tree_entries_strategy() -> impl Strategy<Value = Vec<TreeEntry>> {
    prop::collection::btree_map(
        "[a-zA-Z0-9._-]{1,16}",
        (
            prop_oneof![
                Just(EntryMode::REGULAR),
                Just(EntryMode::EXECUTABLE),
                Just(EntryMode::DIRECTORY),
            ],
            object_id_strategy(),
        ),
        0..20,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(name, (mode, id))| TreeEntry { mode, name, id })
            .collect()
    })
}

fn temp_store() -> (TempDir, ObjectStore) {
    let dir = TempDir::new().unwrap();
    let store = ObjectStore::new(StoreConfig::with_git_dir(dir.path().join(".git")));
    (dir, store)
}

proptest! {
    /// Property: decoding a framed object yields the kind, length and payload
    #[test]
    fn prop_codec_roundtrip(
        kind in kind_strategy(),
        payload in prop::collection::vec(any::<u8>(), 0..4096),
    ) {
        let raw = codec::encode(kind, &payload);
        let (header, decoded) = codec::decode(&raw).unwrap();

        prop_assert_eq!(header.kind, kind);
        prop_assert_eq!(header.size, payload.len());
        prop_assert_eq!(decoded, &payload[..]);
    }

    /// Property: decompress(compress(b)) == b at every level
    #[test]
    fn prop_compression_roundtrip(
        data in prop::collection::vec(any::<u8>(), 0..8192),
        level in level_strategy(),
    ) {
        let compressed = compression::compress(&data, level).unwrap();
        prop_assert_eq!(compression::decompress(&compressed).unwrap(), data);
    }

    /// Property: compressible payloads round-trip at every level
    #[test]
    fn prop_compression_roundtrip_compressible(
        data in compressible_strategy(),
        level in level_strategy(),
    ) {
        let compressed = compression::compress(&data, level).unwrap();
        prop_assert_eq!(compression::decompress(&compressed).unwrap(), data);
    }

    /// Property: hashing is a pure function of the bytes
    #[test]
    fn prop_hash_deterministic(data in prop::collection::vec(any::<u8>(), 0..1024)) {
        prop_assert_eq!(hash::hash(&data), hash::hash(&data));
    }

    /// Property: distinct inputs hash differently
    #[test]
    fn prop_hash_distinguishes(
        a in prop::collection::vec(any::<u8>(), 0..256),
        b in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(hash::hash(&a), hash::hash(&b));
    }

    /// Property: arbitrary bytes never panic the decoders
    #[test]
    fn prop_decoders_never_panic(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = codec::decode(&data);
        let _ = codec::decode_tree_entries(&data);
        let _ = compression::decompress(&data);
    }

    /// Property: tree payloads decode to the same entries, sorted by name
    #[test]
    fn prop_tree_entries_roundtrip(entries in tree_entries_strategy()) {
        let mut shuffled = entries.clone();
        shuffled.reverse();

        let payload = codec::encode_tree(&shuffled);
        let decoded = codec::decode_tree_entries(&payload).unwrap();
        prop_assert_eq!(decoded, entries);
    }

    /// Property: a tree payload cut short is rejected, never silently shortened
    #[test]
    fn prop_truncated_tree_rejected(
        entries in tree_entries_strategy(),
        cut in 1usize..21,
    ) {
        prop_assume!(!entries.is_empty());
        let mut payload = codec::encode_tree(&entries);
        payload.truncate(payload.len() - cut);

        let err = codec::decode_tree_entries(&payload).unwrap_err();
        prop_assert!(matches!(err, StorageError::MalformedTreeEntry(_)));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: read(write(blob, p)) == {blob, len(p), p}
    #[test]
    fn prop_store_roundtrip(payload in prop::collection::vec(any::<u8>(), 0..16384)) {
        let (_dir, store) = temp_store();
        let id = store.write(ObjectKind::Blob, &payload).unwrap();
        let object = store.read(&id).unwrap();

        prop_assert_eq!(object.kind, ObjectKind::Blob);
        prop_assert_eq!(object.size, payload.len());
        prop_assert_eq!(object.payload.as_ref(), &payload[..]);
        prop_assert_eq!(object.id(), id);
    }

    /// Property: compressible blobs read back intact from the store
    #[test]
    fn prop_store_roundtrip_compressible(payload in compressible_strategy()) {
        let (_dir, store) = temp_store();
        let id = store.write(ObjectKind::Blob, &payload).unwrap();
        let object = store.read(&id).unwrap();

        prop_assert_eq!(object.size, payload.len());
        prop_assert_eq!(object.payload.as_ref(), &payload[..]);
    }

    /// Property: the built tree lists exactly the files written, in name order
    #[test]
    fn prop_tree_build_lists_files(
        files in prop::collection::btree_map(
            "[a-z0-9]{1,12}",
            prop::collection::vec(any::<u8>(), 0..64),
            1..12,
        ),
    ) {
        let (dir, store) = temp_store();
        let root = dir.path().join("work");
        fs::create_dir(&root).unwrap();
        for (name, content) in &files {
            fs::write(root.join(name), content).unwrap();
        }

        let builder = TreeBuilder::new(&store);
        let id = builder.build(&root).unwrap();
        prop_assert_eq!(builder.build(&root).unwrap(), id);

        let entries = store.read_tree(&id).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        let expected: Vec<&str> = files.keys().map(String::as_str).collect();
        prop_assert_eq!(names, expected);

        for entry in &entries {
            let blob = store.read(&entry.id).unwrap();
            prop_assert_eq!(blob.payload.as_ref(), &files[&entry.name][..]);
        }
    }
}

#[test]
fn hello_blob_known_vector() {
    let (_dir, store) = temp_store();
    let id = store.write(ObjectKind::Blob, b"hello\n").unwrap();
    assert_eq!(id.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
    assert_eq!(hash::hash(b"blob 6\0hello\n"), id);
}

#[test]
fn large_text_blob_roundtrip() {
    let (_dir, store) = temp_store();
    let text: String = (0..5000)
        .map(|i| format!("line {i}: lorem ipsum dolor sit amet\n"))
        .collect();
    let id = store.write(ObjectKind::Blob, text.as_bytes()).unwrap();

    let object = store.read(&id).unwrap();
    assert_eq!(object.size, text.len());
    assert_eq!(object.payload.as_ref(), text.as_bytes());
    assert_eq!(object.id(), id);
}

#[test]
fn decode_without_nul_is_malformed() {
    let err = codec::decode(b"blob 6 hello").unwrap_err();
    assert!(matches!(err, StorageError::MalformedObject(_)));
}

#[test]
fn read_absent_object_is_not_found() {
    let (_dir, store) = temp_store();
    let err = store
        .read_hex("ce013625030ba8dba906f756967f9e9ca394464a")
        .unwrap_err();
    assert!(matches!(err, StorageError::ObjectNotFound(_)));
}

#[test]
fn tree_build_matches_git_layout() {
    let (dir, store) = temp_store();
    let root = dir.path().join("work");
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("hello.txt"), "hello\n").unwrap();
    fs::write(root.join("sub/empty.txt"), "").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        for file in ["hello.txt", "sub/empty.txt"] {
            fs::set_permissions(root.join(file), fs::Permissions::from_mode(0o644)).unwrap();
        }
    }

    let id = TreeBuilder::new(&store).build(&root).unwrap();

    // Same ids `git write-tree` produces for this layout.
    assert_eq!(id.to_hex(), "3d7d0eb40904dc8f8fa07dbcc3205b95e58ec306");

    let entries = store.read_tree(&id).unwrap();
    let names: BTreeSet<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, BTreeSet::from(["hello.txt", "sub"]));
    assert_eq!(entries[0].id.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");
    assert_eq!(entries[1].mode, EntryMode::DIRECTORY);
    assert_eq!(entries[1].id.to_hex(), "7015cf066692cff6f1cc228eeb31632b73cef98a");

    let sub_entries = store.read_tree(&entries[1].id).unwrap();
    assert_eq!(sub_entries.len(), 1);
    assert_eq!(sub_entries[0].id.to_hex(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
}
