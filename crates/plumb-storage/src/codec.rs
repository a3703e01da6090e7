//! Object framing and tree entry encoding.
//!
//! Every object is framed as `<kind> <size>\0<payload>`. A tree payload is a
//! run of entries, each `<mode> <name>\0` followed by the 20 raw bytes of the
//! referenced object id, with no separator between entries.

use crate::{EntryMode, ObjectId, ObjectKind, Result, StorageError, TreeEntry};

/// Parsed object header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Object kind from the type tag.
    pub kind: ObjectKind,
    /// Declared payload length.
    pub size: usize,
}

/// Position-based reader over an immutable buffer.
///
/// Each method either consumes a prefix and advances, or fails and leaves the
/// position where it was.
#[derive(Debug, Clone)]
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns the bytes before the next `delim` and moves past the delimiter.
    fn take_until(&mut self, delim: u8) -> Option<&'a [u8]> {
        let rest = self.remaining();
        let idx = rest.iter().position(|&b| b == delim)?;
        self.pos += idx + 1;
        Some(&rest[..idx])
    }

    /// Takes exactly `n` bytes.
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let rest = self.remaining();
        if rest.len() < n {
            return None;
        }
        self.pos += n;
        Some(&rest[..n])
    }
}

/// Encodes the header `"<kind> <len>\0"`.
pub fn encode_header(kind: ObjectKind, payload_len: usize) -> Vec<u8> {
    format!("{} {}\0", kind.as_str(), payload_len).into_bytes()
}

/// Frames `payload` as a complete object.
pub fn encode(kind: ObjectKind, payload: &[u8]) -> Vec<u8> {
    let mut out = encode_header(kind, payload.len());
    out.reserve(payload.len());
    out.extend_from_slice(payload);
    out
}

/// Parses the header and returns it with the offset where the payload starts.
///
/// The declared size is not checked against the buffer; see [`decode`].
pub fn decode_header(raw: &[u8]) -> Result<(Header, usize)> {
    let mut cursor = Cursor::new(raw);

    let tag = cursor
        .take_until(b' ')
        .ok_or_else(|| StorageError::MalformedObject("missing space after type".to_string()))?;
    let size = cursor
        .take_until(0)
        .ok_or_else(|| StorageError::MalformedObject("missing NUL after size".to_string()))?;

    let kind = ObjectKind::parse(tag)?;
    let size = parse_decimal(size).ok_or_else(|| {
        StorageError::MalformedObject(format!(
            "invalid size field: {:?}",
            String::from_utf8_lossy(size)
        ))
    })?;

    Ok((Header { kind, size }, cursor.pos))
}

/// Splits a framed object into its header and payload.
///
/// Fails with [`StorageError::MalformedObject`] when a delimiter is missing,
/// the type tag is unknown, the size is not a decimal number, or the size
/// disagrees with the number of bytes that follow the header.
pub fn decode(raw: &[u8]) -> Result<(Header, &[u8])> {
    let (header, offset) = decode_header(raw)?;
    let payload = &raw[offset..];
    if payload.len() != header.size {
        return Err(StorageError::MalformedObject(format!(
            "header declares {} bytes but payload has {}",
            header.size,
            payload.len()
        )));
    }
    Ok((header, payload))
}

/// Encodes one tree entry: `<mode> <name>\0<20 raw bytes>`.
pub fn encode_tree_entry(mode: EntryMode, name: &str, id: &ObjectId) -> Vec<u8> {
    let mode = mode.to_string();
    let mut out = Vec::with_capacity(mode.len() + name.len() + 2 + ObjectId::LEN);
    out.extend_from_slice(mode.as_bytes());
    out.push(b' ');
    out.extend_from_slice(name.as_bytes());
    out.push(0);
    out.extend_from_slice(id.as_bytes());
    out
}

/// Encodes a full tree payload, sorting entries by name first.
///
/// Sorting here keeps the id of a directory independent of the order its
/// entries were listed in.
pub fn encode_tree(entries: &[TreeEntry]) -> Vec<u8> {
    let mut sorted: Vec<&TreeEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));

    let mut payload = Vec::new();
    for entry in sorted {
        payload.extend_from_slice(&encode_tree_entry(entry.mode, &entry.name, &entry.id));
    }
    payload
}

/// Decodes every entry of a tree payload, in stored order.
///
/// Parsing is bounded by the payload length: an empty payload is an empty
/// tree, and an entry cut short anywhere (including inside its hash) is an
/// error rather than the end of the tree.
pub fn decode_tree_entries(payload: &[u8]) -> Result<Vec<TreeEntry>> {
    let mut cursor = Cursor::new(payload);
    let mut entries = Vec::new();

    while !cursor.is_empty() {
        let offset = cursor.pos;
        let line = cursor.take_until(0).ok_or_else(|| {
            StorageError::MalformedTreeEntry(format!("missing NUL in entry at offset {offset}"))
        })?;
        let (mode, name) = split_mode_name(line, offset)?;
        let hash = cursor.take(ObjectId::LEN).ok_or_else(|| {
            StorageError::MalformedTreeEntry(format!(
                "entry {name:?} at offset {offset} has a truncated hash"
            ))
        })?;
        let id = ObjectId::from_slice(hash)?;

        entries.push(TreeEntry {
            mode,
            name: name.to_string(),
            id,
        });
    }

    Ok(entries)
}

fn split_mode_name(line: &[u8], offset: usize) -> Result<(EntryMode, &str)> {
    let mut parts = line.split(|&b| b == b' ');
    let (Some(mode), Some(name), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(StorageError::MalformedTreeEntry(format!(
            "entry at offset {offset} must contain exactly one space"
        )));
    };

    let mode = EntryMode::parse(mode).ok_or_else(|| {
        StorageError::MalformedTreeEntry(format!(
            "invalid mode {:?} at offset {offset}",
            String::from_utf8_lossy(mode)
        ))
    })?;
    if name.is_empty() {
        return Err(StorageError::MalformedTreeEntry(format!(
            "empty name at offset {offset}"
        )));
    }
    let name = std::str::from_utf8(name).map_err(|_| {
        StorageError::MalformedTreeEntry(format!("name at offset {offset} is not UTF-8"))
    })?;

    Ok((mode, name))
}

/// Parses a non-empty run of ASCII digits. No sign, no whitespace.
fn parse_decimal(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}
