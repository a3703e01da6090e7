//! Zlib compression of framed objects.
//!
//! The level only affects size and speed; any level round-trips.

use crate::{Result, StorageError};
use flate2::write::ZlibEncoder;
use flate2::{Decompress, FlushDecompress, Status};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Compression level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// No compression (stored deflate blocks)
    None,
    /// Fast compression (lower ratio)
    Fast,
    /// Default compression (balanced)
    #[default]
    Default,
    /// Best compression (slower, higher ratio)
    Best,
}

impl CompressionLevel {
    /// Converts to flate2 compression level.
    pub fn to_flate2(self) -> flate2::Compression {
        match self {
            CompressionLevel::None => flate2::Compression::none(),
            CompressionLevel::Fast => flate2::Compression::fast(),
            CompressionLevel::Default => flate2::Compression::default(),
            CompressionLevel::Best => flate2::Compression::best(),
        }
    }
}

impl std::str::FromStr for CompressionLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "fast" => Ok(Self::Fast),
            "default" => Ok(Self::Default),
            "best" => Ok(Self::Best),
            other => Err(format!(
                "unknown compression level '{other}' (expected none, fast, default or best)"
            )),
        }
    }
}

/// Compresses `data` into a zlib stream.
pub fn compress(data: &[u8], level: CompressionLevel) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), level.to_flate2());
    encoder
        .write_all(data)
        .map_err(|e| StorageError::CorruptStorage(format!("compression failed: {e}")))?;
    encoder
        .finish()
        .map_err(|e| StorageError::CorruptStorage(format!("compression failed: {e}")))
}

/// Inflates a zlib stream.
///
/// Truncated input, a bad header, an Adler-32 mismatch or bytes trailing the
/// end of the stream fail with [`StorageError::CorruptStorage`].
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    // The low-level API is used so a stream that ends early is reported
    // instead of yielding a short buffer.
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len().saturating_mul(2).max(64));
    loop {
        if out.len() == out.capacity() {
            out.reserve(out.capacity());
        }
        let (before_in, before_out) = (inflater.total_in(), inflater.total_out());
        let consumed = usize::try_from(before_in).unwrap_or(data.len()).min(data.len());
        let status = inflater
            .decompress_vec(&data[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| StorageError::CorruptStorage(format!("invalid zlib stream: {e}")))?;

        match status {
            Status::StreamEnd => {
                let used = inflater.total_in();
                if used != data.len() as u64 {
                    return Err(StorageError::CorruptStorage(format!(
                        "invalid zlib stream: {} trailing bytes after end of stream",
                        data.len() as u64 - used
                    )));
                }
                return Ok(out);
            }
            Status::Ok | Status::BufError => {
                let stalled =
                    inflater.total_in() == before_in && inflater.total_out() == before_out;
                if stalled && out.len() < out.capacity() {
                    return Err(StorageError::CorruptStorage(
                        "invalid zlib stream: unexpected end of input".to_string(),
                    ));
                }
            }
        }
    }
}
