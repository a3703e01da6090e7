//! Fuzz target for stored object inflation.
//!
//! Runs the read path minus the filesystem: inflate, then decode the header.

#![no_main]

use libfuzzer_sys::fuzz_target;
use plumb_storage::{codec, compression};

fuzz_target!(|data: &[u8]| {
    if let Ok(encoded) = compression::decompress(data) {
        let _ = codec::decode(&encoded);
    }
});
