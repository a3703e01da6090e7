//! Fuzz target for tree payload parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use plumb_storage::codec;

fuzz_target!(|data: &[u8]| {
    let _ = codec::decode_tree_entries(data);
});
