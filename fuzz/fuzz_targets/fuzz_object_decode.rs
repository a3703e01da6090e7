//! Fuzz target for object header parsing.
//!
//! Tests that header decoding handles arbitrary input without panicking and
//! that anything it accepts re-encodes to the same bytes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use plumb_storage::codec;

fuzz_target!(|data: &[u8]| {
    if let Ok((header, payload)) = codec::decode(data) {
        assert_eq!(header.size, payload.len());
        // Leading zeros in the size field are accepted but not reproduced.
        let reencoded = codec::encode(header.kind, payload);
        if reencoded.len() == data.len() {
            assert_eq!(reencoded, data);
        }
    }
});
