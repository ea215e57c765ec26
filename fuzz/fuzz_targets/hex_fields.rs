#![no_main]

use libfuzzer_sys::fuzz_target;
use canfault_core::frame::{MAX_EXTENDED_ID, MAX_PAYLOAD_LEN, parse_can_id, parse_hex_payload};

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        if let Ok(id) = parse_can_id(raw) {
            assert!(id <= MAX_EXTENDED_ID);
        }
        if let Ok(payload) = parse_hex_payload(raw) {
            assert!(payload.len() <= MAX_PAYLOAD_LEN);
        }
    }
});
