//! Fuzz target for EnginePacket::decode
//!
//! Arbitrary text frames as they would arrive on the WebSocket.
//!
//! # Invariants
//!
//! - Decoding NEVER panics; malformed frames return an error
//! - A decoded packet encodes again, and the re-encoded frame decodes to the
//!   same packet

#![no_main]

use libfuzzer_sys::fuzz_target;
use pairline_proto::{EnginePacket, MAX_PACKET_LEN};

fuzz_target!(|text: &str| {
    let Ok(packet) = EnginePacket::decode(text) else {
        return;
    };

    let encoded = packet.encode().expect("decoded packet must encode");
    if encoded.len() > MAX_PACKET_LEN {
        return;
    }

    let again = EnginePacket::decode(&encoded).expect("re-encoded packet must decode");
    assert_eq!(packet, again, "round trip changed {text:?}");
});
