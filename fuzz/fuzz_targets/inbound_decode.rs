//! Fuzz target for Inbound::decode and the ack payload helpers
//!
//! # Strategy
//!
//! - Known event names with arbitrary JSON arguments (type confusion)
//! - Random names (unknown events)
//! - Ack arguments of any shape
//!
//! # Invariants
//!
//! - NEVER panic on server data
//! - Unknown names are always rejected

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pairline_proto::{AckPayload, EventName, Inbound};
use serde_json::Value;

const NAMES: &[&str] = &[
    "showNotification",
    "error",
    "roomCreated",
    "getPartnerInfo",
    "partnerLeft",
    "partnerJoinedVideo",
    "end",
    "timerUpdate",
    "timerExtended",
    "timerEnded",
    "userOnlineChanged",
    "connectedUser",
    "removedUser",
];

#[derive(Debug, Arbitrary)]
enum Name {
    Known(u8),
    Random(String),
}

#[derive(Debug, Arbitrary)]
struct Input {
    name: Name,
    args: Vec<String>,
}

fuzz_target!(|input: Input| {
    let name = match &input.name {
        Name::Known(i) => NAMES[usize::from(*i) % NAMES.len()].to_string(),
        Name::Random(name) => name.clone(),
    };

    // Arguments that are not valid JSON become strings.
    let args: Vec<Value> = input
        .args
        .iter()
        .map(|raw| serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone())))
        .collect();

    let result = Inbound::decode(&name, &args);
    let known = EventName::from_wire(&name).is_some_and(|e| e.is_inbound());
    if !known {
        assert!(result.is_err(), "unknown event {name:?} decoded");
    }

    let ack = AckPayload::new(args);
    let _ = ack.reply().succeeded();
    let _ = ack.roster();
});
