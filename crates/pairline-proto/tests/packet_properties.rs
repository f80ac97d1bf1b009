//! Property and snapshot tests for the wire codec.
//!
//! The decoder sits directly on untrusted server input, so the main property
//! is totality: arbitrary text never panics. Outbound encodings are pinned
//! with inline snapshots because the server matches on exact JSON keys.

use pairline_proto::{
    ChangeShouldCall, ChangeUserOnline, EnginePacket, ExtendTimer, Inbound, JoinedVideo, Outbound,
    SocketPacket, StartMatching, UserTarget,
};
use proptest::prelude::*;
use serde_json::{Value, json};

fn encode(event: Outbound, ack_id: Option<u64>) -> String {
    let packet = event.into_packet(ack_id).unwrap();
    EnginePacket::Message(packet).encode().unwrap()
}

/// Strategy for text that looks like a Socket.IO frame often enough to reach
/// the deeper decode paths.
fn frame_like() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<String>(),
        ("[0-6]", "[0-6]?", "(/[a-z]{0,4},)?", "[0-9]{0,22}", any::<String>())
            .prop_map(|(a, b, ns, id, rest)| format!("{a}{b}{ns}{id}{rest}")),
        ("[0-9]{0,4}", "[a-zA-Z]{0,12}").prop_map(|(id, name)| format!("42{id}[\"{name}\"]")),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::hash_map("[a-zA-Z]{1,10}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_engine_decode_never_panics(text in frame_like()) {
        let _ = EnginePacket::decode(&text);
    }

    #[test]
    fn prop_inbound_decode_never_panics(
        name in prop_oneof![
            Just("getPartnerInfo".to_string()),
            Just("userOnlineChanged".to_string()),
            Just("connectedUser".to_string()),
            Just("timerUpdate".to_string()),
            Just("error".to_string()),
            Just("roomCreated".to_string()),
            "[a-zA-Z]{0,16}",
        ],
        args in prop::collection::vec(json_value(), 0..3),
    ) {
        let _ = Inbound::decode(&name, &args);
    }

    #[test]
    fn prop_event_packets_survive_encoding(
        ack_id in proptest::option::of(any::<u64>()),
        name in "[a-zA-Z]{1,16}",
        args in prop::collection::vec(json_value(), 0..3),
    ) {
        let packet = SocketPacket::Event { ack_id, name, args };
        let text = EnginePacket::Message(packet.clone()).encode().unwrap();
        prop_assert_eq!(EnginePacket::decode(&text).unwrap(), EnginePacket::Message(packet));
    }
}

#[test]
fn start_matching_wire_format() {
    let event = Outbound::StartMatching(StartMatching { id: "u1".into(), token: "t".into() });
    insta::assert_snapshot!(encode(event, None), @r#"42["startMatching",{"id":"u1","token":"t"}]"#);
}

#[test]
fn skip_call_wire_format() {
    insta::assert_snapshot!(encode(Outbound::SkipCall, Some(4)), @r#"424["skipCall"]"#);
}

#[test]
fn joined_video_wire_format() {
    let event = Outbound::JoinedVideo(JoinedVideo { room_id: "r1".into(), meet_time: 180 });
    insta::assert_snapshot!(encode(event, None), @r#"42["joinedVideo",{"roomId":"r1","meetTime":180}]"#);
}

#[test]
fn extend_timer_wire_format() {
    let event = Outbound::ExtendTimer(ExtendTimer { room_id: "r1".into(), seconds: 60 });
    insta::assert_snapshot!(encode(event, None), @r#"42["extendTimer",{"roomId":"r1","seconds":60}]"#);
}

#[test]
fn change_should_call_wire_format() {
    let event = Outbound::ChangeShouldCall(ChangeShouldCall { should_call: false });
    insta::assert_snapshot!(encode(event, None), @r#"42["changeShouldCall",{"shouldCall":false}]"#);
}

#[test]
fn change_user_online_wire_format() {
    let event = Outbound::ChangeUserOnline(ChangeUserOnline {
        id: "u1".into(),
        token: "t".into(),
        is_online: true,
        is_busy: false,
    });
    insta::assert_snapshot!(
        encode(event, Some(0)),
        @r#"420["changeUserOnline",{"id":"u1","token":"t","isOnline":true,"isBusy":false}]"#
    );
}

#[test]
fn connect_book_wire_format() {
    let target = || UserTarget { to: "p1".into() };
    insta::assert_snapshot!(
        encode(Outbound::ConnectUserRequest(target()), Some(1)),
        @r#"421["connectUserRequest",{"to":"p1"}]"#
    );
    insta::assert_snapshot!(
        encode(Outbound::CancelConnectUserRequest(target()), Some(2)),
        @r#"422["cancelConnectUserRequest",{"to":"p1"}]"#
    );
    insta::assert_snapshot!(
        encode(Outbound::RemoveUserRequest(target()), Some(3)),
        @r#"423["removeUserRequest",{"to":"p1"}]"#
    );
}

#[test]
fn end_wire_format() {
    insta::assert_snapshot!(encode(Outbound::End, None), @r#"42["end"]"#);
}
