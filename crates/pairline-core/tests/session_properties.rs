//! Property-based tests for the session and channel state machines.

use std::time::{Duration, Instant};

use pairline_core::{
    ChannelAction, ChannelConfig, ChannelState, Credentials, EventChannel, SessionError,
    SessionMachine, SessionState, Trigger,
};
use proptest::prelude::*;

fn arbitrary_state() -> impl Strategy<Value = SessionState> {
    prop::sample::select(SessionState::ALL.to_vec())
}

fn arbitrary_trigger() -> impl Strategy<Value = Trigger> {
    prop::sample::select(vec![
        Trigger::LocalStart,
        Trigger::MatchDelivered,
        Trigger::MediaConnected,
        Trigger::LocalTeardown,
        Trigger::MediaLost,
        Trigger::RemoteEnd,
        Trigger::MediaDisconnected,
        Trigger::Requeue,
        Trigger::MatchInvalid,
        Trigger::Forced,
    ])
}

/// Inputs the channel can receive from its driver.
#[derive(Debug, Clone)]
enum ChannelInput {
    Text(String),
    Closed,
    Tick(u64),
    Disconnect,
    Reconnect,
}

fn arbitrary_input() -> impl Strategy<Value = ChannelInput> {
    prop_oneof![
        prop::sample::select(vec![
            r#"0{"sid":"e","pingInterval":1000,"pingTimeout":1000}"#.to_string(),
            "40".to_string(),
            "2".to_string(),
            "41".to_string(),
            "1".to_string(),
            r#"42["end"]"#.to_string(),
            r#"430[{"completionStatus":true}]"#.to_string(),
            r#"44{"message":"no"}"#.to_string(),
        ])
        .prop_map(ChannelInput::Text),
        any::<String>().prop_map(ChannelInput::Text),
        Just(ChannelInput::Closed),
        (0u64..10_000).prop_map(ChannelInput::Tick),
        Just(ChannelInput::Disconnect),
        Just(ChannelInput::Reconnect),
    ]
}

proptest! {
    #[test]
    fn prop_transitions_follow_table(
        steps in prop::collection::vec((arbitrary_state(), arbitrary_trigger()), 0..64)
    ) {
        let mut machine = SessionMachine::new();

        for (to, trigger) in steps {
            let before = machine.state();
            match machine.transition(to, trigger) {
                Ok(Some(t)) => {
                    prop_assert!(SessionMachine::allows(t.from, t.to, t.trigger));
                    prop_assert_eq!(machine.state(), to);
                    if to == SessionState::Connected {
                        prop_assert_eq!(before, SessionState::Connecting);
                    }
                },
                Ok(None) => prop_assert_eq!(before, to),
                Err(SessionError::InvalidTransition { from, .. }) => {
                    prop_assert_eq!(from, before);
                    prop_assert_eq!(machine.state(), before);
                },
            }
        }
    }

    #[test]
    fn prop_channel_never_loses_pending_acks_silently(
        inputs in prop::collection::vec(arbitrary_input(), 0..48)
    ) {
        let start = Instant::now();
        let mut now = start;
        let mut channel = EventChannel::new(ChannelConfig::default(), now);
        channel.connect(Credentials::new("u", "t"), now).unwrap();

        let mut sent = 0usize;
        let mut resolved = 0usize;

        for input in inputs {
            let actions = match input {
                ChannelInput::Text(text) => channel.handle_text(&text, now),
                ChannelInput::Closed => channel.handle_transport_closed("test", now),
                ChannelInput::Tick(ms) => {
                    now += Duration::from_millis(ms);
                    channel.tick(now)
                },
                ChannelInput::Disconnect => channel.disconnect(now),
                ChannelInput::Reconnect => channel.connect(Credentials::new("u", "t"), now).unwrap(),
            };
            resolved += actions
                .iter()
                .filter(|a| matches!(a, ChannelAction::AckResolved { .. }))
                .count();

            if channel.is_connected() && channel.send_with_ack(pairline_proto::Outbound::SkipCall, now).is_ok() {
                sent += 1;
            }

            prop_assert_eq!(sent, resolved + channel.pending_acks());
            if matches!(channel.state(), ChannelState::Disconnected) {
                prop_assert_eq!(channel.pending_acks(), 0);
            }
        }
    }
}
