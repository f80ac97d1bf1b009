//! Fuzz target for the client under arbitrary event sequences
//!
//! Ensure the session invariants hold whatever the server and media do
//! (HIGH priority)
//!
//! # Strategy
//!
//! - User operations: start, skip, end, tab switches, retries
//! - Server pushes: matches with overlapping peer sets, departures, timers
//! - Media: every state in any order, connect failures
//! - Channel: acks with either outcome, drops, clock advances
//!
//! # Invariants
//!
//! - `handle` never panics
//! - Connected implies at least one peer
//! - At most one skip request is unacknowledged

#![no_main]

use std::{collections::VecDeque, time::Duration};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pairline_client::{
    Client, ClientAction, ClientConfig, ClientEvent, Credentials, MediaState, Request,
    SessionState, Tab,
};
use pairline_core::env::test_utils::MockEnv;

const OPEN: &str = r#"0{"sid":"f1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Start,
    Skip,
    End { idle: bool },
    Match { room: u8, peers: Vec<u8> },
    PartnerLeft(u8),
    ServerEnd,
    TimerEnded,
    Media(MediaChoice),
    ConnectFailed,
    Retry,
    Tab { matching: bool },
    Ack { success: bool },
    Drop,
    Reopen,
    Advance { secs: u8 },
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum MediaChoice {
    Connecting,
    Connected,
    Reconnecting,
    Disconnecting,
    Disconnected,
}

impl From<MediaChoice> for MediaState {
    fn from(choice: MediaChoice) -> Self {
        match choice {
            MediaChoice::Connecting => MediaState::Connecting,
            MediaChoice::Connected => MediaState::Connected,
            MediaChoice::Reconnecting => MediaState::Reconnecting,
            MediaChoice::Disconnecting => MediaState::Disconnecting,
            MediaChoice::Disconnected => MediaState::Disconnected,
        }
    }
}

fn partner_info(room: u8, peers: &[u8]) -> String {
    let partners: Vec<String> = peers.iter().map(|p| format!(r#"{{"id":"p{}"}}"#, p % 4)).collect();
    format!(
        r#"42["getPartnerInfo",{{"data":{{"roomId":"r{room}","partners":[{}],"myLiveKitToken":"lk"}}}}]"#,
        partners.join(",")
    )
}

fn ack_id(text: &str) -> Option<u64> {
    let rest = text.strip_prefix("42")?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fuzz_target!(|ops: Vec<Op>| {
    let env = MockEnv::new();
    let config = ClientConfig { media_url: "wss://media.fuzz".into(), ..ClientConfig::default() };
    let mut client = Client::new(env.clone(), config, Credentials::new("me", "token"));
    let mut acks: VecDeque<u64> = VecDeque::new();
    let mut skips_outstanding = 0usize;

    let mut feed = |client: &mut Client<MockEnv>,
                    acks: &mut VecDeque<u64>,
                    skips: &mut usize,
                    event: ClientEvent| {
        let Ok(actions) = client.handle(event) else {
            return;
        };
        for action in actions {
            match action {
                ClientAction::Transmit(text) => {
                    if let Some(id) = ack_id(&text) {
                        acks.push_back(id);
                    }
                    if text.contains(r#""skipCall""#) {
                        *skips += 1;
                    }
                },
                ClientAction::RequestCompleted { request: Request::Skip, .. } => {
                    *skips = skips.saturating_sub(1);
                },
                _ => {},
            }
        }
    };

    feed(&mut client, &mut acks, &mut skips_outstanding, ClientEvent::Start);
    feed(&mut client, &mut acks, &mut skips_outstanding, ClientEvent::TransportOpened);
    feed(&mut client, &mut acks, &mut skips_outstanding, ClientEvent::TransportText(OPEN.into()));
    feed(&mut client, &mut acks, &mut skips_outstanding, ClientEvent::TransportText(r#"40{"sid":"s1"}"#.into()));

    for op in ops.into_iter().take(256) {
        let event = match op {
            Op::Start => ClientEvent::StartMatching,
            Op::Skip => ClientEvent::Skip,
            Op::End { idle: true } => ClientEvent::EndCall { target: SessionState::Idle, notify: true },
            Op::End { idle: false } => {
                ClientEvent::EndCall { target: SessionState::Disconnecting, notify: true }
            },
            Op::Match { room, peers } => ClientEvent::TransportText(partner_info(room % 3, &peers)),
            Op::PartnerLeft(p) => {
                ClientEvent::TransportText(format!(r#"42["partnerLeft",{{"partnerId":"p{}"}}]"#, p % 4))
            },
            Op::ServerEnd => ClientEvent::TransportText(r#"42["end"]"#.into()),
            Op::TimerEnded => ClientEvent::TransportText(r#"42["timerEnded"]"#.into()),
            Op::Media(choice) => ClientEvent::MediaStateChanged(choice.into()),
            Op::ConnectFailed => ClientEvent::MediaConnectFailed { reason: "fuzz".into() },
            Op::Retry => ClientEvent::RetryMedia,
            Op::Tab { matching } => {
                ClientEvent::TabChanged(if matching { Tab::Matching } else { Tab::Other })
            },
            Op::Ack { success } => match acks.pop_front() {
                Some(id) => ClientEvent::TransportText(format!(
                    r#"43{id}[{{"completionStatus":{success}}}]"#
                )),
                None => continue,
            },
            Op::Drop => ClientEvent::TransportClosed { reason: "fuzz".into() },
            Op::Reopen => ClientEvent::TransportOpened,
            Op::Advance { secs } => {
                env.advance(Duration::from_secs(u64::from(secs % 60)));
                ClientEvent::Tick { now: pairline_core::Environment::now(&env) }
            },
        };

        feed(&mut client, &mut acks, &mut skips_outstanding, event);

        if client.state() == SessionState::Connected {
            assert!(!client.coordinator().data().peers.is_empty(), "connected without peers");
        }
        assert!(skips_outstanding <= 1, "{skips_outstanding} skips outstanding");
    }
});
