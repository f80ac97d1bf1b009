//! Scripted Socket.IO signaling server.
//!
//! `SimServer` speaks the same Engine.IO/Socket.IO text framing as the real
//! server, using the codec from `pairline_proto`. Tests drive it explicitly:
//! it answers the handshake and acks on its own, records everything the
//! client sends, and delivers pushes only when a test queues them.
//!
//! With chaos enabled, queued pushes are duplicated and reordered by a
//! seeded RNG so failures replay exactly.

use std::collections::{BTreeSet, VecDeque};

use pairline_proto::{EnginePacket, OpenHandshake, SocketPacket};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// One event the client sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedEvent {
    /// Event name.
    pub name: String,
    /// Event arguments.
    pub args: Vec<Value>,
    /// Ack id, when the client expects a reply.
    pub ack_id: Option<u64>,
}

/// How the server answers acked requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckPolicy {
    /// Reply immediately with success.
    Succeed,
    /// Reply immediately with `completionStatus: false`.
    Fail,
    /// Never reply; the client's deadline fires instead.
    Withhold,
}

/// Seeded push perturbation.
struct Chaos {
    rng: ChaCha8Rng,
    /// Percent chance a push is delivered twice.
    duplicate_pct: u32,
    /// Percent chance a push jumps ahead of the previous one.
    reorder_pct: u32,
}

/// Scripted signaling server for one client.
pub struct SimServer {
    reachable: bool,
    connected: bool,
    sessions: u64,
    ack_policy: AckPolicy,
    /// Users the server reports as already mutual on `connectUserRequest`.
    friends_of: BTreeSet<String>,
    /// Roster returned in the `changeUserOnline` ack.
    roster: Vec<Value>,
    received: Vec<ReceivedEvent>,
    withheld: Vec<ReceivedEvent>,
    outbox: VecDeque<String>,
    rejected: usize,
    chaos: Option<Chaos>,
}

impl Default for SimServer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimServer {
    /// Reachable server that acks every request with success.
    pub fn new() -> Self {
        Self {
            reachable: true,
            connected: false,
            sessions: 0,
            ack_policy: AckPolicy::Succeed,
            friends_of: BTreeSet::new(),
            roster: Vec::new(),
            received: Vec::new(),
            withheld: Vec::new(),
            outbox: VecDeque::new(),
            rejected: 0,
            chaos: None,
        }
    }

    /// Duplicate and reorder pushes using a seeded RNG.
    #[must_use]
    pub fn with_chaos(mut self, seed: u64, duplicate_pct: u32, reorder_pct: u32) -> Self {
        self.chaos =
            Some(Chaos { rng: ChaCha8Rng::seed_from_u64(seed), duplicate_pct, reorder_pct });
        self
    }

    /// Make new connections fail or succeed.
    pub fn set_reachable(&mut self, reachable: bool) {
        self.reachable = reachable;
    }

    /// Whether new connections succeed.
    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    /// Change how acked requests are answered.
    pub fn set_ack_policy(&mut self, policy: AckPolicy) {
        self.ack_policy = policy;
    }

    /// Report `user_id` as already mutual on connect requests.
    pub fn add_friend(&mut self, user_id: &str) {
        self.friends_of.insert(user_id.to_string());
    }

    /// Roster entry returned in the next presence acks.
    pub fn add_roster_entry(&mut self, user_id: &str, status: &str) {
        self.roster.push(json!({ "userId": user_id, "status": status }));
    }

    /// A client transport connected. Queues the Engine.IO open packet.
    pub fn accept(&mut self) {
        self.sessions += 1;
        self.connected = true;
        self.outbox.clear();

        let open = EnginePacket::Open(OpenHandshake {
            sid: format!("engine-{}", self.sessions),
            upgrades: Vec::new(),
            ping_interval: 25_000,
            ping_timeout: 20_000,
            max_payload: Some(1_000_000),
        });
        self.queue_packet(&open);
    }

    /// The client transport went away.
    pub fn disconnect(&mut self) {
        self.connected = false;
        self.outbox.clear();
    }

    /// Whether a client transport is attached.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Process one text frame from the client.
    pub fn receive(&mut self, text: &str) {
        let packet = match EnginePacket::decode(text) {
            Ok(packet) => packet,
            Err(err) => {
                warn!(%err, "server rejected frame");
                self.rejected += 1;
                return;
            },
        };

        match packet {
            EnginePacket::Message(SocketPacket::Connect { .. }) => {
                let sid = format!("socket-{}", self.sessions);
                self.queue_packet(&EnginePacket::Message(SocketPacket::Connect {
                    data: Some(json!({ "sid": sid })),
                }));
            },
            EnginePacket::Message(SocketPacket::Event { ack_id, name, args }) => {
                debug!(%name, ?ack_id, "server received");
                let event = ReceivedEvent { name, args, ack_id };
                self.received.push(event.clone());
                if event.ack_id.is_some() {
                    match self.ack_policy {
                        AckPolicy::Withhold => self.withheld.push(event),
                        AckPolicy::Succeed => self.reply(&event, true),
                        AckPolicy::Fail => self.reply(&event, false),
                    }
                }
            },
            EnginePacket::Message(SocketPacket::Disconnect) | EnginePacket::Close => {
                self.connected = false;
            },
            _ => {},
        }
    }

    /// Answer every withheld request.
    pub fn release_acks(&mut self, success: bool) {
        for event in std::mem::take(&mut self.withheld) {
            self.reply(&event, success);
        }
    }

    fn reply(&mut self, event: &ReceivedEvent, success: bool) {
        let Some(ack_id) = event.ack_id else { return };

        let payload = match event.name.as_str() {
            "changeUserOnline" => json!({ "usersOnline": self.roster }),
            "connectUserRequest" => {
                let to = event.args.first().and_then(|a| a.get("to")).and_then(Value::as_str);
                let is_friends = to.is_some_and(|id| self.friends_of.contains(id));
                json!({ "completionStatus": success, "data": { "isFriends": is_friends } })
            },
            _ => json!({ "completionStatus": success }),
        };

        self.queue_packet(&EnginePacket::Message(SocketPacket::Ack {
            ack_id,
            args: vec![payload],
        }));
    }

    /// Queue a server push with one payload argument.
    pub fn push(&mut self, name: &str, payload: Value) {
        self.push_args(name, vec![payload]);
    }

    /// Queue a server push with no arguments.
    pub fn push_bare(&mut self, name: &str) {
        self.push_args(name, Vec::new());
    }

    fn push_args(&mut self, name: &str, args: Vec<Value>) {
        let packet = EnginePacket::Message(SocketPacket::Event {
            ack_id: None,
            name: name.to_string(),
            args,
        });
        let text = match packet.encode() {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, "push not encodable");
                return;
            },
        };

        let Some(chaos) = self.chaos.as_mut() else {
            self.outbox.push_back(text);
            return;
        };

        let copies = if chaos.rng.gen_range(0..100) < chaos.duplicate_pct { 2 } else { 1 };
        for _ in 0..copies {
            if !self.outbox.is_empty() && chaos.rng.gen_range(0..100) < chaos.reorder_pct {
                let at = self.outbox.len() - 1;
                self.outbox.insert(at, text.clone());
            } else {
                self.outbox.push_back(text.clone());
            }
        }
    }

    /// Deliver a match to the client.
    pub fn deliver_match(&mut self, room_id: &str, peers: &[&str], token: &str) {
        let partners: Vec<Value> = peers.iter().map(|id| json!({ "id": id })).collect();
        self.push(
            "getPartnerInfo",
            json!({
                "data": {
                    "roomId": room_id,
                    "myInfo": { "id": "me" },
                    "partners": partners,
                    "myLiveKitToken": token,
                }
            }),
        );
    }

    /// Send the Engine.IO ping.
    pub fn ping(&mut self) {
        self.queue_packet(&EnginePacket::Ping);
    }

    fn queue_packet(&mut self, packet: &EnginePacket) {
        match packet.encode() {
            Ok(text) => self.outbox.push_back(text),
            Err(err) => warn!(%err, "server packet not encodable"),
        }
    }

    /// Next frame for the client, if connected.
    pub fn next_frame(&mut self) -> Option<String> {
        if self.connected { self.outbox.pop_front() } else { None }
    }

    /// Frames waiting for delivery.
    pub fn queued(&self) -> usize {
        self.outbox.len()
    }

    /// Everything the client sent, in order.
    pub fn received(&self) -> &[ReceivedEvent] {
        &self.received
    }

    /// How many times the client sent `name`.
    pub fn count(&self, name: &str) -> usize {
        self.received.iter().filter(|e| e.name == name).count()
    }

    /// Names of received events, in order.
    pub fn received_names(&self) -> Vec<&str> {
        self.received.iter().map(|e| e.name.as_str()).collect()
    }

    /// Requests still waiting for a reply.
    pub fn withheld(&self) -> &[ReceivedEvent] {
        &self.withheld
    }

    /// Frames from the client that failed to decode.
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Completed transport sessions.
    pub fn sessions(&self) -> u64 {
        self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_and_ack() {
        let mut server = SimServer::new();
        server.accept();
        assert!(server.next_frame().is_some_and(|f| f.starts_with("0{")));

        server.receive("40");
        assert_eq!(server.next_frame().as_deref(), Some(r#"40{"sid":"socket-1"}"#));

        server.receive(r#"421["skipCall"]"#);
        assert_eq!(server.next_frame().as_deref(), Some(r#"431[{"completionStatus":true}]"#));
        assert_eq!(server.count("skipCall"), 1);
    }

    #[test]
    fn withheld_acks_are_released() {
        let mut server = SimServer::new();
        server.accept();
        server.next_frame();
        server.set_ack_policy(AckPolicy::Withhold);

        server.receive(r#"420["connectUserRequest",{"to":"p1"}]"#);
        assert_eq!(server.queued(), 0);
        assert_eq!(server.withheld().len(), 1);

        server.release_acks(false);
        assert_eq!(
            server.next_frame().as_deref(),
            Some(r#"430[{"completionStatus":false,"data":{"isFriends":false}}]"#)
        );
    }

    #[test]
    fn chaos_is_reproducible() {
        let run = |seed| {
            let mut server = SimServer::new().with_chaos(seed, 50, 50);
            server.accept();
            server.next_frame();
            for i in 0..20 {
                server.push("timerUpdate", json!({ "timerValue": i }));
            }
            std::iter::from_fn(|| server.next_frame()).collect::<Vec<_>>()
        };

        assert_eq!(run(7), run(7));
        assert!(run(7).len() >= 20);
    }

    #[test]
    fn nothing_delivered_while_disconnected() {
        let mut server = SimServer::new();
        server.push_bare("end");
        assert_eq!(server.next_frame(), None);
    }
}
