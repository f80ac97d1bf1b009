//! Signaling channel state machine.
//!
//! Manages one Socket.IO connection: handshake, keepalive, reconnect
//! backoff and acknowledgment deadlines. Uses the action pattern: methods
//! take time as input and return actions for the driver to execute.
//!
//! # State Machine
//!
//! ```text
//!               connect                 CONNECT reply
//! ┌──────────────┐ ───────> ┌────────────┐ ──────> ┌───────────┐
//! │ Disconnected │          │ Connecting │         │ Connected │
//! └──────────────┘ <─────── └────────────┘         └───────────┘
//!        ^        disconnect   │      ^                  │
//!        │                     │ loss │ retry due        │ loss
//!        │ disconnect          v      │                  │
//!        │                  ┌─────────┐                  │
//!        └──────────────────│ Backoff │<─────────────────┘
//!                           └─────────┘
//! ```
//!
//! Only an explicit [`EventChannel::disconnect`] reaches `Disconnected`.
//! Every other loss schedules a reconnect, forever.

use std::{collections::BTreeMap, time::Duration};

use pairline_proto::{
    AckPayload, EnginePacket, Inbound, OpenHandshake, Outbound, ProtocolError, SocketPacket,
};
use tracing::{debug, info, warn};

use crate::{
    config::{ChannelConfig, Credentials},
    dispatch::{Dispatcher, SubscriptionId},
    env::Timestamp,
    error::{AckError, ChannelError},
};

/// Identifier of an outstanding acknowledged request.
pub type AckId = u64;

/// Connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState<I> {
    /// Never connected, or explicitly disconnected.
    Disconnected,
    /// Transport opening or handshake in progress.
    Connecting {
        /// Consecutive failed attempts before this one.
        attempt: u32,
    },
    /// Namespace joined.
    Connected {
        /// Socket id assigned by the server.
        sid: String,
    },
    /// Waiting to retry after a loss.
    Backoff {
        /// Consecutive failed attempts so far.
        attempt: u32,
        /// When the next attempt starts.
        retry_at: I,
    },
}

/// Actions returned by the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelAction {
    /// Open a WebSocket to this URL.
    OpenTransport {
        /// Engine.IO URL.
        url: String,
    },
    /// Send this text frame.
    Transmit(String),
    /// Close the WebSocket.
    CloseTransport,
    /// Namespace joined (initial connect or reconnect).
    Connected {
        /// Socket id.
        sid: String,
    },
    /// Connection lost or closed.
    Disconnected {
        /// Delay before the automatic retry. `None` after an explicit
        /// disconnect.
        reconnect_in: Option<Duration>,
    },
    /// Decoded server event.
    Inbound(Inbound),
    /// Outcome of an acknowledged request.
    AckResolved {
        /// Id returned by `send_with_ack`.
        ack_id: AckId,
        /// Ack arguments, or why none arrived.
        outcome: Result<AckPayload, AckError>,
    },
}

/// Socket.IO channel state machine.
///
/// Pure: no I/O and no stored environment. Generic over the instant type so
/// simulations can drive it with virtual time.
#[derive(Debug)]
pub struct EventChannel<I: Timestamp> {
    state: ChannelState<I>,
    config: ChannelConfig,
    credentials: Option<Credentials>,
    handshake: Option<OpenHandshake>,
    last_activity: I,
    next_ack_id: AckId,
    pending: BTreeMap<AckId, I>,
    dispatcher: Dispatcher,
    dropped_events: u64,
}

impl<I: Timestamp> EventChannel<I> {
    /// Channel in `Disconnected`.
    pub fn new(config: ChannelConfig, now: I) -> Self {
        Self {
            state: ChannelState::Disconnected,
            config,
            credentials: None,
            handshake: None,
            last_activity: now,
            next_ack_id: 0,
            pending: BTreeMap::new(),
            dispatcher: Dispatcher::new(),
            dropped_events: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> &ChannelState<I> {
        &self.state
    }

    /// Whether the namespace is joined.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, ChannelState::Connected { .. })
    }

    /// Configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Credentials from the last `connect`.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Inbound events dropped because they failed to decode.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    /// Number of requests awaiting an ack.
    pub fn pending_acks(&self) -> usize {
        self.pending.len()
    }

    /// Subscribe to one inbound event.
    pub fn subscribe(
        &mut self,
        name: pairline_proto::EventName,
        handler: impl FnMut(&Inbound) + Send + 'static,
    ) -> SubscriptionId {
        self.dispatcher.subscribe(name, handler)
    }

    /// Subscribe to every inbound event.
    pub fn subscribe_all(&mut self, handler: impl FnMut(&Inbound) + Send + 'static) -> SubscriptionId {
        self.dispatcher.subscribe_all(handler)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    /// Number of live subscriptions.
    pub fn subscriptions(&self) -> usize {
        self.dispatcher.len()
    }

    /// Start connecting. No-op unless `Disconnected`.
    ///
    /// # Errors
    ///
    /// - `ChannelError::InvalidEndpoint` if the configured endpoint is bad
    pub fn connect(
        &mut self,
        credentials: Credentials,
        now: I,
    ) -> Result<Vec<ChannelAction>, ChannelError> {
        if !matches!(self.state, ChannelState::Disconnected) {
            debug!(state = ?self.state, "connect ignored");
            return Ok(Vec::new());
        }

        let url = self.config.endpoint.url()?;
        self.credentials = Some(credentials);
        Ok(self.open(0, url.to_string(), now))
    }

    fn open(&mut self, attempt: u32, url: String, now: I) -> Vec<ChannelAction> {
        info!(attempt, %url, "opening signaling transport");
        self.state = ChannelState::Connecting { attempt };
        self.handshake = None;
        self.last_activity = now;
        vec![ChannelAction::OpenTransport { url }]
    }

    /// Explicitly disconnect. Cancels reconnects, resolves every pending ack
    /// as `TimedOut` and drops all subscriptions.
    pub fn disconnect(&mut self, _now: I) -> Vec<ChannelAction> {
        let mut actions = Vec::new();

        match self.state {
            ChannelState::Disconnected => return actions,
            ChannelState::Connected { .. } => {
                if let Ok(text) = EnginePacket::Message(SocketPacket::Disconnect).encode() {
                    actions.push(ChannelAction::Transmit(text));
                }
                actions.push(ChannelAction::CloseTransport);
            },
            ChannelState::Connecting { .. } => actions.push(ChannelAction::CloseTransport),
            ChannelState::Backoff { .. } => {},
        }

        info!("signaling channel disconnected");
        self.state = ChannelState::Disconnected;
        self.handshake = None;
        self.dispatcher.clear();
        actions.extend(self.fail_pending(AckError::TimedOut));
        actions.push(ChannelAction::Disconnected { reconnect_in: None });
        actions
    }

    /// Send an event without ack.
    ///
    /// # Errors
    ///
    /// - `ChannelError::NotConnected` unless `Connected`
    /// - `ChannelError::Protocol` if the payload cannot be encoded
    pub fn send(&mut self, event: Outbound) -> Result<Vec<ChannelAction>, ChannelError> {
        self.ensure_connected()?;
        debug!(event = %event.name(), "send");
        let text = EnginePacket::Message(event.into_packet(None)?).encode()?;
        Ok(vec![ChannelAction::Transmit(text)])
    }

    /// Send an event and expect an ack within the configured timeout.
    ///
    /// # Errors
    ///
    /// - `ChannelError::NotConnected` unless `Connected`
    /// - `ChannelError::Protocol` if the payload cannot be encoded
    pub fn send_with_ack(
        &mut self,
        event: Outbound,
        now: I,
    ) -> Result<(AckId, Vec<ChannelAction>), ChannelError> {
        let timeout = self.config.ack_timeout;
        self.send_with_ack_timeout(event, timeout, now)
    }

    /// Send an event and expect an ack within `timeout`.
    ///
    /// # Errors
    ///
    /// - `ChannelError::NotConnected` unless `Connected`
    /// - `ChannelError::Protocol` if the payload cannot be encoded
    pub fn send_with_ack_timeout(
        &mut self,
        event: Outbound,
        timeout: Duration,
        now: I,
    ) -> Result<(AckId, Vec<ChannelAction>), ChannelError> {
        self.ensure_connected()?;

        let ack_id = self.next_ack_id;
        let name = event.name();
        let text = EnginePacket::Message(event.into_packet(Some(ack_id))?).encode()?;

        self.next_ack_id += 1;
        self.pending.insert(ack_id, now + timeout);
        debug!(event = %name, ack_id, "send with ack");
        Ok((ack_id, vec![ChannelAction::Transmit(text)]))
    }

    fn ensure_connected(&self) -> Result<(), ChannelError> {
        if self.is_connected() { Ok(()) } else { Err(ChannelError::NotConnected) }
    }

    /// Transport opened. The server speaks first with the Engine.IO open
    /// packet, so nothing is sent yet.
    pub fn handle_transport_opened(&mut self, now: I) -> Vec<ChannelAction> {
        self.last_activity = now;
        Vec::new()
    }

    /// Transport closed or failed. Schedules a reconnect unless the channel
    /// was explicitly disconnected.
    pub fn handle_transport_closed(&mut self, reason: &str, now: I) -> Vec<ChannelAction> {
        if matches!(self.state, ChannelState::Disconnected | ChannelState::Backoff { .. }) {
            return Vec::new();
        }
        self.lose(reason, false, now)
    }

    /// Process one received text frame.
    ///
    /// Malformed frames and undecodable events are dropped with a warning
    /// and counted in [`Self::dropped_events`]; they never change state.
    pub fn handle_text(&mut self, text: &str, now: I) -> Vec<ChannelAction> {
        if matches!(self.state, ChannelState::Disconnected | ChannelState::Backoff { .. }) {
            debug!("frame on inactive transport ignored");
            return Vec::new();
        }

        self.last_activity = now;

        let packet = match EnginePacket::decode(text) {
            Ok(packet) => packet,
            Err(err) => {
                self.drop_frame(None, &err);
                return Vec::new();
            },
        };

        match packet {
            EnginePacket::Open(handshake) => {
                debug!(sid = %handshake.sid, ping_interval = handshake.ping_interval, "engine open");
                self.handshake = Some(handshake);
                self.transmit(&EnginePacket::Message(SocketPacket::Connect { data: None }))
            },
            EnginePacket::Ping => self.transmit(&EnginePacket::Pong),
            EnginePacket::Close => self.lose("server closed transport", true, now),
            EnginePacket::Pong | EnginePacket::Upgrade | EnginePacket::Noop => Vec::new(),
            EnginePacket::Message(packet) => self.handle_socket_packet(packet, now),
        }
    }

    fn handle_socket_packet(&mut self, packet: SocketPacket, now: I) -> Vec<ChannelAction> {
        match packet {
            SocketPacket::Connect { data } => {
                let sid = data
                    .as_ref()
                    .and_then(|d| d.get("sid"))
                    .and_then(|s| s.as_str())
                    .map(str::to_string)
                    .or_else(|| self.handshake.as_ref().map(|h| h.sid.clone()))
                    .unwrap_or_default();

                info!(%sid, "signaling channel connected");
                self.state = ChannelState::Connected { sid: sid.clone() };
                vec![ChannelAction::Connected { sid }]
            },
            SocketPacket::Disconnect => self.lose("server disconnected namespace", true, now),
            SocketPacket::ConnectError { message } => {
                warn!(%message, "namespace connect refused");
                self.lose(&message, true, now)
            },
            SocketPacket::Event { name, args, .. } => match Inbound::decode(&name, &args) {
                Ok(event) => {
                    debug!(event = %event.name(), "inbound");
                    self.dispatcher.dispatch(&event);
                    vec![ChannelAction::Inbound(event)]
                },
                Err(err) => {
                    self.drop_frame(Some(&name), &err);
                    Vec::new()
                },
            },
            SocketPacket::Ack { ack_id, args } => {
                if self.pending.remove(&ack_id).is_none() {
                    debug!(ack_id, "late or unknown ack ignored");
                    return Vec::new();
                }

                let payload = AckPayload::new(args);
                let outcome = if payload.is_no_ack() { Err(AckError::TimedOut) } else { Ok(payload) };
                vec![ChannelAction::AckResolved { ack_id, outcome }]
            },
        }
    }

    /// Periodic maintenance: ack deadlines, keepalive and reconnect.
    pub fn tick(&mut self, now: I) -> Vec<ChannelAction> {
        let mut actions = self.expire_acks(now);

        match self.state.clone() {
            ChannelState::Backoff { attempt, retry_at } if now >= retry_at => {
                match self.config.endpoint.url() {
                    Ok(url) => actions.extend(self.open(attempt, url.to_string(), now)),
                    Err(err) => warn!(%err, "reconnect skipped"),
                }
            },
            ChannelState::Connecting { .. } => {
                let limit = self.handshake.as_ref().map_or(self.config.connect_timeout, |h| {
                    h.liveness_window().min(self.config.connect_timeout)
                });
                if now - self.last_activity > limit {
                    actions.extend(self.lose("handshake timeout", true, now));
                }
            },
            ChannelState::Connected { .. } => {
                if let Some(window) = self.handshake.as_ref().map(OpenHandshake::liveness_window)
                    && now - self.last_activity > window
                {
                    actions.extend(self.lose("ping timeout", true, now));
                }
            },
            _ => {},
        }

        actions
    }

    /// Earliest instant at which `tick` has work to do.
    pub fn next_deadline(&self) -> Option<I> {
        let ack = self.pending.values().min().copied();
        let state = match &self.state {
            ChannelState::Backoff { retry_at, .. } => Some(*retry_at),
            ChannelState::Connecting { .. } => Some(self.last_activity + self.config.connect_timeout),
            ChannelState::Connected { .. } => {
                self.handshake.as_ref().map(|h| self.last_activity + h.liveness_window())
            },
            ChannelState::Disconnected => None,
        };
        match (ack, state) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn expire_acks(&mut self, now: I) -> Vec<ChannelAction> {
        let expired: Vec<AckId> =
            self.pending.iter().filter(|(_, deadline)| now >= **deadline).map(|(id, _)| *id).collect();

        expired
            .into_iter()
            .map(|ack_id| {
                self.pending.remove(&ack_id);
                warn!(ack_id, "ack timed out");
                ChannelAction::AckResolved { ack_id, outcome: Err(AckError::TimedOut) }
            })
            .collect()
    }

    fn fail_pending(&mut self, error: AckError) -> Vec<ChannelAction> {
        std::mem::take(&mut self.pending)
            .into_keys()
            .map(|ack_id| ChannelAction::AckResolved { ack_id, outcome: Err(error) })
            .collect()
    }

    fn lose(&mut self, reason: &str, close_transport: bool, now: I) -> Vec<ChannelAction> {
        let attempt = match self.state {
            ChannelState::Connecting { attempt } => attempt + 1,
            _ => 1,
        };
        let delay = self.config.backoff(attempt);

        warn!(reason, attempt, ?delay, "signaling transport lost");
        self.state = ChannelState::Backoff { attempt, retry_at: now + delay };
        self.handshake = None;

        let mut actions = Vec::new();
        if close_transport {
            actions.push(ChannelAction::CloseTransport);
        }
        actions.push(ChannelAction::Disconnected { reconnect_in: Some(delay) });
        actions
    }

    fn transmit(&self, packet: &EnginePacket) -> Vec<ChannelAction> {
        match packet.encode() {
            Ok(text) => vec![ChannelAction::Transmit(text)],
            Err(err) => {
                warn!(%err, "failed to encode control packet");
                Vec::new()
            },
        }
    }

    fn drop_frame(&mut self, event: Option<&str>, err: &ProtocolError) {
        self.dropped_events += 1;
        warn!(event = event.unwrap_or("-"), %err, dropped = self.dropped_events, "dropping inbound frame");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Instant;

    use pairline_proto::{EventName, UserTarget};

    use super::*;

    const OPEN: &str =
        r#"0{"sid":"e1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

    fn connected(now: Instant) -> EventChannel<Instant> {
        let mut channel = EventChannel::new(ChannelConfig::default(), now);
        channel.connect(Credentials::new("u1", "t"), now).unwrap();
        channel.handle_transport_opened(now);
        channel.handle_text(OPEN, now);
        channel.handle_text(r#"40{"sid":"s1"}"#, now);
        channel
    }

    #[test]
    fn handshake_sends_namespace_connect() {
        let now = Instant::now();
        let mut channel = EventChannel::new(ChannelConfig::default(), now);

        let actions = channel.connect(Credentials::new("u1", "t"), now).unwrap();
        assert!(matches!(&actions[..], [ChannelAction::OpenTransport { url }] if url.contains("EIO=4")));

        assert_eq!(channel.handle_text(OPEN, now), vec![ChannelAction::Transmit("40".into())]);
        assert_eq!(channel.handle_text(r#"40{"sid":"s1"}"#, now), vec![ChannelAction::Connected {
            sid: "s1".into()
        }]);
        assert!(channel.is_connected());
    }

    #[test]
    fn connect_is_noop_when_active() {
        let now = Instant::now();
        let mut channel = connected(now);
        assert!(channel.connect(Credentials::new("u1", "t"), now).unwrap().is_empty());
    }

    #[test]
    fn ping_is_answered() {
        let now = Instant::now();
        let mut channel = connected(now);
        assert_eq!(channel.handle_text("2", now), vec![ChannelAction::Transmit("3".into())]);
    }

    #[test]
    fn send_requires_connection() {
        let now = Instant::now();
        let mut channel = EventChannel::new(ChannelConfig::default(), now);
        assert_eq!(channel.send(Outbound::End), Err(ChannelError::NotConnected));
        assert_eq!(channel.send_with_ack(Outbound::SkipCall, now), Err(ChannelError::NotConnected));
    }

    #[test]
    fn ack_ids_increase_and_resolve() {
        let now = Instant::now();
        let mut channel = connected(now);

        let (first, actions) = channel.send_with_ack(Outbound::SkipCall, now).unwrap();
        assert_eq!(actions, vec![ChannelAction::Transmit(format!("42{first}[\"skipCall\"]"))]);
        let (second, _) = channel
            .send_with_ack(Outbound::ConnectUserRequest(UserTarget { to: "p1".into() }), now)
            .unwrap();
        assert!(second > first);

        let actions = channel.handle_text(&format!("43{second}[{{\"completionStatus\":true}}]"), now);
        assert!(matches!(
            &actions[..],
            [ChannelAction::AckResolved { ack_id, outcome: Ok(_) }] if *ack_id == second
        ));
        assert_eq!(channel.pending_acks(), 1);
    }

    #[test]
    fn ack_times_out_on_tick() {
        let now = Instant::now();
        let mut channel = connected(now);
        let (id, _) = channel.send_with_ack(Outbound::SkipCall, now).unwrap();

        assert!(channel.tick(now + Duration::from_secs(4)).is_empty());
        let actions = channel.tick(now + Duration::from_secs(5));
        assert_eq!(actions, vec![ChannelAction::AckResolved {
            ack_id: id,
            outcome: Err(AckError::TimedOut)
        }]);

        // A late ack after the timeout is ignored.
        assert!(channel.handle_text(&format!("43{id}[{{}}]"), now + Duration::from_secs(6)).is_empty());
    }

    #[test]
    fn loss_schedules_capped_backoff() {
        let now = Instant::now();
        let mut channel = connected(now);

        let actions = channel.handle_transport_closed("reset", now);
        assert_eq!(actions, vec![ChannelAction::Disconnected {
            reconnect_in: Some(Duration::from_secs(1))
        }]);

        let mut at = now;
        let mut delays = Vec::new();
        for _ in 0..4 {
            let ChannelState::Backoff { retry_at, .. } = channel.state() else {
                panic!("not in backoff")
            };
            let retry_at = *retry_at;
            delays.push((retry_at - at).as_secs());
            at = retry_at;
            let reopen = channel.tick(at);
            assert!(matches!(&reopen[..], [ChannelAction::OpenTransport { .. }]));
            channel.handle_transport_closed("refused", at);
        }
        assert_eq!(delays, vec![1, 2, 4, 5]);
    }

    #[test]
    fn successful_reconnect_resets_backoff() {
        let now = Instant::now();
        let mut channel = connected(now);
        channel.handle_transport_closed("reset", now);
        let at = now + Duration::from_secs(1);
        channel.tick(at);
        channel.handle_text(OPEN, at);
        let actions = channel.handle_text("40", at);
        assert_eq!(actions, vec![ChannelAction::Connected { sid: "e1".into() }]);

        let actions = channel.handle_transport_closed("reset", at);
        assert_eq!(actions, vec![ChannelAction::Disconnected {
            reconnect_in: Some(Duration::from_secs(1))
        }]);
    }

    #[test]
    fn silent_server_is_treated_as_loss() {
        let now = Instant::now();
        let mut channel = connected(now);

        assert!(channel.tick(now + Duration::from_secs(45)).is_empty());
        let actions = channel.tick(now + Duration::from_secs(46));
        assert_eq!(actions[0], ChannelAction::CloseTransport);
        assert!(matches!(channel.state(), ChannelState::Backoff { .. }));
    }

    #[test]
    fn explicit_disconnect_resolves_acks_and_clears_subscribers() {
        let now = Instant::now();
        let mut channel = connected(now);
        channel.subscribe(EventName::End, |_| {});
        let (id, _) = channel.send_with_ack(Outbound::SkipCall, now).unwrap();

        let actions = channel.disconnect(now);
        assert_eq!(actions, vec![
            ChannelAction::Transmit("41".into()),
            ChannelAction::CloseTransport,
            ChannelAction::AckResolved { ack_id: id, outcome: Err(AckError::TimedOut) },
            ChannelAction::Disconnected { reconnect_in: None },
        ]);
        assert_eq!(channel.subscriptions(), 0);
        assert!(channel.tick(now + Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn malformed_events_are_dropped_and_counted() {
        let now = Instant::now();
        let mut channel = connected(now);

        assert!(channel.handle_text("42[\"partnerLeft\",{}]", now).is_empty());
        assert!(channel.handle_text("42[\"mystery\"]", now).is_empty());
        assert!(channel.handle_text("4x", now).is_empty());
        assert_eq!(channel.dropped_events(), 3);
        assert!(channel.is_connected());
    }

    #[test]
    fn inbound_events_reach_subscribers_and_actions() {
        let now = Instant::now();
        let mut channel = connected(now);
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = std::sync::Arc::clone(&seen);
        channel.subscribe_all(move |event| sink.lock().unwrap().push(event.name()));

        let actions = channel.handle_text("42[\"timerEnded\"]", now);
        assert_eq!(actions, vec![ChannelAction::Inbound(Inbound::TimerEnded)]);
        assert_eq!(*seen.lock().unwrap(), vec![EventName::TimerEnded]);
    }
}
