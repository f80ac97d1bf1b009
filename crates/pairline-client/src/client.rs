//! Top-level client state machine.
//!
//! Owns the signaling channel, the match coordinator and the media bridge.
//! Every mutation goes through [`Client::handle`], which is the single
//! control context: transport frames, media callbacks and user actions are
//! all marshaled into [`ClientEvent`]s by the caller.

use std::collections::{HashMap, VecDeque};

use pairline_core::{
    AckError, AckId, ChannelAction, Credentials, Environment, EventChannel, SessionState,
};
use tracing::{debug, warn};

use crate::{
    config::ClientConfig,
    coordinator::{Effect, MatchCoordinator},
    error::ClientError,
    event::{CallKind, ClientAction, ClientEvent, Request, Tab},
    media::MediaBridge,
};

/// Reconcile passes allowed per handled event before the rest is dropped.
const MAX_REACTION_ROUNDS: usize = 8;

/// Matching client.
///
/// Sans-IO: consumes [`ClientEvent`]s and returns [`ClientAction`]s for the
/// caller to execute.
pub struct Client<E: Environment> {
    /// Environment for timing.
    env: E,
    config: ClientConfig,
    channel: EventChannel<E::Instant>,
    coordinator: MatchCoordinator,
    bridge: MediaBridge,
    /// Outstanding acknowledged requests by ack id.
    requests: HashMap<AckId, Request>,
}

impl<E: Environment> std::fmt::Debug for Client<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.coordinator.state())
            .field("channel", self.channel.state())
            .field("media", &self.bridge.media())
            .field("pending_requests", &self.requests.len())
            .finish_non_exhaustive()
    }
}

impl<E: Environment> Client<E> {
    /// Create a client. Nothing happens until [`ClientEvent::Start`].
    pub fn new(env: E, config: ClientConfig, credentials: Credentials) -> Self {
        let channel = EventChannel::new(config.channel.clone(), env.now());
        let bridge = MediaBridge::new(&config);
        Self {
            env,
            config,
            channel,
            coordinator: MatchCoordinator::new(credentials),
            bridge,
            requests: HashMap::new(),
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.coordinator.state()
    }

    /// Match coordinator (read-only).
    pub fn coordinator(&self) -> &MatchCoordinator {
        &self.coordinator
    }

    /// Media bridge (read-only).
    pub fn bridge(&self) -> &MediaBridge {
        &self.bridge
    }

    /// Signaling channel.
    pub fn channel(&self) -> &EventChannel<E::Instant> {
        &self.channel
    }

    /// Mutable signaling channel, for registering extra subscribers.
    pub fn channel_mut(&mut self) -> &mut EventChannel<E::Instant> {
        &mut self.channel
    }

    /// Configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Requests awaiting an ack.
    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    /// Earliest instant at which a `Tick` has work to do.
    pub fn next_deadline(&self) -> Option<E::Instant> {
        self.channel.next_deadline()
    }

    /// Process an event and return resulting actions.
    ///
    /// # Errors
    ///
    /// Only for caller mistakes: missing credentials, an unsupported kind or
    /// a bad endpoint. Server and media failures become notifications.
    pub fn handle(
        &mut self,
        event: ClientEvent<E::Instant>,
    ) -> Result<Vec<ClientAction>, ClientError> {
        let now = self.env.now();
        let mut out = Vec::new();
        let mut actions = Vec::new();
        let mut disconnect_after = false;

        match event {
            ClientEvent::Start => {
                let credentials =
                    self.coordinator.credentials().cloned().ok_or(ClientError::MissingCredentials)?;
                let produced = self.channel.connect(credentials, now)?;
                self.absorb(produced, &mut out, &mut actions);
            },
            ClientEvent::TransportOpened => {
                let produced = self.channel.handle_transport_opened(now);
                self.absorb(produced, &mut out, &mut actions);
            },
            ClientEvent::TransportText(text) => {
                let produced = self.channel.handle_text(&text, now);
                self.absorb(produced, &mut out, &mut actions);
            },
            ClientEvent::TransportClosed { reason } => {
                let produced = self.channel.handle_transport_closed(&reason, now);
                self.absorb(produced, &mut out, &mut actions);
            },
            ClientEvent::Tick { now } => {
                let produced = self.channel.tick(now);
                self.absorb(produced, &mut out, &mut actions);
            },
            ClientEvent::StartMatching => self.coordinator.start_matching(&mut out)?,
            ClientEvent::Skip => self.coordinator.skip(&mut out),
            ClientEvent::EndCall { target, notify } => {
                self.coordinator.end_call(target, notify, &mut out);
            },
            ClientEvent::ExtendTimer { seconds } => self.coordinator.extend_timer(seconds, &mut out),
            ClientEvent::ChangeKind(kind) => self.coordinator.change_kind(kind, &mut out),
            ClientEvent::ConnectUser { user_id } => self.coordinator.connect_user(user_id, &mut out),
            ClientEvent::CancelConnectUser { user_id } => {
                self.coordinator.cancel_connect_user(user_id, &mut out);
            },
            ClientEvent::RemoveUser { user_id } => self.coordinator.remove_user(user_id, &mut out),
            ClientEvent::ChangeOnlineStatus { online, busy } => {
                self.coordinator.change_online(online, busy, &mut out)?;
            },
            ClientEvent::MediaStateChanged(state) => {
                self.bridge.on_media_state(state, &mut self.coordinator, &mut out);
            },
            ClientEvent::MediaConnectFailed { reason } => self.bridge.on_connect_failed(&reason, &mut out),
            ClientEvent::CameraFailed { reason } => self.bridge.on_camera_failed(&reason, &mut out),
            ClientEvent::RetryMedia => self.bridge.retry(&mut self.coordinator, &mut out),
            ClientEvent::TabChanged(tab) => self.bridge.on_tab(tab, &mut self.coordinator, &mut out)?,
            ClientEvent::CallRequested => {
                if self.coordinator.credentials().is_none() {
                    return Err(ClientError::MissingCredentials);
                }
                self.coordinator.change_kind(CallKind::Global, &mut out);
                self.bridge.on_tab(Tab::Matching, &mut self.coordinator, &mut out)?;
                self.coordinator.start_matching(&mut out)?;
            },
            ClientEvent::AuthLost => {
                self.coordinator.force_idle(&mut out);
                out.push(Effect::Action(ClientAction::DisconnectMedia));
                disconnect_after = true;
            },
            ClientEvent::Shutdown => {
                self.coordinator.end_call(SessionState::Idle, true, &mut out);
                disconnect_after = true;
            },
        }

        self.run(out, &mut actions);

        if disconnect_after {
            let mut out = Vec::new();
            let produced = self.channel.disconnect(now);
            self.absorb(produced, &mut out, &mut actions);
            self.run(out, &mut actions);
        }

        Ok(actions)
    }

    /// Execute effects in order, then let the bridge react until quiet.
    fn run(&mut self, initial: Vec<Effect>, actions: &mut Vec<ClientAction>) {
        let now = self.env.now();
        let mut queue: VecDeque<Effect> = initial.into();
        let mut rounds = 0;

        loop {
            while let Some(effect) = queue.pop_front() {
                let mut out = Vec::new();
                match effect {
                    Effect::Transition(transition) => {
                        actions.push(ClientAction::StateChanged {
                            from: transition.from,
                            to: transition.to,
                        });
                        self.bridge.on_transition(transition, &mut self.coordinator, &mut out);
                    },
                    Effect::Action(action) => actions.push(action),
                    Effect::Emit(event) => {
                        let name = event.name();
                        match self.channel.send(event) {
                            Ok(produced) => self.absorb(produced, &mut out, actions),
                            Err(err) => warn!(event = %name, %err, "outbound event dropped"),
                        }
                    },
                    Effect::Request(event, request) => {
                        let name = event.name();
                        match self.channel.send_with_ack(event, now) {
                            Ok((ack_id, produced)) => {
                                self.requests.insert(ack_id, request);
                                self.absorb(produced, &mut out, actions);
                            },
                            Err(err) => {
                                warn!(event = %name, %err, "request not sent");
                                self.coordinator.on_ack(request, Err(AckError::NotConnected), &mut out);
                            },
                        }
                    },
                }
                queue.extend(out);
            }

            let mut out = Vec::new();
            self.bridge.reconcile(&mut self.coordinator, &mut out);
            if out.is_empty() {
                break;
            }

            rounds += 1;
            if rounds > MAX_REACTION_ROUNDS {
                warn!(rounds, "reaction limit reached");
                break;
            }
            queue.extend(out);
        }
    }

    /// Translate channel output into client actions and coordinator effects.
    fn absorb(
        &mut self,
        produced: Vec<ChannelAction>,
        out: &mut Vec<Effect>,
        actions: &mut Vec<ClientAction>,
    ) {
        for action in produced {
            match action {
                ChannelAction::OpenTransport { url } => actions.push(ClientAction::OpenTransport { url }),
                ChannelAction::Transmit(text) => actions.push(ClientAction::Transmit(text)),
                ChannelAction::CloseTransport => actions.push(ClientAction::CloseTransport),
                ChannelAction::Connected { sid } => {
                    debug!(%sid, "channel up");
                    actions.push(ClientAction::ChannelStatus { connected: true });
                    self.coordinator.announce(out);
                },
                ChannelAction::Disconnected { reconnect_in } => {
                    debug!(?reconnect_in, "channel down");
                    actions.push(ClientAction::ChannelStatus { connected: false });
                },
                ChannelAction::Inbound(event) => self.coordinator.on_inbound(event, out),
                ChannelAction::AckResolved { ack_id, outcome } => match self.requests.remove(&ack_id) {
                    Some(request) => self.coordinator.on_ack(request, outcome, out),
                    None => debug!(ack_id, "ack for unknown request"),
                },
            }
        }
    }
}
