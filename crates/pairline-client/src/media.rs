//! Media bridge.
//!
//! Signaling and the media session evolve independently. The bridge watches
//! three inputs (the peer set, the observed media state and the session
//! state) and keeps them consistent:
//!
//! - a delivered match with media down opens the media session
//! - media up with peers present marks the call connected
//! - media up without peers is a failure
//! - media down while tearing down settles in `Idle` or re-queues
//!
//! It also carries the entry and exit actions of session transitions.

use std::collections::BTreeSet;

use pairline_core::{SessionState, Transition, Trigger};
use tracing::{debug, info, warn};

use crate::{
    config::ClientConfig,
    coordinator::{Effect, MatchCoordinator},
    error::ClientError,
    event::{ClientAction, MediaState, Notification, NotificationLevel, Tab},
};

/// Keeps the media session in step with the session state.
#[derive(Debug, Clone)]
pub struct MediaBridge {
    media: MediaState,
    connect_failed: bool,
    tab: Tab,
    last_peers: BTreeSet<String>,
    media_url: String,
    enable_microphone: bool,
    meet_time_secs: u64,
    waiting_sound: bool,
}

impl MediaBridge {
    /// Bridge with media disconnected, on the matching tab.
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            media: MediaState::Disconnected,
            connect_failed: false,
            tab: Tab::default(),
            last_peers: BTreeSet::new(),
            media_url: config.media_url.clone(),
            enable_microphone: config.enable_microphone,
            meet_time_secs: config.meet_time_secs,
            waiting_sound: config.waiting_sound,
        }
    }

    /// Last observed media state.
    pub fn media(&self) -> MediaState {
        self.media
    }

    /// Current UI tab.
    pub fn tab(&self) -> Tab {
        self.tab
    }

    /// The last media connect failed and awaits a retry.
    pub fn connect_failed(&self) -> bool {
        self.connect_failed
    }

    pub(crate) fn on_media_state(
        &mut self,
        state: MediaState,
        coordinator: &mut MatchCoordinator,
        out: &mut Vec<Effect>,
    ) {
        let previous = std::mem::replace(&mut self.media, state);
        if previous == state {
            return;
        }

        debug!(?previous, ?state, session = %coordinator.state(), "media state changed");
        match state {
            MediaState::Connected => self.on_media_connected(coordinator, out),
            MediaState::Disconnected => self.on_media_disconnected(coordinator, out),
            MediaState::Connecting | MediaState::Reconnecting | MediaState::Disconnecting => {},
        }
    }

    fn on_media_connected(&mut self, coordinator: &mut MatchCoordinator, out: &mut Vec<Effect>) {
        self.connect_failed = false;
        let state = coordinator.state();

        if !coordinator.should_call() || !matches!(state, SessionState::Connecting | SessionState::Connected) {
            info!(%state, should_call = coordinator.should_call(), "closing unwanted media session");
            out.push(Effect::Action(ClientAction::DisconnectMedia));
            return;
        }

        if coordinator.data().peers.is_empty() {
            warn!(%state, "media connected without peers");
            out.push(Effect::Action(ClientAction::Notify(Notification::new(
                NotificationLevel::Error,
                "Failed to receive partner info",
            ))));
            out.push(Effect::Action(ClientAction::DisconnectMedia));
            coordinator.media_lost(out);
            return;
        }

        if state == SessionState::Connecting {
            coordinator.transition(SessionState::Connected, Trigger::MediaConnected, out);
            out.push(Effect::Action(ClientAction::EnableCamera));
            coordinator.joined_video(self.meet_time_secs, out);
        }
    }

    fn on_media_disconnected(&mut self, coordinator: &mut MatchCoordinator, out: &mut Vec<Effect>) {
        match coordinator.state() {
            SessionState::Connected => {
                warn!("media dropped during call");
                coordinator.media_lost(out);
            },
            SessionState::Connecting if !self.connect_failed => {
                warn!("media dropped while connecting");
                coordinator.media_lost(out);
            },
            _ => {},
        }
        self.settle(coordinator, out);
    }

    /// Media is down while tearing down: finish in `Idle`, or re-queue when
    /// the user still wants a call and is on the matching tab.
    fn settle(&mut self, coordinator: &mut MatchCoordinator, out: &mut Vec<Effect>) {
        if coordinator.state() != SessionState::Disconnecting || self.media != MediaState::Disconnected {
            return;
        }

        if coordinator.should_call() && self.tab == Tab::Matching {
            coordinator.transition(SessionState::Searching, Trigger::Requeue, out);
        } else {
            coordinator.set_should_call(false, true, out);
            coordinator.transition(SessionState::Idle, Trigger::MediaDisconnected, out);
        }
    }

    /// Open the media session for the current match.
    fn connect(&mut self, coordinator: &mut MatchCoordinator, out: &mut Vec<Effect>) {
        if coordinator.state() == SessionState::Searching {
            coordinator.transition(SessionState::Connecting, Trigger::MatchDelivered, out);
        }

        let data = coordinator.data();
        if data.room_id.is_empty() || data.media_token.is_empty() {
            warn!(room_id = %data.room_id, "match without room or media token");
            out.push(Effect::Action(ClientAction::Notify(
                Notification::new(NotificationLevel::Error, "Could not join the call")
                    .with_message("Missing room or access token"),
            )));
            coordinator.invalid_match(out);
            return;
        }

        info!(room_id = %data.room_id, peers = data.peers.len(), "connecting media");
        out.push(Effect::Action(ClientAction::ConnectMedia {
            url: self.media_url.clone(),
            token: data.media_token.clone(),
            enable_microphone: self.enable_microphone,
        }));
        self.media = MediaState::Connecting;
    }

    pub(crate) fn on_connect_failed(&mut self, reason: &str, out: &mut Vec<Effect>) {
        if self.media != MediaState::Connecting {
            debug!(reason, media = ?self.media, "stale connect failure ignored");
            return;
        }

        warn!(reason, "media connect failed");
        self.media = MediaState::Disconnected;
        self.connect_failed = true;
        out.push(Effect::Action(ClientAction::Notify(
            Notification::new(NotificationLevel::Warning, "Unfortunately that didn't work")
                .with_message(reason)
                .retryable(),
        )));
    }

    pub(crate) fn on_camera_failed(&mut self, reason: &str, out: &mut Vec<Effect>) {
        warn!(reason, "camera unavailable");
        out.push(Effect::Action(ClientAction::Notify(
            Notification::new(NotificationLevel::Error, "Camera unavailable").with_message(reason),
        )));
    }

    /// Retry a failed media connect for the same match.
    pub(crate) fn retry(&mut self, coordinator: &mut MatchCoordinator, out: &mut Vec<Effect>) {
        if !self.connect_failed {
            debug!("retry ignored");
            return;
        }

        self.connect_failed = false;
        if coordinator.state() == SessionState::Connecting
            && coordinator.data().has_match()
            && self.media == MediaState::Disconnected
        {
            self.connect(coordinator, out);
        }
    }

    pub(crate) fn on_tab(
        &mut self,
        tab: Tab,
        coordinator: &mut MatchCoordinator,
        out: &mut Vec<Effect>,
    ) -> Result<(), ClientError> {
        let previous = std::mem::replace(&mut self.tab, tab);
        if previous == tab {
            return Ok(());
        }

        debug!(?previous, ?tab, "tab changed");
        match (tab, coordinator.state()) {
            (Tab::Other, SessionState::Searching) => {
                coordinator.end_call(SessionState::Idle, true, out);
            },
            (Tab::Matching, SessionState::Idle) => coordinator.start_matching(out)?,
            _ => {},
        }
        Ok(())
    }

    /// Entry and exit actions of a session transition.
    pub(crate) fn on_transition(
        &mut self,
        transition: Transition,
        coordinator: &mut MatchCoordinator,
        out: &mut Vec<Effect>,
    ) {
        if matches!(transition.to, SessionState::Idle | SessionState::Searching) {
            self.connect_failed = false;
        }

        match (transition.from, transition.to) {
            (from, SessionState::Searching) => {
                if self.waiting_sound {
                    out.push(Effect::Action(ClientAction::PlayWaitingAudio));
                }
                // A match that arrived during teardown is already in hand.
                if from != SessionState::Idle && !coordinator.data().has_match() {
                    coordinator.restart_matching(out);
                }
            },
            (SessionState::Searching, SessionState::Idle) => {
                out.push(Effect::Action(ClientAction::StopAudio));
                coordinator.end_call(SessionState::Idle, true, out);
            },
            _ => out.push(Effect::Action(ClientAction::StopAudio)),
        }
    }

    /// Re-evaluate the reactive rules after a batch of changes.
    pub(crate) fn reconcile(&mut self, coordinator: &mut MatchCoordinator, out: &mut Vec<Effect>) {
        let peers: BTreeSet<String> = coordinator.data().peers.iter().map(|p| p.id.clone()).collect();
        if peers != self.last_peers {
            debug!(before = self.last_peers.len(), after = peers.len(), "peer set changed");
            let emptied = peers.is_empty();
            self.last_peers = peers;

            if emptied
                && matches!(self.media, MediaState::Connected | MediaState::Reconnecting)
                && matches!(coordinator.state(), SessionState::Connecting | SessionState::Connected)
            {
                warn!("peers gone while media is up");
                out.push(Effect::Action(ClientAction::DisconnectMedia));
                out.push(Effect::Action(ClientAction::DismissNotification));
                coordinator.media_lost(out);
            }
        }

        self.settle(coordinator, out);

        if coordinator.state() == SessionState::Searching
            && coordinator.data().has_match()
            && self.media == MediaState::Disconnected
            && !self.connect_failed
        {
            self.connect(coordinator, out);
        }
    }
}
