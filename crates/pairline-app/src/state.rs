//! Observable application state.
//!
//! [`ViewState`] is the "View Model" for a frontend: the subset of client
//! state needed for rendering, refreshed after every handled event. Frontends
//! never reach into the client directly.

use std::collections::VecDeque;

use pairline_client::{
    Client, ClientAction, Environment, MediaState, Notification, Request, SessionState, Tab,
};
use pairline_proto::Profile;

/// Notifications kept before the oldest is dropped.
pub const MAX_NOTIFICATIONS: usize = 16;

/// Projection of the client for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Session state.
    pub state: SessionState,
    /// Presentation flag: idle, searching or tearing down.
    pub is_not_connected: bool,
    /// Signaling channel is up.
    pub channel_connected: bool,
    /// Last observed media state.
    pub media: MediaState,
    /// Foreground tab.
    pub tab: Tab,
    /// Current room, empty when unmatched.
    pub room_id: String,
    /// Matched peers.
    pub peers: Vec<Profile>,
    /// Remaining call time, negative when unset.
    pub timer_value: i64,
    /// The call timer was extended.
    pub timer_extended: bool,
    /// Pending user-visible notifications, oldest first.
    pub notifications: VecDeque<Notification>,
    /// Users online, busy included.
    pub online_count: usize,
    /// Users in a call.
    pub busy_count: usize,
    /// Confirmed connections.
    pub friends: Vec<String>,
    /// Incoming connect requests.
    pub incoming_requests: Vec<String>,
    /// Connect requests I sent that are not yet mutual.
    pub outgoing_requests: Vec<String>,
    /// Waiting sound is playing.
    pub waiting_audio: bool,
    /// Most recent completed server request and whether it succeeded.
    pub last_request: Option<(Request, bool)>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            is_not_connected: true,
            channel_connected: false,
            media: MediaState::Disconnected,
            tab: Tab::default(),
            room_id: String::new(),
            peers: Vec::new(),
            timer_value: pairline_client::TIMER_UNSET,
            timer_extended: false,
            notifications: VecDeque::new(),
            online_count: 0,
            busy_count: 0,
            friends: Vec::new(),
            incoming_requests: Vec::new(),
            outgoing_requests: Vec::new(),
            waiting_audio: false,
            last_request: None,
        }
    }
}

impl ViewState {
    /// Refresh from the client. Returns `true` if anything changed.
    pub fn sync<E: Environment>(&mut self, client: &Client<E>) -> bool {
        let before = self.clone();

        let coordinator = client.coordinator();
        let data = coordinator.data();
        let presence = coordinator.presence();

        self.state = client.state();
        self.is_not_connected = self.state.is_not_connected();
        self.media = client.bridge().media();
        self.tab = client.bridge().tab();
        self.room_id.clone_from(&data.room_id);
        self.peers.clone_from(&data.peers);
        self.timer_value = data.timer_value;
        self.timer_extended = data.timer_extended;
        self.online_count = presence.online_count();
        self.busy_count = presence.busy_count();
        self.friends = presence.requests().confirmed.iter().cloned().collect();
        self.incoming_requests = presence.requests().sent_by_peer.iter().cloned().collect();
        self.outgoing_requests = presence.requests().sent_by_me.iter().cloned().collect();

        *self != before
    }

    /// Apply the UI-facing part of a client action.
    pub fn apply(&mut self, action: &ClientAction) {
        match action {
            ClientAction::Notify(notification) => {
                if self.notifications.len() == MAX_NOTIFICATIONS {
                    self.notifications.pop_front();
                }
                self.notifications.push_back(notification.clone());
            },
            ClientAction::DismissNotification => self.notifications.clear(),
            ClientAction::PlayWaitingAudio => self.waiting_audio = true,
            ClientAction::StopAudio => self.waiting_audio = false,
            ClientAction::ChannelStatus { connected } => self.channel_connected = *connected,
            ClientAction::RequestCompleted { request, success } => {
                self.last_request = Some((request.clone(), *success));
            },
            _ => {},
        }
    }

    /// Newest notification, if any.
    pub fn latest_notification(&self) -> Option<&Notification> {
        self.notifications.back()
    }
}
