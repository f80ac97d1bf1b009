//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of a session at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use std::collections::BTreeSet;

use pairline_app::ViewState;
use pairline_client::{MediaState, SessionState, TIMER_UNSET};

/// Snapshot of one client's observable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Session state.
    pub state: SessionState,
    /// Media state.
    pub media: MediaState,
    /// Current room.
    pub room_id: String,
    /// Matched peer ids.
    pub peer_ids: Vec<String>,
    /// Call timer.
    pub timer_value: i64,
    /// Timer was extended.
    pub timer_extended: bool,
    /// Queued notifications.
    pub notifications: usize,
    /// Confirmed connections.
    pub friends: BTreeSet<String>,
    /// Requests received from peers.
    pub incoming: BTreeSet<String>,
    /// Requests sent by this user.
    pub outgoing: BTreeSet<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            media: MediaState::Disconnected,
            room_id: String::new(),
            peer_ids: Vec::new(),
            timer_value: TIMER_UNSET,
            timer_extended: false,
            notifications: 0,
            friends: BTreeSet::new(),
            incoming: BTreeSet::new(),
            outgoing: BTreeSet::new(),
        }
    }
}

impl SessionSnapshot {
    /// Capture a rendered view.
    pub fn from_view(view: &ViewState) -> Self {
        Self {
            state: view.state,
            media: view.media,
            room_id: view.room_id.clone(),
            peer_ids: view.peers.iter().map(|p| p.id.clone()).collect(),
            timer_value: view.timer_value,
            timer_extended: view.timer_extended,
            notifications: view.notifications.len(),
            friends: view.friends.iter().cloned().collect(),
            incoming: view.incoming_requests.iter().cloned().collect(),
            outgoing: view.outgoing_requests.iter().cloned().collect(),
        }
    }
}
