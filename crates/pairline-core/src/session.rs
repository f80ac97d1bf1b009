//! Call lifecycle state machine.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ LocalStart ┌───────────┐ MatchDelivered ┌────────────┐ MediaConnected ┌───────────┐
//! │ Idle │───────────>│ Searching │───────────────>│ Connecting │───────────────>│ Connected │
//! └──────┘            └───────────┘<───────────────└────────────┘                └───────────┘
//!    ^                   │     ^      MatchInvalid        │                             │
//!    │                   │     │ Requeue                  │ LocalTeardown / MediaLost   │
//!    │                   │     │                          │ RemoteEnd                   │
//!    │                   v     │                          v                             │
//!    │  MediaDisconnected  ┌───────────────┐<─────────────────────────────────────────────┘
//!    └─────────────────────│ Disconnecting │
//!                          └───────────────┘
//! ```
//!
//! Any state may move to `Idle` on [`Trigger::Forced`]. Requests for the
//! current state are no-ops. Everything else is rejected without touching
//! the state.

use std::fmt;

use tracing::info;

use crate::error::SessionError;

/// Lifecycle of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Not matching.
    #[default]
    Idle,
    /// Queued on the server, waiting for a match.
    Searching,
    /// Match received, media session opening.
    Connecting,
    /// Media session up with at least one peer.
    Connected,
    /// Teardown started, waiting for the media session to close.
    Disconnecting,
}

impl SessionState {
    /// All states.
    pub const ALL: [SessionState; 5] =
        [Self::Idle, Self::Searching, Self::Connecting, Self::Connected, Self::Disconnecting];

    /// Whether UI should show the waiting screen rather than a call.
    ///
    /// `Searching` counts as not connected even though matching is in
    /// progress. This only drives presentation; reconnection logic never
    /// reads it.
    pub fn is_not_connected(self) -> bool {
        matches!(self, Self::Disconnecting | Self::Searching | Self::Idle)
    }

    /// Whether a call or search is in progress.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Searching | Self::Connecting | Self::Connected)
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Searching => "searching",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a transition was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// User started matching or re-entered the matching tab.
    LocalStart,
    /// Server delivered room, peers and media token.
    MatchDelivered,
    /// Media session connected with peers present.
    MediaConnected,
    /// User skipped or ended the call.
    LocalTeardown,
    /// Media session dropped or became inconsistent with signaling.
    MediaLost,
    /// Server ended the call, the timer ran out or the last peer left.
    RemoteEnd,
    /// Media session fully closed; the user no longer wants a call.
    MediaDisconnected,
    /// Media session fully closed; the user is still on the matching tab.
    Requeue,
    /// Match data was unusable (missing room id or token).
    MatchInvalid,
    /// Kind switch, auth loss or an end with nothing to tear down.
    Forced,
}

/// A state change that happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Previous state.
    pub from: SessionState,
    /// New state.
    pub to: SessionState,
    /// Reason.
    pub trigger: Trigger,
}

/// Guarded owner of a [`SessionState`].
#[derive(Debug, Clone, Default)]
pub struct SessionMachine {
    state: SessionState,
}

impl SessionMachine {
    /// Machine in `Idle`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the transition table has an edge `from -> to` for `trigger`.
    pub fn allows(from: SessionState, to: SessionState, trigger: Trigger) -> bool {
        use SessionState::{Connected, Connecting, Disconnecting, Idle, Searching};

        match (from, to, trigger) {
            (_, Idle, Trigger::Forced) => true,
            (Idle, Searching, Trigger::LocalStart) => true,
            (Searching, Connecting, Trigger::MatchDelivered) => true,
            (Connecting, Connected, Trigger::MediaConnected) => true,
            (Connecting, Searching, Trigger::MatchInvalid) => true,
            (
                Connected | Searching | Connecting,
                Disconnecting,
                Trigger::LocalTeardown | Trigger::MediaLost | Trigger::RemoteEnd,
            ) => true,
            (Disconnecting, Idle, Trigger::MediaDisconnected) => true,
            (Disconnecting, Searching, Trigger::Requeue) => true,
            _ => false,
        }
    }

    /// Request a transition.
    ///
    /// Returns `Ok(None)` when already in `to`.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidTransition` if the table has no such edge
    pub fn transition(
        &mut self,
        to: SessionState,
        trigger: Trigger,
    ) -> Result<Option<Transition>, SessionError> {
        let from = self.state;
        if from == to {
            return Ok(None);
        }

        if !Self::allows(from, to, trigger) {
            return Err(SessionError::InvalidTransition { from, to, trigger });
        }

        self.state = to;
        info!(%from, %to, ?trigger, "session transition");
        Ok(Some(Transition { from, to, trigger }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_cycle() {
        let mut machine = SessionMachine::new();

        for (to, trigger) in [
            (SessionState::Searching, Trigger::LocalStart),
            (SessionState::Connecting, Trigger::MatchDelivered),
            (SessionState::Connected, Trigger::MediaConnected),
            (SessionState::Disconnecting, Trigger::LocalTeardown),
            (SessionState::Searching, Trigger::Requeue),
            (SessionState::Disconnecting, Trigger::LocalTeardown),
            (SessionState::Idle, Trigger::MediaDisconnected),
        ] {
            assert!(machine.transition(to, trigger).unwrap().is_some());
            assert_eq!(machine.state(), to);
        }
    }

    #[test]
    fn self_transition_is_noop() {
        let mut machine = SessionMachine::new();
        assert_eq!(machine.transition(SessionState::Idle, Trigger::LocalStart), Ok(None));
        assert_eq!(machine.state(), SessionState::Idle);
    }

    #[test]
    fn rejected_transition_keeps_state() {
        let mut machine = SessionMachine::new();
        let err = machine.transition(SessionState::Connected, Trigger::MediaConnected).unwrap_err();

        assert!(matches!(err, SessionError::InvalidTransition { from: SessionState::Idle, .. }));
        assert_eq!(machine.state(), SessionState::Idle);
    }

    #[test]
    fn forced_idle_from_anywhere() {
        for state in SessionState::ALL {
            assert!(SessionMachine::allows(state, SessionState::Idle, Trigger::Forced));
        }
    }

    #[test]
    fn not_connected_predicate() {
        let not_connected: Vec<_> =
            SessionState::ALL.into_iter().filter(|s| s.is_not_connected()).collect();
        assert_eq!(not_connected, vec![
            SessionState::Idle,
            SessionState::Searching,
            SessionState::Disconnecting
        ]);
    }

    #[test]
    fn connected_requires_connecting() {
        for state in SessionState::ALL {
            let allowed =
                SessionMachine::allows(state, SessionState::Connected, Trigger::MediaConnected);
            assert_eq!(allowed, state == SessionState::Connecting);
        }
    }
}
