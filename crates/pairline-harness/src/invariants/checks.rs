//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use pairline_app::MAX_NOTIFICATIONS;
use pairline_client::{SessionState, TIMER_UNSET};

use super::{Invariant, InvariantResult, SessionSnapshot, Violation};

/// A call never exists without a peer.
///
/// `Connected` with an empty peer list means media came up for a match the
/// client no longer has.
pub struct ConnectedHasPeers;

impl Invariant for ConnectedHasPeers {
    fn name(&self) -> &'static str {
        "connected_has_peers"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.state == SessionState::Connected && state.peer_ids.is_empty() {
            return Err(Violation {
                invariant: self.name(),
                message: format!("connected in room '{}' without peers", state.room_id),
            });
        }
        Ok(())
    }
}

/// An extended timer always carries a value.
pub struct TimerConsistency;

impl Invariant for TimerConsistency {
    fn name(&self) -> &'static str {
        "timer_consistency"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.timer_extended && state.timer_value == TIMER_UNSET {
            return Err(Violation {
                invariant: self.name(),
                message: "timer marked extended but unset".to_string(),
            });
        }
        Ok(())
    }
}

/// A user is in at most one of friends, incoming or outgoing.
///
/// Confirming a connection must clear both pending directions.
pub struct ConnectBookDisjoint;

impl Invariant for ConnectBookDisjoint {
    fn name(&self) -> &'static str {
        "connect_book_disjoint"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let confirmed: Vec<&String> = state
            .friends
            .iter()
            .filter(|id| state.incoming.contains(*id) || state.outgoing.contains(*id))
            .collect();
        if !confirmed.is_empty() {
            return Err(Violation {
                invariant: self.name(),
                message: format!("confirmed users still pending: {confirmed:?}"),
            });
        }

        let both_ways: Vec<&String> = state.incoming.intersection(&state.outgoing).collect();
        if !both_ways.is_empty() {
            return Err(Violation {
                invariant: self.name(),
                message: format!("requests pending in both directions: {both_ways:?}"),
            });
        }
        Ok(())
    }
}

/// The notification queue never grows past its bound.
pub struct NotificationBound;

impl Invariant for NotificationBound {
    fn name(&self) -> &'static str {
        "notification_bound"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.notifications > MAX_NOTIFICATIONS {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{} notifications queued", state.notifications),
            });
        }
        Ok(())
    }
}
