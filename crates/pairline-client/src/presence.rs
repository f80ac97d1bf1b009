//! Presence and connect-request book.

use std::collections::{BTreeSet, HashMap};

use pairline_proto::{PresenceStatus, PresenceUpdate, Roster, UserPresence};
use tracing::debug;

/// Connect-request tracking.
///
/// The three sets are kept disjoint: moving a user into one removes it from
/// the others where the protocol requires it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectRequests {
    /// Requests I sent that are not yet mutual.
    pub sent_by_me: BTreeSet<String>,
    /// Requests peers sent to me.
    pub sent_by_peer: BTreeSet<String>,
    /// Mutual connections.
    pub confirmed: BTreeSet<String>,
}

impl ConnectRequests {
    /// Record a confirmed connection. Returns true if it is new.
    pub fn confirm(&mut self, user_id: &str) -> bool {
        self.sent_by_me.remove(user_id);
        self.sent_by_peer.remove(user_id);
        self.confirmed.insert(user_id.to_string())
    }

    /// Record a request I sent that the server did not report as mutual.
    ///
    /// Returns true when the peer had already requested me, which makes the
    /// connection mutual.
    pub fn record_sent(&mut self, user_id: &str) -> bool {
        if self.confirmed.contains(user_id) {
            return false;
        }
        if self.sent_by_peer.contains(user_id) {
            return self.confirm(user_id);
        }

        self.sent_by_me.insert(user_id.to_string());
        false
    }

    /// A peer requested a connection with me.
    ///
    /// Returns true when this completes a mutual match (I had already sent a
    /// request to the same peer, or the server says we are friends).
    pub fn peer_requested(&mut self, user_id: &str, is_friends: bool) -> bool {
        if self.confirmed.contains(user_id) {
            return false;
        }

        if is_friends || self.sent_by_me.contains(user_id) {
            return self.confirm(user_id);
        }

        self.sent_by_peer.insert(user_id.to_string());
        false
    }

    /// A peer withdrew a request.
    pub fn peer_cancelled(&mut self, user_id: &str) {
        self.sent_by_peer.remove(user_id);
    }

    /// I withdrew a request.
    pub fn cancelled(&mut self, user_id: &str) {
        self.sent_by_me.remove(user_id);
    }

    /// I removed a connection.
    pub fn removed(&mut self, user_id: &str) {
        self.confirmed.remove(user_id);
        self.sent_by_peer.remove(user_id);
    }

    /// A peer removed me.
    pub fn removed_by_peer(&mut self, user_id: &str) {
        self.sent_by_me.remove(user_id);
        self.sent_by_peer.remove(user_id);
        self.confirmed.remove(user_id);
    }

    /// Merge known friends without duplicates. Returns how many were new.
    pub fn merge_friends<'a>(&mut self, friends: impl IntoIterator<Item = &'a String>) -> usize {
        friends.into_iter().filter(|id| !id.is_empty()).filter(|id| self.confirm(id)).count()
    }
}

/// Known presence of other users plus the connect-request book.
///
/// Persists for the lifetime of the client; not reset per call.
#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    statuses: HashMap<String, PresenceStatus>,
    requests: ConnectRequests,
    announced: Option<(bool, bool)>,
}

impl PresenceTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert one entry. Last write wins.
    pub fn upsert(&mut self, entry: UserPresence) {
        self.statuses.insert(entry.user_id, entry.status);
    }

    /// Upsert every roster entry.
    pub fn apply_roster(&mut self, roster: Roster) {
        if roster.skipped > 0 {
            debug!(skipped = roster.skipped, "roster entries skipped");
        }
        for entry in roster.entries {
            self.upsert(entry);
        }
    }

    /// Apply a `userOnlineChanged` push.
    pub fn apply(&mut self, update: PresenceUpdate) {
        match update {
            PresenceUpdate::Single(entry) => self.upsert(entry),
            PresenceUpdate::Roster(roster) => self.apply_roster(roster),
        }
    }

    /// Status of a user, if known.
    pub fn status(&self, user_id: &str) -> Option<PresenceStatus> {
        self.statuses.get(user_id).copied()
    }

    /// Whether a user is online (busy counts as online).
    pub fn is_online(&self, user_id: &str) -> bool {
        self.status(user_id).is_some_and(|s| s != PresenceStatus::Offline)
    }

    /// Users whose status is not `Offline`.
    pub fn online_count(&self) -> usize {
        self.statuses.values().filter(|s| **s != PresenceStatus::Offline).count()
    }

    /// Users whose status is `Busy`.
    pub fn busy_count(&self) -> usize {
        self.statuses.values().filter(|s| **s == PresenceStatus::Busy).count()
    }

    /// All known entries.
    pub fn statuses(&self) -> &HashMap<String, PresenceStatus> {
        &self.statuses
    }

    /// Connect-request book.
    pub fn requests(&self) -> &ConnectRequests {
        &self.requests
    }

    /// Mutable connect-request book.
    pub fn requests_mut(&mut self) -> &mut ConnectRequests {
        &mut self.requests
    }

    /// Remember the last requested `(online, busy)` so it can be re-announced
    /// after a reconnect.
    pub fn set_announced(&mut self, online: bool, busy: bool) {
        self.announced = Some((online, busy));
    }

    /// Last requested `(online, busy)`.
    pub fn announced(&self) -> Option<(bool, bool)> {
        self.announced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, status: PresenceStatus) -> UserPresence {
        UserPresence { user_id: id.into(), status }
    }

    #[test]
    fn last_write_wins() {
        let mut tracker = PresenceTracker::new();
        tracker.upsert(entry("u1", PresenceStatus::Online));
        tracker.upsert(entry("u1", PresenceStatus::Offline));

        assert_eq!(tracker.status("u1"), Some(PresenceStatus::Offline));
        assert!(!tracker.is_online("u1"));
        assert_eq!(tracker.online_count(), 0);
    }

    #[test]
    fn counts_treat_busy_as_online() {
        let mut tracker = PresenceTracker::new();
        tracker.apply_roster(Roster {
            entries: vec![
                entry("a", PresenceStatus::Online),
                entry("b", PresenceStatus::Busy),
                entry("c", PresenceStatus::Offline),
            ],
            skipped: 0,
        });

        assert_eq!(tracker.online_count(), 2);
        assert_eq!(tracker.busy_count(), 1);
        assert!(tracker.is_online("b"));
        assert!(!tracker.is_online("unknown"));
    }

    #[test]
    fn peer_request_after_mine_is_mutual() {
        let mut book = ConnectRequests::default();
        book.record_sent("p1");

        assert!(book.peer_requested("p1", false));
        assert!(book.confirmed.contains("p1"));
        assert!(book.sent_by_me.is_empty());
        assert!(!book.peer_requested("p1", false));
    }

    #[test]
    fn my_request_after_theirs_is_mutual() {
        let mut book = ConnectRequests::default();
        book.peer_requested("p1", false);

        assert!(book.record_sent("p1"));
        assert!(book.confirmed.contains("p1"));
        assert!(book.sent_by_me.is_empty());
        assert!(book.sent_by_peer.is_empty());
        assert!(!book.record_sent("p1"));
    }

    #[test]
    fn peer_request_alone_is_recorded() {
        let mut book = ConnectRequests::default();
        assert!(!book.peer_requested("p2", false));
        assert!(book.sent_by_peer.contains("p2"));

        book.peer_cancelled("p2");
        assert!(book.sent_by_peer.is_empty());
    }

    #[test]
    fn server_friendship_flag_confirms() {
        let mut book = ConnectRequests::default();
        assert!(book.peer_requested("p3", true));
        assert_eq!(book.confirmed.len(), 1);
    }

    #[test]
    fn removal_by_peer_clears_all_sets() {
        let mut book = ConnectRequests::default();
        book.record_sent("a");
        book.peer_requested("b", false);
        book.confirm("c");

        for id in ["a", "b", "c"] {
            book.removed_by_peer(id);
        }
        assert_eq!(book, ConnectRequests::default());
    }

    #[test]
    fn merge_friends_skips_known() {
        let mut book = ConnectRequests::default();
        book.confirm("a");
        let friends = vec!["a".to_string(), "b".to_string(), "b".to_string()];
        assert_eq!(book.merge_friends(&friends), 1);
        assert_eq!(book.confirmed.len(), 2);
    }
}
