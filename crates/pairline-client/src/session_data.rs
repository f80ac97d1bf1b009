//! Per-call session data.

use std::collections::BTreeSet;

use pairline_proto::{Profile, RoomInfo};

/// Timer value meaning "no timer received yet".
pub const TIMER_UNSET: i64 = -1;

/// Data for the current call.
///
/// Created empty, filled as match and timer events arrive, and wiped on
/// every call end.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionData {
    /// Server-assigned room id.
    pub room_id: String,
    /// Local profile as reported by the server.
    pub my_profile: Option<Profile>,
    /// Matched peers in server order.
    pub peers: Vec<Profile>,
    /// Media session access token.
    pub media_token: String,
    /// Event the match belongs to, if any.
    pub event_id: Option<String>,
    /// Peers that joined the media session.
    pub joined_video_peer_ids: BTreeSet<String>,
    /// Seconds left, or [`TIMER_UNSET`].
    pub timer_value: i64,
    /// The timer has been extended in this call.
    pub timer_extended: bool,
}

impl Default for SessionData {
    fn default() -> Self {
        Self {
            room_id: String::new(),
            my_profile: None,
            peers: Vec::new(),
            media_token: String::new(),
            event_id: None,
            joined_video_peer_ids: BTreeSet::new(),
            timer_value: TIMER_UNSET,
            timer_extended: false,
        }
    }
}

impl SessionData {
    /// Restore defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether all fields hold their defaults.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Ids of the current peers.
    pub fn peer_ids(&self) -> BTreeSet<&str> {
        self.peers.iter().map(|p| p.id.as_str()).collect()
    }

    /// Whether a room id and at least one peer are present.
    pub fn has_match(&self) -> bool {
        !self.room_id.is_empty() && !self.peers.is_empty()
    }

    /// Apply a room assignment unless it carries the same peer set.
    ///
    /// Returns false when the update was discarded as a duplicate.
    pub fn apply_room_info(&mut self, info: RoomInfo) -> bool {
        let incoming: BTreeSet<&str> = info.partners.iter().map(|p| p.id.as_str()).collect();
        if incoming == self.peer_ids() {
            return false;
        }

        self.room_id = info.room_id;
        self.my_profile = Some(info.my_profile);
        self.peers = info.partners;
        self.media_token = info.media_token;
        self.event_id = info.event_id;
        true
    }

    /// Remove a peer. Returns true if it was present.
    pub fn remove_peer(&mut self, peer_id: &str) -> bool {
        let before = self.peers.len();
        self.peers.retain(|p| p.id != peer_id);
        self.joined_video_peer_ids.remove(peer_id);
        self.peers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(room: &str, peers: &[&str]) -> RoomInfo {
        RoomInfo {
            room_id: room.into(),
            my_profile: Profile::with_id("me"),
            partners: peers.iter().map(|p| Profile::with_id(*p)).collect(),
            media_token: "tok".into(),
            event_id: None,
        }
    }

    #[test]
    fn duplicate_peer_set_is_discarded() {
        let mut data = SessionData::default();
        assert!(data.apply_room_info(info("r1", &["a", "b"])));
        assert!(!data.apply_room_info(info("r2", &["b", "a"])));
        assert_eq!(data.room_id, "r1");
    }

    #[test]
    fn changed_peer_set_replaces_atomically() {
        let mut data = SessionData::default();
        data.apply_room_info(info("r1", &["a"]));
        data.timer_value = 30;

        assert!(data.apply_room_info(info("r2", &["c"])));
        assert_eq!(data.room_id, "r2");
        assert_eq!(data.peer_ids(), BTreeSet::from(["c"]));
        assert_eq!(data.timer_value, 30);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut data = SessionData::default();
        data.apply_room_info(info("r1", &["a"]));
        data.timer_extended = true;
        data.reset();
        assert!(data.is_empty());
        assert_eq!(data.timer_value, TIMER_UNSET);
    }

    #[test]
    fn remove_peer_clears_joined_flag() {
        let mut data = SessionData::default();
        data.apply_room_info(info("r1", &["a", "b"]));
        data.joined_video_peer_ids.insert("a".into());

        assert!(data.remove_peer("a"));
        assert!(!data.remove_peer("a"));
        assert!(data.joined_video_peer_ids.is_empty());
        assert_eq!(data.peers.len(), 1);
    }
}
