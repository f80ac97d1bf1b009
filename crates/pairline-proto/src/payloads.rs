//! Event payload types.
//!
//! Field names follow the server's JSON keys exactly (`roomId`,
//! `myLiveKitToken`, `usersOnline`, ...). Inbound types are lenient where
//! the server is known to omit fields; outbound types always serialize every
//! key.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker the server-side ack helper returns when an ack never arrived.
pub const NO_ACK: &str = "NO ACK";

/// A user profile as delivered in room info.
///
/// Only the fields this client reasons about are typed; everything else is
/// preserved in `extra` so UI layers can render it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// User id.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Country code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Ids of users this profile is already connected with.
    #[serde(default)]
    pub friends: Vec<String>,
    /// Untyped remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    /// Profile with only an id set.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Self::default() }
    }
}

/// Room assignment delivered by `getPartnerInfo`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomInfo {
    /// Server-assigned room id.
    #[serde(rename = "roomId", default)]
    pub room_id: String,
    /// The local user's profile as the server sees it.
    #[serde(rename = "myInfo", default)]
    pub my_profile: Profile,
    /// Matched peers, in server order.
    #[serde(default)]
    pub partners: Vec<Profile>,
    /// Access token for the media session.
    #[serde(rename = "myLiveKitToken", default)]
    pub media_token: String,
    /// Event id when the match belongs to an event.
    #[serde(rename = "eventId", default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// `roomCreated {roomId, users}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCreated {
    /// Room id.
    #[serde(rename = "roomId")]
    pub room_id: String,
    /// User ids placed in the room.
    #[serde(default)]
    pub users: Vec<String>,
}

/// `connectedUser {from, cancel, isFriends}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedUser {
    /// Requesting user.
    pub from: String,
    /// The sender withdrew an earlier request.
    #[serde(default)]
    pub cancel: bool,
    /// The server already considers both users friends.
    #[serde(rename = "isFriends", default)]
    pub is_friends: bool,
}

/// Raw acknowledgment arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AckPayload {
    /// Arguments of the ACK packet.
    pub args: Vec<Value>,
}

impl AckPayload {
    /// Wrap ack arguments.
    pub fn new(args: Vec<Value>) -> Self {
        Self { args }
    }

    /// Whether the payload is the `"NO ACK"` marker.
    pub fn is_no_ack(&self) -> bool {
        self.args.first().and_then(Value::as_str) == Some(NO_ACK)
    }

    /// Decode as a `{completionStatus, data}` reply.
    pub fn reply(&self) -> AckReply {
        AckReply::from_args(&self.args)
    }

    /// Decode as a `{usersOnline: [...]}` roster.
    pub fn roster(&self) -> Option<Roster> {
        self.args.first().and_then(Roster::from_value)
    }
}

/// `{completionStatus, data}` acknowledgment.
///
/// A missing or non-boolean status decodes as `None`. Callers treat that as
/// failure; it never aborts decoding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AckReply {
    /// Reported completion status, if present and boolean.
    pub completion_status: Option<bool>,
    /// Attached data, if any.
    pub data: Option<Value>,
}

impl AckReply {
    /// Decode from ack arguments.
    pub fn from_args(args: &[Value]) -> Self {
        let Some(Value::Object(map)) = args.first() else {
            return Self::default();
        };

        Self {
            completion_status: map.get("completionStatus").and_then(Value::as_bool),
            data: map.get("data").filter(|v| !v.is_null()).cloned(),
        }
    }

    /// Whether the server reported success.
    pub fn succeeded(&self) -> bool {
        self.completion_status == Some(true)
    }

    /// `data.isFriends`, false when absent.
    pub fn is_friends(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|d| d.get("isFriends"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Presence status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PresenceStatus {
    /// Online and available.
    Online,
    /// Online but in a call.
    Busy,
    /// Not connected.
    Offline,
}

impl PresenceStatus {
    /// Derive from the `isOnline`/`isBusy` pair sent by the client.
    pub fn from_flags(online: bool, busy: bool) -> Self {
        match (online, busy) {
            (false, _) => Self::Offline,
            (true, true) => Self::Busy,
            (true, false) => Self::Online,
        }
    }

    /// Wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Busy => "busy",
            Self::Offline => "offline",
        }
    }
}

impl TryFrom<String> for PresenceStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "busy" => Ok(Self::Busy),
            "offline" => Ok(Self::Offline),
            _ => Err(format!("unknown presence status {value:?}")),
        }
    }
}

impl From<PresenceStatus> for String {
    fn from(status: PresenceStatus) -> Self {
        status.as_str().to_string()
    }
}

/// One presence entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPresence {
    /// User id.
    #[serde(rename = "userId", alias = "id")]
    pub user_id: String,
    /// Current status.
    pub status: PresenceStatus,
}

/// Authoritative list of presence entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    /// Entries that decoded successfully.
    pub entries: Vec<UserPresence>,
    /// Entries that were skipped as malformed.
    pub skipped: usize,
}

impl Roster {
    /// Decode `{usersOnline: [...]}` or a bare array.
    ///
    /// Malformed entries are skipped individually. Returns `None` when the
    /// value has neither shape.
    pub fn from_value(value: &Value) -> Option<Self> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(map) => map.get("usersOnline")?.as_array()?,
            _ => return None,
        };

        let mut roster = Self::default();
        for item in items {
            match serde_json::from_value::<UserPresence>(item.clone()) {
                Ok(entry) => roster.entries.push(entry),
                Err(_) => roster.skipped += 1,
            }
        }
        Some(roster)
    }
}

/// Payload of `userOnlineChanged`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceUpdate {
    /// A single user changed status.
    Single(UserPresence),
    /// A full roster push.
    Roster(Roster),
}

impl PresenceUpdate {
    /// Decode either shape.
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.get("usersOnline").is_some() {
            return Roster::from_value(value).map(Self::Roster);
        }
        serde_json::from_value(value.clone()).ok().map(Self::Single)
    }
}

/// Server `error` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// Headline.
    pub text: String,
    /// Optional detail.
    pub description: Option<String>,
}

impl ServerError {
    /// Decode `{text, description?}` or a bare string. Anything else yields
    /// the generic `"Error"` text.
    pub fn from_args(args: &[Value]) -> Self {
        match args.first() {
            Some(Value::Object(map)) => match map.get("text").and_then(Value::as_str) {
                Some(text) => Self {
                    text: text.to_string(),
                    description: map
                        .get("description")
                        .and_then(Value::as_str)
                        .filter(|d| !d.is_empty())
                        .map(str::to_string),
                },
                None => Self::generic(),
            },
            Some(Value::String(text)) => Self { text: text.clone(), description: None },
            _ => Self::generic(),
        }
    }

    fn generic() -> Self {
        Self { text: "Error".to_string(), description: None }
    }
}

/// Server `showNotification` event. The shape is server-defined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerNotification {
    /// Raw fields.
    pub fields: Map<String, Value>,
}

impl ServerNotification {
    /// String field by key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Best-effort headline: `title`, `text` or `message`.
    pub fn headline(&self) -> Option<&str> {
        ["title", "text", "message"].into_iter().find_map(|key| self.get_str(key))
    }
}

/// `startMatching {id, token}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartMatching {
    /// Local user id.
    pub id: String,
    /// Auth token.
    pub token: String,
}

/// `changeShouldCall {shouldCall}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeShouldCall {
    /// Whether the user still wants to be in a call.
    #[serde(rename = "shouldCall")]
    pub should_call: bool,
}

/// `joinedVideo {roomId, meetTime}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedVideo {
    /// Room joined.
    #[serde(rename = "roomId")]
    pub room_id: String,
    /// Call length in seconds.
    #[serde(rename = "meetTime")]
    pub meet_time: u64,
}

/// `extendTimer {roomId, seconds}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendTimer {
    /// Room whose timer is extended.
    #[serde(rename = "roomId")]
    pub room_id: String,
    /// Seconds to add.
    pub seconds: u32,
}

/// `changeUserOnline {id, token, isOnline, isBusy}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeUserOnline {
    /// Local user id.
    pub id: String,
    /// Auth token.
    pub token: String,
    /// Online flag.
    #[serde(rename = "isOnline")]
    pub is_online: bool,
    /// Busy flag.
    #[serde(rename = "isBusy")]
    pub is_busy: bool,
}

/// `{to}` target of connect-book requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTarget {
    /// Target user id.
    pub to: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn room_info_maps_wire_keys() {
        let value = json!({
            "roomId": "r1",
            "myInfo": {"id": "me", "friends": ["f1"], "age": 30},
            "partners": [{"id": "p1", "name": "Pat"}],
            "myLiveKitToken": "tok",
        });

        let info: RoomInfo = serde_json::from_value(value).unwrap();
        assert_eq!(info.room_id, "r1");
        assert_eq!(info.my_profile.friends, vec!["f1".to_string()]);
        assert_eq!(info.my_profile.extra.get("age"), Some(&json!(30)));
        assert_eq!(info.partners[0].name.as_deref(), Some("Pat"));
        assert_eq!(info.media_token, "tok");
        assert_eq!(info.event_id, None);
    }

    #[test]
    fn ack_status_decodes_defensively() {
        assert!(AckReply::from_args(&[json!({"completionStatus": true})]).succeeded());
        assert_eq!(
            AckReply::from_args(&[json!({"completionStatus": "yes"})]).completion_status,
            None
        );
        assert_eq!(AckReply::from_args(&[json!(1)]), AckReply::default());
        assert_eq!(AckReply::from_args(&[]), AckReply::default());
    }

    #[test]
    fn ack_reply_reads_is_friends() {
        let reply =
            AckReply::from_args(&[json!({"completionStatus": true, "data": {"isFriends": true}})]);
        assert!(reply.is_friends());
        assert!(!AckReply::from_args(&[json!({"completionStatus": true})]).is_friends());
    }

    #[test]
    fn no_ack_marker_is_detected() {
        assert!(AckPayload::new(vec![json!("NO ACK")]).is_no_ack());
        assert!(!AckPayload::new(vec![json!({})]).is_no_ack());
    }

    #[test]
    fn roster_skips_malformed_entries() {
        let roster = Roster::from_value(&json!({
            "usersOnline": [
                {"userId": "u1", "status": "ONLINE"},
                {"userId": "u2", "status": "sleeping"},
                {"id": "u3", "status": "busy"},
                7,
            ]
        }))
        .unwrap();

        assert_eq!(roster.entries.len(), 2);
        assert_eq!(roster.entries[0].status, PresenceStatus::Online);
        assert_eq!(roster.entries[1].user_id, "u3");
        assert_eq!(roster.skipped, 2);
    }

    #[test]
    fn presence_update_accepts_both_shapes() {
        let single = PresenceUpdate::from_value(&json!({"userId": "u1", "status": "offline"}));
        assert!(matches!(single, Some(PresenceUpdate::Single(ref p)) if p.user_id == "u1"));

        let roster = PresenceUpdate::from_value(&json!({"usersOnline": []}));
        assert!(matches!(roster, Some(PresenceUpdate::Roster(ref r)) if r.entries.is_empty()));

        assert_eq!(PresenceUpdate::from_value(&json!({"nope": 1})), None);
    }

    #[test]
    fn server_error_shapes() {
        let err = ServerError::from_args(&[json!({"text": "Banned", "description": "spam"})]);
        assert_eq!(err.text, "Banned");
        assert_eq!(err.description.as_deref(), Some("spam"));

        assert_eq!(ServerError::from_args(&[json!("oops")]).text, "oops");
        assert_eq!(ServerError::from_args(&[json!(12)]).text, "Error");
        assert_eq!(ServerError::from_args(&[]).text, "Error");
    }

    #[test]
    fn status_from_flags() {
        assert_eq!(PresenceStatus::from_flags(true, false), PresenceStatus::Online);
        assert_eq!(PresenceStatus::from_flags(true, true), PresenceStatus::Busy);
        assert_eq!(PresenceStatus::from_flags(false, true), PresenceStatus::Offline);
    }
}
