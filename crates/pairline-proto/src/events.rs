//! Typed signaling events.
//!
//! [`EventName`] is the closed vocabulary of event names on the wire.
//! [`Outbound`] events are built by the client and encoded into EVENT
//! packets; [`Inbound`] events are decoded from the name and arguments of a
//! received EVENT packet.

use std::fmt;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    SocketPacket,
    errors::{ProtocolError, Result},
    payloads::{
        ChangeShouldCall, ChangeUserOnline, ConnectedUser, ExtendTimer, JoinedVideo,
        PresenceUpdate, RoomCreated, RoomInfo, ServerError, ServerNotification, StartMatching,
        UserTarget,
    },
};

/// Every event name used on the signaling channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventName {
    /// `startMatching` (out)
    StartMatching,
    /// `skipCall` (out, ack)
    SkipCall,
    /// `end` (both directions)
    End,
    /// `changeShouldCall` (out)
    ChangeShouldCall,
    /// `joinedVideo` (out)
    JoinedVideo,
    /// `extendTimer` (out)
    ExtendTimer,
    /// `changeUserOnline` (out, ack)
    ChangeUserOnline,
    /// `connectUserRequest` (out, ack)
    ConnectUserRequest,
    /// `cancelConnectUserRequest` (out, ack)
    CancelConnectUserRequest,
    /// `removeUserRequest` (out, ack)
    RemoveUserRequest,
    /// `showNotification` (in)
    ShowNotification,
    /// `error` (in)
    Error,
    /// `roomCreated` (in)
    RoomCreated,
    /// `getPartnerInfo` (in)
    GetPartnerInfo,
    /// `partnerLeft` (in)
    PartnerLeft,
    /// `partnerJoinedVideo` (in)
    PartnerJoinedVideo,
    /// `timerUpdate` (in)
    TimerUpdate,
    /// `timerExtended` (in)
    TimerExtended,
    /// `timerEnded` (in)
    TimerEnded,
    /// `userOnlineChanged` (in)
    UserOnlineChanged,
    /// `connectedUser` (in)
    ConnectedUser,
    /// `removedUser` (in)
    RemovedUser,
}

impl EventName {
    /// All names.
    pub const ALL: [EventName; 22] = [
        Self::StartMatching,
        Self::SkipCall,
        Self::End,
        Self::ChangeShouldCall,
        Self::JoinedVideo,
        Self::ExtendTimer,
        Self::ChangeUserOnline,
        Self::ConnectUserRequest,
        Self::CancelConnectUserRequest,
        Self::RemoveUserRequest,
        Self::ShowNotification,
        Self::Error,
        Self::RoomCreated,
        Self::GetPartnerInfo,
        Self::PartnerLeft,
        Self::PartnerJoinedVideo,
        Self::TimerUpdate,
        Self::TimerExtended,
        Self::TimerEnded,
        Self::UserOnlineChanged,
        Self::ConnectedUser,
        Self::RemovedUser,
    ];

    /// Wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartMatching => "startMatching",
            Self::SkipCall => "skipCall",
            Self::End => "end",
            Self::ChangeShouldCall => "changeShouldCall",
            Self::JoinedVideo => "joinedVideo",
            Self::ExtendTimer => "extendTimer",
            Self::ChangeUserOnline => "changeUserOnline",
            Self::ConnectUserRequest => "connectUserRequest",
            Self::CancelConnectUserRequest => "cancelConnectUserRequest",
            Self::RemoveUserRequest => "removeUserRequest",
            Self::ShowNotification => "showNotification",
            Self::Error => "error",
            Self::RoomCreated => "roomCreated",
            Self::GetPartnerInfo => "getPartnerInfo",
            Self::PartnerLeft => "partnerLeft",
            Self::PartnerJoinedVideo => "partnerJoinedVideo",
            Self::TimerUpdate => "timerUpdate",
            Self::TimerExtended => "timerExtended",
            Self::TimerEnded => "timerEnded",
            Self::UserOnlineChanged => "userOnlineChanged",
            Self::ConnectedUser => "connectedUser",
            Self::RemovedUser => "removedUser",
        }
    }

    /// Look up a wire string.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.as_str() == name)
    }

    /// Whether the server may push this event.
    pub fn is_inbound(self) -> bool {
        matches!(
            self,
            Self::End
                | Self::ShowNotification
                | Self::Error
                | Self::RoomCreated
                | Self::GetPartnerInfo
                | Self::PartnerLeft
                | Self::PartnerJoinedVideo
                | Self::TimerUpdate
                | Self::TimerExtended
                | Self::TimerEnded
                | Self::UserOnlineChanged
                | Self::ConnectedUser
                | Self::RemovedUser
        )
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events sent by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Enter the matching queue.
    StartMatching(StartMatching),
    /// Leave the current pairing but stay queued.
    SkipCall,
    /// End the call.
    End,
    /// Mirror the call-intent flag.
    ChangeShouldCall(ChangeShouldCall),
    /// Media session joined; the server starts the call timer.
    JoinedVideo(JoinedVideo),
    /// Ask for more call time.
    ExtendTimer(ExtendTimer),
    /// Announce presence; the ack carries the roster.
    ChangeUserOnline(ChangeUserOnline),
    /// Send a connect request.
    ConnectUserRequest(UserTarget),
    /// Withdraw a connect request.
    CancelConnectUserRequest(UserTarget),
    /// Remove a connection.
    RemoveUserRequest(UserTarget),
}

impl Outbound {
    /// Event name.
    pub fn name(&self) -> EventName {
        match self {
            Self::StartMatching(_) => EventName::StartMatching,
            Self::SkipCall => EventName::SkipCall,
            Self::End => EventName::End,
            Self::ChangeShouldCall(_) => EventName::ChangeShouldCall,
            Self::JoinedVideo(_) => EventName::JoinedVideo,
            Self::ExtendTimer(_) => EventName::ExtendTimer,
            Self::ChangeUserOnline(_) => EventName::ChangeUserOnline,
            Self::ConnectUserRequest(_) => EventName::ConnectUserRequest,
            Self::CancelConnectUserRequest(_) => EventName::CancelConnectUserRequest,
            Self::RemoveUserRequest(_) => EventName::RemoveUserRequest,
        }
    }

    /// Whether the server acknowledges this event.
    pub fn expects_ack(&self) -> bool {
        matches!(
            self,
            Self::SkipCall
                | Self::ChangeUserOnline(_)
                | Self::ConnectUserRequest(_)
                | Self::CancelConnectUserRequest(_)
                | Self::RemoveUserRequest(_)
        )
    }

    /// JSON arguments following the event name.
    pub fn args(&self) -> Result<Vec<Value>> {
        Ok(match self {
            Self::SkipCall | Self::End => Vec::new(),
            Self::StartMatching(p) => vec![to_value(p)?],
            Self::ChangeShouldCall(p) => vec![to_value(p)?],
            Self::JoinedVideo(p) => vec![to_value(p)?],
            Self::ExtendTimer(p) => vec![to_value(p)?],
            Self::ChangeUserOnline(p) => vec![to_value(p)?],
            Self::ConnectUserRequest(p)
            | Self::CancelConnectUserRequest(p)
            | Self::RemoveUserRequest(p) => vec![to_value(p)?],
        })
    }

    /// Build the EVENT packet.
    pub fn into_packet(self, ack_id: Option<u64>) -> Result<SocketPacket> {
        Ok(SocketPacket::Event { ack_id, name: self.name().as_str().to_string(), args: self.args()? })
    }
}

/// Events pushed by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Server-defined notification.
    ShowNotification(ServerNotification),
    /// Server-reported error.
    Error(ServerError),
    /// Room allocated while searching.
    RoomCreated(RoomCreated),
    /// Room, peers and media token.
    PartnerInfo(RoomInfo),
    /// A peer left the room.
    PartnerLeft {
        /// Departing peer.
        partner_id: String,
    },
    /// A peer joined the media session.
    PartnerJoinedVideo {
        /// Peer id.
        user_id: String,
    },
    /// Server ended the call.
    End,
    /// Remaining call time.
    TimerUpdate {
        /// Seconds left.
        timer_value: i64,
    },
    /// Call time extended.
    TimerExtended {
        /// Seconds left after the extension.
        timer_value: i64,
    },
    /// Call time ran out.
    TimerEnded,
    /// Presence change or roster push.
    UserOnlineChanged(PresenceUpdate),
    /// Connect request from a peer.
    ConnectedUser(ConnectedUser),
    /// A peer removed the connection.
    RemovedUser {
        /// Removing peer.
        from: String,
    },
}

impl Inbound {
    /// Decode an EVENT packet's name and arguments.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownEvent` if `name` is not an inbound event
    /// - `ProtocolError::InvalidPayload` if a required field is missing
    pub fn decode(name: &str, args: &[Value]) -> Result<Self> {
        let event = EventName::from_wire(name)
            .filter(|e| e.is_inbound())
            .ok_or_else(|| ProtocolError::UnknownEvent(name.to_string()))?;

        match event {
            EventName::ShowNotification => match args.first() {
                Some(Value::Object(map)) => {
                    Ok(Self::ShowNotification(ServerNotification { fields: map.clone() }))
                },
                _ => Err(invalid(event, "expected an object")),
            },
            EventName::Error => Ok(Self::Error(ServerError::from_args(args))),
            EventName::RoomCreated => Ok(Self::RoomCreated(first(event, args)?)),
            EventName::GetPartnerInfo => {
                let data = first_object(event, args)?
                    .get("data")
                    .cloned()
                    .ok_or_else(|| invalid(event, "missing data"))?;
                let info = serde_json::from_value(data).map_err(|e| invalid(event, e))?;
                Ok(Self::PartnerInfo(info))
            },
            EventName::PartnerLeft => {
                Ok(Self::PartnerLeft { partner_id: string_field(event, args, "partnerId")? })
            },
            EventName::PartnerJoinedVideo => {
                Ok(Self::PartnerJoinedVideo { user_id: string_field(event, args, "userId")? })
            },
            EventName::End => Ok(Self::End),
            EventName::TimerUpdate => {
                Ok(Self::TimerUpdate { timer_value: int_field(event, args, "timerValue")? })
            },
            EventName::TimerExtended => {
                Ok(Self::TimerExtended { timer_value: int_field(event, args, "timerValue")? })
            },
            EventName::TimerEnded => Ok(Self::TimerEnded),
            EventName::UserOnlineChanged => {
                let value = first_object(event, args)?;
                PresenceUpdate::from_value(value)
                    .map(Self::UserOnlineChanged)
                    .ok_or_else(|| invalid(event, "unrecognized presence shape"))
            },
            EventName::ConnectedUser => Ok(Self::ConnectedUser(first(event, args)?)),
            EventName::RemovedUser => Ok(Self::RemovedUser { from: string_field(event, args, "from")? }),
            _ => Err(ProtocolError::UnknownEvent(name.to_string())),
        }
    }

    /// Event name.
    pub fn name(&self) -> EventName {
        match self {
            Self::ShowNotification(_) => EventName::ShowNotification,
            Self::Error(_) => EventName::Error,
            Self::RoomCreated(_) => EventName::RoomCreated,
            Self::PartnerInfo(_) => EventName::GetPartnerInfo,
            Self::PartnerLeft { .. } => EventName::PartnerLeft,
            Self::PartnerJoinedVideo { .. } => EventName::PartnerJoinedVideo,
            Self::End => EventName::End,
            Self::TimerUpdate { .. } => EventName::TimerUpdate,
            Self::TimerExtended { .. } => EventName::TimerExtended,
            Self::TimerEnded => EventName::TimerEnded,
            Self::UserOnlineChanged(_) => EventName::UserOnlineChanged,
            Self::ConnectedUser(_) => EventName::ConnectedUser,
            Self::RemovedUser { .. } => EventName::RemovedUser,
        }
    }
}

fn to_value<T: Serialize>(payload: &T) -> Result<Value> {
    Ok(serde_json::to_value(payload)?)
}

fn invalid(event: EventName, reason: impl fmt::Display) -> ProtocolError {
    ProtocolError::InvalidPayload { event, reason: reason.to_string() }
}

fn first_object(event: EventName, args: &[Value]) -> Result<&Value> {
    match args.first() {
        Some(value @ Value::Object(_)) => Ok(value),
        _ => Err(invalid(event, "expected an object")),
    }
}

fn first<T: DeserializeOwned>(event: EventName, args: &[Value]) -> Result<T> {
    let value = first_object(event, args)?;
    serde_json::from_value(value.clone()).map_err(|e| invalid(event, e))
}

fn string_field(event: EventName, args: &[Value], key: &str) -> Result<String> {
    first_object(event, args)?
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| invalid(event, format!("missing string {key}")))
}

fn int_field(event: EventName, args: &[Value], key: &str) -> Result<i64> {
    first_object(event, args)?
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| invalid(event, format!("missing integer {key}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn names_round_trip() {
        for name in EventName::ALL {
            assert_eq!(EventName::from_wire(name.as_str()), Some(name));
        }
        assert_eq!(EventName::from_wire("nope"), None);
    }

    #[test]
    fn outbound_only_names_are_not_inbound() {
        let err = Inbound::decode("skipCall", &[]).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownEvent("skipCall".into()));
    }

    #[test]
    fn decodes_partner_info() {
        let args = [json!({"data": {
            "roomId": "r1",
            "myInfo": {"id": "me"},
            "partners": [{"id": "p1"}],
            "myLiveKitToken": "tok",
            "eventId": "e1",
        }})];

        let Inbound::PartnerInfo(info) = Inbound::decode("getPartnerInfo", &args).unwrap() else {
            panic!("expected partner info");
        };
        assert_eq!(info.room_id, "r1");
        assert_eq!(info.partners.len(), 1);
        assert_eq!(info.event_id.as_deref(), Some("e1"));
    }

    #[test]
    fn partner_info_without_data_is_invalid() {
        let err = Inbound::decode("getPartnerInfo", &[json!({"roomId": "r1"})]).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload { event: EventName::GetPartnerInfo, .. }));
    }

    #[test]
    fn connected_user_flags_default_false() {
        let event = Inbound::decode("connectedUser", &[json!({"from": "p1"})]).unwrap();
        assert_eq!(
            event,
            Inbound::ConnectedUser(ConnectedUser { from: "p1".into(), cancel: false, is_friends: false })
        );
    }

    #[test]
    fn timer_value_must_be_integer() {
        assert_eq!(
            Inbound::decode("timerUpdate", &[json!({"timerValue": 42})]).unwrap(),
            Inbound::TimerUpdate { timer_value: 42 }
        );
        assert!(Inbound::decode("timerUpdate", &[json!({"timerValue": "42"})]).is_err());
    }

    #[test]
    fn payloadless_events_ignore_args() {
        assert_eq!(Inbound::decode("end", &[json!(1)]).unwrap(), Inbound::End);
        assert_eq!(Inbound::decode("timerEnded", &[]).unwrap(), Inbound::TimerEnded);
    }

    #[test]
    fn ack_expectations() {
        assert!(Outbound::SkipCall.expects_ack());
        assert!(!Outbound::End.expects_ack());
        assert!(Outbound::RemoveUserRequest(UserTarget { to: "x".into() }).expects_ack());
        assert!(!Outbound::ChangeShouldCall(ChangeShouldCall { should_call: true }).expects_ack());
    }
}
