//! Engine.IO and Socket.IO text packets.
//!
//! Engine.IO frames every WebSocket text message with a one-character type.
//! Message frames (`4`) carry a Socket.IO packet:
//!
//! ```text
//! <type>[<namespace>,][<ack id>][<json data>]
//! ```
//!
//! Only the root namespace is supported. Binary packets (types `5` and `6`)
//! are rejected because the signaling vocabulary is pure JSON.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ProtocolError, Result};

/// Namespace every packet on this channel belongs to.
pub const ROOT_NAMESPACE: &str = "/";

/// Largest packet text accepted by the decoder (Engine.IO default
/// `maxPayload`).
pub const MAX_PACKET_LEN: usize = 1_000_000;

/// Handshake sent by the server in the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    /// Engine.IO session id.
    pub sid: String,
    /// Transports the server would upgrade to.
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Interval between server pings, in milliseconds.
    pub ping_interval: u64,
    /// Grace period after a missed ping, in milliseconds.
    pub ping_timeout: u64,
    /// Largest payload the server accepts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

impl OpenHandshake {
    /// Time without any server traffic after which the link is dead.
    pub fn liveness_window(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

/// Engine.IO transport packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// Session opened (server to client).
    Open(OpenHandshake),
    /// Transport closing.
    Close,
    /// Keepalive probe (server to client in v4).
    Ping,
    /// Keepalive answer.
    Pong,
    /// Socket.IO payload.
    Message(SocketPacket),
    /// Transport upgrade marker.
    Upgrade,
    /// Filler packet.
    Noop,
}

impl EnginePacket {
    /// Encode to the text frame sent over the WebSocket.
    pub fn encode(&self) -> Result<String> {
        Ok(match self {
            Self::Open(handshake) => format!("0{}", serde_json::to_string(handshake)?),
            Self::Close => "1".to_string(),
            Self::Ping => "2".to_string(),
            Self::Pong => "3".to_string(),
            Self::Message(packet) => format!("4{}", packet.encode()?),
            Self::Upgrade => "5".to_string(),
            Self::Noop => "6".to_string(),
        })
    }

    /// Decode a text frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Empty` for an empty frame
    /// - `ProtocolError::PacketTooLarge` above [`MAX_PACKET_LEN`]
    /// - `ProtocolError::UnknownPacketType` for an unknown leading character
    /// - any [`SocketPacket::decode`] error for message frames
    pub fn decode(text: &str) -> Result<Self> {
        if text.len() > MAX_PACKET_LEN {
            return Err(ProtocolError::PacketTooLarge { size: text.len(), max: MAX_PACKET_LEN });
        }

        let (kind, rest) = split_type(text)?;
        match kind {
            '0' => Ok(Self::Open(serde_json::from_str(rest)?)),
            '1' => Ok(Self::Close),
            // Ping/pong may carry a "probe" suffix during upgrades; it is ignored.
            '2' => Ok(Self::Ping),
            '3' => Ok(Self::Pong),
            '4' => Ok(Self::Message(SocketPacket::decode(rest)?)),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            other => Err(ProtocolError::UnknownPacketType(other)),
        }
    }
}

/// Socket.IO packet on the root namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// Namespace connect request (client) or confirmation (server).
    Connect {
        /// Auth payload (client) or `{sid}` (server).
        data: Option<Value>,
    },
    /// Namespace disconnect.
    Disconnect,
    /// Named event with arguments.
    Event {
        /// Ack id when the sender expects an acknowledgment.
        ack_id: Option<u64>,
        /// Event name.
        name: String,
        /// Event arguments (JSON values after the name).
        args: Vec<Value>,
    },
    /// Acknowledgment of an earlier event.
    Ack {
        /// Id of the acknowledged event.
        ack_id: u64,
        /// Acknowledgment arguments.
        args: Vec<Value>,
    },
    /// Server refused the namespace connect.
    ConnectError {
        /// Reason given by the server.
        message: String,
    },
}

impl SocketPacket {
    /// Encode without the Engine.IO prefix.
    pub fn encode(&self) -> Result<String> {
        Ok(match self {
            Self::Connect { data: None } => "0".to_string(),
            Self::Connect { data: Some(data) } => format!("0{}", serde_json::to_string(data)?),
            Self::Disconnect => "1".to_string(),
            Self::Event { ack_id, name, args } => {
                let mut array = Vec::with_capacity(args.len() + 1);
                array.push(Value::String(name.clone()));
                array.extend(args.iter().cloned());
                let id = ack_id.map(|id| id.to_string()).unwrap_or_default();
                format!("2{id}{}", serde_json::to_string(&array)?)
            },
            Self::Ack { ack_id, args } => format!("3{ack_id}{}", serde_json::to_string(args)?),
            Self::ConnectError { message } => {
                format!("4{}", serde_json::json!({ "message": message }))
            },
        })
    }

    /// Decode the text following an Engine.IO `4` prefix.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::BinaryUnsupported` for binary event/ack packets
    /// - `ProtocolError::UnsupportedNamespace` for any namespace but `/`
    /// - `ProtocolError::InvalidAckId` / `MissingAckId` for bad ack ids
    /// - `ProtocolError::MalformedEvent` / `Json` for bad data
    pub fn decode(text: &str) -> Result<Self> {
        let (kind, rest) = split_type(text)?;
        if matches!(kind, '5' | '6') {
            return Err(ProtocolError::BinaryUnsupported);
        }

        let rest = strip_namespace(rest)?;
        let (ack_id, data) = split_ack_id(rest)?;

        match kind {
            '0' => {
                let data = if data.is_empty() { None } else { Some(serde_json::from_str(data)?) };
                Ok(Self::Connect { data })
            },
            '1' => Ok(Self::Disconnect),
            '2' => {
                let value: Value = serde_json::from_str(data)?;
                let Value::Array(mut items) = value else {
                    return Err(ProtocolError::MalformedEvent("data is not an array".into()));
                };
                if items.is_empty() {
                    return Err(ProtocolError::MalformedEvent("missing event name".into()));
                }
                let Value::String(name) = items.remove(0) else {
                    return Err(ProtocolError::MalformedEvent("event name is not a string".into()));
                };
                Ok(Self::Event { ack_id, name, args: items })
            },
            '3' => {
                let ack_id = ack_id.ok_or(ProtocolError::MissingAckId)?;
                let args = match data {
                    "" => Vec::new(),
                    data => match serde_json::from_str(data)? {
                        Value::Array(items) => items,
                        other => vec![other],
                    },
                };
                Ok(Self::Ack { ack_id, args })
            },
            '4' => {
                let message = match serde_json::from_str::<Value>(data) {
                    Ok(Value::String(message)) => message,
                    Ok(Value::Object(map)) => map
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("connect error")
                        .to_string(),
                    _ => "connect error".to_string(),
                };
                Ok(Self::ConnectError { message })
            },
            other => Err(ProtocolError::UnknownPacketType(other)),
        }
    }
}

fn split_type(text: &str) -> Result<(char, &str)> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(ProtocolError::Empty)?;
    Ok((kind, chars.as_str()))
}

fn strip_namespace(rest: &str) -> Result<&str> {
    if !rest.starts_with('/') {
        return Ok(rest);
    }

    let (namespace, remainder) = match rest.find(',') {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => (rest, ""),
    };

    if namespace != ROOT_NAMESPACE {
        return Err(ProtocolError::UnsupportedNamespace(namespace.to_string()));
    }
    Ok(remainder)
}

fn split_ack_id(rest: &str) -> Result<(Option<u64>, &str)> {
    let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if digits == 0 {
        return Ok((None, rest));
    }

    let id = rest[..digits].parse::<u64>().map_err(|_| ProtocolError::InvalidAckId)?;
    Ok((Some(id), &rest[digits..]))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_open_handshake() {
        let text = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        let packet = EnginePacket::decode(text).unwrap();

        let EnginePacket::Open(handshake) = packet else { panic!("expected open") };
        assert_eq!(handshake.sid, "abc");
        assert_eq!(handshake.liveness_window(), Duration::from_secs(45));
    }

    #[test]
    fn decodes_event_with_ack_id() {
        let packet = EnginePacket::decode(r#"4212["skipCall",{"a":1}]"#).unwrap();

        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Event {
                ack_id: Some(12),
                name: "skipCall".into(),
                args: vec![json!({"a": 1})],
            })
        );
    }

    #[test]
    fn decodes_ack_with_object_args() {
        let packet = EnginePacket::decode(r#"437[{"completionStatus":true}]"#).unwrap();

        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Ack {
                ack_id: 7,
                args: vec![json!({"completionStatus": true})],
            })
        );
    }

    #[test]
    fn root_namespace_prefix_is_accepted() {
        let packet = SocketPacket::decode(r#"2/,["end"]"#).unwrap();
        assert!(matches!(packet, SocketPacket::Event { ref name, .. } if name == "end"));
    }

    #[test]
    fn foreign_namespace_is_rejected() {
        let err = SocketPacket::decode(r#"2/admin,["end"]"#).unwrap_err();
        assert_eq!(err, ProtocolError::UnsupportedNamespace("/admin".into()));
    }

    #[test]
    fn binary_packets_are_rejected() {
        let err = SocketPacket::decode(r#"51-["x",{"_placeholder":true,"num":0}]"#).unwrap_err();
        assert_eq!(err, ProtocolError::BinaryUnsupported);
    }

    #[test]
    fn event_without_name_is_malformed() {
        assert!(matches!(
            SocketPacket::decode("2[]").unwrap_err(),
            ProtocolError::MalformedEvent(_)
        ));
        assert!(matches!(
            SocketPacket::decode("2[42]").unwrap_err(),
            ProtocolError::MalformedEvent(_)
        ));
    }

    #[test]
    fn oversized_ack_id_is_rejected() {
        let err = SocketPacket::decode("399999999999999999999999[]").unwrap_err();
        assert_eq!(err, ProtocolError::InvalidAckId);
    }

    #[test]
    fn connect_error_accepts_string_or_object() {
        assert_eq!(
            SocketPacket::decode(r#"4{"message":"unauthorized"}"#).unwrap(),
            SocketPacket::ConnectError { message: "unauthorized".into() }
        );
        assert_eq!(
            SocketPacket::decode(r#"4"nope""#).unwrap(),
            SocketPacket::ConnectError { message: "nope".into() }
        );
    }

    #[test]
    fn encodes_client_packets() {
        assert_eq!(EnginePacket::Pong.encode().unwrap(), "3");
        assert_eq!(
            EnginePacket::Message(SocketPacket::Connect { data: None }).encode().unwrap(),
            "40"
        );
        assert_eq!(
            EnginePacket::Message(SocketPacket::Event {
                ack_id: Some(3),
                name: "skipCall".into(),
                args: vec![],
            })
            .encode()
            .unwrap(),
            r#"423["skipCall"]"#
        );
    }

    #[test]
    fn empty_text_is_rejected() {
        assert_eq!(EnginePacket::decode("").unwrap_err(), ProtocolError::Empty);
    }
}
