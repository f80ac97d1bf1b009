//! Protocol error types.

use thiserror::Error;

use crate::EventName;

/// Errors produced while decoding or encoding wire packets and events.
///
/// Every variant describes malformed or unsupported input. None of them are
/// transient: retrying the same bytes yields the same error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Packet text was empty.
    #[error("empty packet")]
    Empty,

    /// Packet exceeds the accepted payload size.
    #[error("packet too large: {size} bytes (max {max})")]
    PacketTooLarge {
        /// Actual size in bytes.
        size: usize,
        /// Maximum accepted size in bytes.
        max: usize,
    },

    /// Leading type character is not a known packet type.
    #[error("unknown packet type {0:?}")]
    UnknownPacketType(char),

    /// Binary event and ack packets are not supported on this channel.
    #[error("binary packets are not supported")]
    BinaryUnsupported,

    /// Packet addressed to a namespace other than `/`.
    #[error("unsupported namespace {0}")]
    UnsupportedNamespace(String),

    /// Ack id digits did not fit in a `u64`.
    #[error("invalid ack id")]
    InvalidAckId,

    /// Ack packet carried no id.
    #[error("ack packet without id")]
    MissingAckId,

    /// Event packet data was not a non-empty array headed by a name.
    #[error("malformed event packet: {0}")]
    MalformedEvent(String),

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(String),

    /// Event name is not part of the inbound vocabulary.
    #[error("unknown inbound event {0}")]
    UnknownEvent(String),

    /// Event payload is missing a field or has the wrong shape.
    #[error("invalid {event} payload: {reason}")]
    InvalidPayload {
        /// Event whose payload failed to decode.
        event: EventName,
        /// Description of the problem.
        reason: String,
    },
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
