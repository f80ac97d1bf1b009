//! Pairline wire protocol.
//!
//! The signaling server speaks Socket.IO v5 over Engine.IO v4 text frames.
//! This crate owns both layers of that encoding plus the typed event
//! vocabulary carried on top of it. It performs no I/O.
//!
//! # Layers
//!
//! - [`EnginePacket`]: transport framing (open handshake, ping/pong, message)
//! - [`SocketPacket`]: namespace-level packets (connect, event, ack)
//! - [`Outbound`] / [`Inbound`]: typed events with the exact JSON keys the
//!   server expects
//!
//! # Invariants
//!
//! Decoding never panics. Malformed input of any shape is reported as a
//! [`ProtocolError`] so the channel can drop it without mutating state.

#![forbid(unsafe_code)]

pub mod errors;
pub mod events;
pub mod packet;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use events::{EventName, Inbound, Outbound};
pub use packet::{EnginePacket, MAX_PACKET_LEN, OpenHandshake, SocketPacket};
pub use payloads::{
    AckPayload, AckReply, ChangeShouldCall, ChangeUserOnline, ConnectedUser, ExtendTimer,
    JoinedVideo, PresenceStatus, PresenceUpdate, Profile, RoomCreated, RoomInfo, Roster,
    ServerError, ServerNotification, StartMatching, UserPresence, UserTarget,
};
