//! Client
//!
//! Action-based matching client. Pairs a user with strangers for video calls
//! by coordinating the signaling channel with an external media session.
//!
//! # Architecture
//!
//! The client follows the same Sans-IO and action-based patterns as
//! [`pairline_core`]. It receives events ([`ClientEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ClientAction`])
//! for the caller to execute.
//!
//! # Components
//!
//! - [`Client`]: Top-level state machine and single control context
//! - [`MatchCoordinator`]: Session state, call data and server requests
//! - [`MediaBridge`]: Keeps the media session consistent with signaling
//! - [`PresenceTracker`]: Online users and connect requests
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::ConnectedTransport`]: WebSocket text transport
//! - [`transport::connect`]: Open a WebSocket to the signaling server

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod config;
mod coordinator;
mod error;
mod event;
mod media;
mod presence;
mod session_data;

#[cfg(feature = "transport")]
pub mod transport;

pub use client::Client;
pub use config::{ClientConfig, DEFAULT_MEET_TIME_SECS};
pub use coordinator::MatchCoordinator;
pub use error::ClientError;
pub use event::{
    CallKind, ClientAction, ClientEvent, MediaState, Notification, NotificationLevel, Request, Tab,
};
pub use media::MediaBridge;
pub use pairline_core::{
    ChannelConfig, Credentials, Endpoint, Environment, SessionState,
};
pub use presence::{ConnectRequests, PresenceTracker};
pub use session_data::{SessionData, TIMER_UNSET};
