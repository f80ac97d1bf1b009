//! Error types for the Pairline core.
//!
//! Channel errors (transport and protocol), ack outcomes, and rejected
//! session transitions. Rejected transitions never mutate state, so a caller
//! that receives [`SessionError`] can keep going with the old state.

use thiserror::Error;

use crate::session::{SessionState, Trigger};

/// Errors from [`crate::EventChannel`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Operation requires an established connection.
    #[error("channel not connected")]
    NotConnected,

    /// Endpoint configuration does not form a valid URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Outbound event could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Underlying transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ChannelError {
    /// Returns true if this error may clear up on its own.
    ///
    /// Disconnection and transport failures are covered by automatic
    /// reconnect. Protocol and configuration errors repeat on every retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NotConnected | Self::Transport(_))
    }
}

impl From<pairline_proto::ProtocolError> for ChannelError {
    fn from(err: pairline_proto::ProtocolError) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<url::ParseError> for ChannelError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

/// Failed acknowledgment.
///
/// Callers treat both variants as "unknown outcome": the server may or may
/// not have applied the request.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckError {
    /// No ack arrived before the deadline, or the channel was torn down.
    #[error("acknowledgment timed out")]
    TimedOut,

    /// The request was never sent because the channel was down.
    #[error("channel not connected")]
    NotConnected,
}

/// Rejected session transition.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The transition table has no edge for this request.
    #[error("invalid transition {from} -> {to} on {trigger:?}")]
    InvalidTransition {
        /// State at the time of the request.
        from: SessionState,
        /// Requested target.
        to: SessionState,
        /// Reason given for the request.
        trigger: Trigger,
    },
}
