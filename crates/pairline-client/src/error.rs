//! Client errors.

use pairline_core::{ChannelError, SessionError};
use thiserror::Error;

use crate::event::CallKind;

/// Errors returned by [`crate::Client::handle`].
///
/// Only caller mistakes surface here. Server and media failures are turned
/// into notifications and never abort event processing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Signaling channel rejected the operation.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Session machine rejected a transition.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Matching for this kind is not available yet.
    #[error("matching kind {0:?} is not supported")]
    UnsupportedKind(CallKind),

    /// Credentials are missing or incomplete.
    #[error("missing credentials")]
    MissingCredentials,
}
