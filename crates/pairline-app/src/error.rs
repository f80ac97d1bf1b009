//! Runtime error types.

use pairline_client::ClientError;
use thiserror::Error;

/// Failure reported by a media session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    /// The session could not connect to the room.
    #[error("media connect failed: {0}")]
    Connect(String),

    /// The local camera could not be enabled.
    #[error("camera failed: {0}")]
    Camera(String),
}

/// Errors that stop the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError<E: std::error::Error + 'static> {
    /// The driver failed to poll or render.
    #[error("driver error: {0}")]
    Driver(#[source] E),

    /// The client could not start.
    #[error(transparent)]
    Client(#[from] ClientError),
}
