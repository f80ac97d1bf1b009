//! WebSocket transport for the client.
//!
//! Provides [`ConnectedTransport`] which carries Engine.IO text frames over a
//! WebSocket. This is a thin layer that only moves strings; protocol logic
//! remains in the Sans-IO [`crate::Client`].

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

/// Buffered frames per direction.
const CHANNEL_CAPACITY: usize = 64;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The transport task is gone.
    #[error("transport closed")]
    Closed,
}

/// Something the transport task observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Text frame from the server.
    Text(String),
    /// The WebSocket is closed. No further events follow.
    Closed {
        /// Why it closed.
        reason: String,
    },
}

/// Handle to an open WebSocket.
///
/// Frames are sent and received via the channels, and an internal task
/// handles the socket I/O.
pub struct ConnectedTransport {
    /// Send text frames to the server.
    pub to_server: mpsc::Sender<String>,
    /// Receive frames and the final close from the server.
    pub from_server: mpsc::Receiver<TransportEvent>,
    /// Abort handle to stop the connection task.
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedTransport {
    /// Queue a text frame.
    pub async fn send(&self, text: String) -> Result<(), TransportError> {
        self.to_server.send(text).await.map_err(|_| TransportError::Closed)
    }

    /// Stop the connection.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for ConnectedTransport {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}

/// Open a WebSocket to `url` (the Engine.IO URL produced by
/// [`pairline_core::Endpoint::url`]).
pub async fn connect(url: &str) -> Result<ConnectedTransport, TransportError> {
    let (stream, response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| TransportError::Connection(e.to_string()))?;
    debug!(status = %response.status(), "websocket open");

    let (to_server_tx, mut to_server_rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
    let (from_server_tx, from_server_rx) = mpsc::channel::<TransportEvent>(CHANNEL_CAPACITY);

    let handle = tokio::spawn(async move {
        let (mut sink, mut source) = stream.split();

        let reason = loop {
            tokio::select! {
                outgoing = to_server_rx.recv() => match outgoing {
                    Some(text) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            break format!("send failed: {e}");
                        }
                    },
                    None => {
                        if let Err(e) = sink.send(Message::Close(None)).await {
                            debug!(%e, "close frame not sent");
                        }
                        break "closed by client".to_string();
                    },
                },
                incoming = source.next() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if from_server_tx.send(TransportEvent::Text(text)).await.is_err() {
                            break "receiver dropped".to_string();
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        break frame.map_or_else(
                            || "closed by server".to_string(),
                            |f| format!("closed by server: {}", f.reason),
                        );
                    },
                    Some(Ok(_)) => {},
                    Some(Err(e)) => break format!("receive failed: {e}"),
                    None => break "stream ended".to_string(),
                },
            }
        };

        warn!(%reason, "websocket closed");
        // Receiver may already be gone during shutdown.
        let _ = from_server_tx.send(TransportEvent::Closed { reason }).await;
    });

    Ok(ConnectedTransport {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    })
}
