//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide the
//! signaling transport, the media session and the UI sinks, while the generic
//! [`crate::Runtime`] handles all orchestration.

use std::future::Future;

use pairline_client::ClientEvent;
use pairline_core::Timestamp;

use crate::{MediaError, ViewState};

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the probe binary and in simulation.
///
/// # Implementations
///
/// - **Probe**: WebSocket transport, stdin commands, loopback media
/// - **Simulation**: scripted server and media with a virtual clock
///
/// # Event delivery
///
/// Everything the outside world does (transport frames, media state changes,
/// user commands) reaches the runtime through [`Driver::poll_event`] as a
/// [`ClientEvent`]. This is what keeps every mutation on one control context.
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Timestamp;

    /// Poll for the next input event.
    ///
    /// Returns `None` if no events are ready.
    fn poll_event(
        &mut self,
    ) -> impl Future<Output = Result<Option<ClientEvent<Self::Instant>>, Self::Error>> + Send;

    /// Open the signaling transport.
    ///
    /// On success the driver later yields [`ClientEvent::TransportOpened`].
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established. The runtime
    /// reports this to the client as a transport close.
    fn open_transport(&mut self, url: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Send one text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is closed.
    fn transmit(&mut self, text: String) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Close the signaling transport.
    fn close_transport(&mut self);

    /// Start connecting the media session.
    ///
    /// The runtime awaits this inline, so the future must resolve as soon as
    /// the connect has been started, not when the session is up. Media connect
    /// has no upper bound; waiting for it here would stall pings, acks and
    /// user actions. Progress is reported later through [`Driver::poll_event`]
    /// as [`ClientEvent::MediaStateChanged`].
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Connect`] if the session refuses the connect.
    fn connect_media(
        &mut self,
        url: &str,
        token: &str,
        enable_microphone: bool,
    ) -> impl Future<Output = Result<(), MediaError>> + Send;

    /// Disconnect the media session.
    fn disconnect_media(&mut self) -> impl Future<Output = ()> + Send;

    /// Turn the local camera on.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::Camera`] if the camera cannot be enabled.
    fn enable_camera(&mut self) -> impl Future<Output = Result<(), MediaError>> + Send;

    /// Start or stop the waiting sound.
    fn set_waiting_audio(&mut self, playing: bool);

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the view.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, view: &ViewState) -> Result<(), Self::Error>;

    /// Stop all I/O and clean up resources.
    fn stop(&mut self);
}
