//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the probe's WebSocket driver
//! but for deterministic testing. It implements [`Driver`] so the same
//! [`pairline_app::Runtime`] orchestration code runs in both production and
//! simulation.

use std::collections::VecDeque;

use pairline_app::{Driver, MediaError, ViewState};
use pairline_client::{ClientEvent, MediaState};
use pairline_core::Environment;
use thiserror::Error;

use crate::{
    invariants::{InvariantRegistry, SessionSnapshot},
    sim_env::{SimEnv, SimInstant},
    sim_media::SimMedia,
    sim_server::SimServer,
};

/// Error type for simulation driver.
#[derive(Debug, Clone, Error)]
#[error("sim driver: {0}")]
pub struct SimDriverError(pub String);

/// Simulation driver for deterministic testing.
///
/// Owns the scripted server and media session. Events are delivered in a
/// fixed order: locally queued events first, then one server frame.
pub struct SimDriver {
    env: SimEnv,
    server: SimServer,
    media: SimMedia,
    pending: VecDeque<ClientEvent<SimInstant>>,
    transport_open: bool,
    waiting_audio: bool,
    renders: usize,
    last_view: Option<ViewState>,
    invariants: Option<InvariantRegistry>,
}

impl SimDriver {
    /// Create a driver over a fresh server and media session.
    pub fn new(env: SimEnv) -> Self {
        Self::with_server(env, SimServer::new())
    }

    /// Create a driver over a preconfigured server.
    pub fn with_server(env: SimEnv, server: SimServer) -> Self {
        Self {
            env,
            server,
            media: SimMedia::new(),
            pending: VecDeque::new(),
            transport_open: false,
            waiting_audio: false,
            renders: 0,
            last_view: None,
            invariants: None,
        }
    }

    /// Enable invariant checking on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Inject an event for processing.
    pub fn inject(&mut self, event: ClientEvent<SimInstant>) {
        self.pending.push_back(event);
    }

    /// Check if there are events or frames waiting.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || (self.transport_open && self.server.queued() > 0)
    }

    /// Kill the signaling transport from the network side.
    pub fn sever_transport(&mut self) {
        if self.transport_open {
            self.transport_open = false;
            self.server.disconnect();
            self.pending.push_back(ClientEvent::TransportClosed { reason: "connection reset".into() });
        }
    }

    /// Finish a held media connect.
    pub fn complete_media_connect(&mut self) {
        let states = self.media.complete_connect();
        self.report_media(states);
    }

    /// Media network blip.
    pub fn blip_media(&mut self) {
        let states = self.media.blip();
        self.report_media(states);
    }

    /// Media recovers from a blip.
    pub fn recover_media(&mut self) {
        let states = self.media.recover();
        self.report_media(states);
    }

    /// Media link lost for good.
    pub fn lose_media(&mut self) {
        let states = self.media.lose();
        self.report_media(states);
    }

    fn report_media(&mut self, states: Vec<MediaState>) {
        self.pending.extend(states.into_iter().map(ClientEvent::MediaStateChanged));
    }

    /// Scripted server.
    pub fn server(&self) -> &SimServer {
        &self.server
    }

    /// Mutable scripted server.
    pub fn server_mut(&mut self) -> &mut SimServer {
        &mut self.server
    }

    /// Media session.
    pub fn media(&self) -> &SimMedia {
        &self.media
    }

    /// Mutable media session.
    pub fn media_mut(&mut self) -> &mut SimMedia {
        &mut self.media
    }

    /// Whether the transport is open.
    pub fn transport_open(&self) -> bool {
        self.transport_open
    }

    /// Whether the waiting sound is playing.
    pub fn waiting_audio(&self) -> bool {
        self.waiting_audio
    }

    /// Renders so far.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Last rendered view.
    pub fn last_view(&self) -> Option<&ViewState> {
        self.last_view.as_ref()
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Instant = SimInstant;

    async fn poll_event(&mut self) -> Result<Option<ClientEvent<SimInstant>>, Self::Error> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }
        if self.transport_open
            && let Some(text) = self.server.next_frame()
        {
            return Ok(Some(ClientEvent::TransportText(text)));
        }
        Ok(None)
    }

    async fn open_transport(&mut self, url: &str) -> Result<(), Self::Error> {
        if !self.server.is_reachable() {
            return Err(SimDriverError(format!("{url} unreachable")));
        }
        self.transport_open = true;
        self.server.accept();
        self.pending.push_back(ClientEvent::TransportOpened);
        Ok(())
    }

    async fn transmit(&mut self, text: String) -> Result<(), Self::Error> {
        if !self.transport_open {
            return Err(SimDriverError("transport closed".into()));
        }
        self.server.receive(&text);
        Ok(())
    }

    fn close_transport(&mut self) {
        self.transport_open = false;
        self.server.disconnect();
    }

    async fn connect_media(
        &mut self,
        _url: &str,
        token: &str,
        enable_microphone: bool,
    ) -> Result<(), MediaError> {
        let states = self.media.connect(token, enable_microphone)?;
        self.report_media(states);
        Ok(())
    }

    async fn disconnect_media(&mut self) {
        let states = self.media.disconnect();
        self.report_media(states);
    }

    async fn enable_camera(&mut self) -> Result<(), MediaError> {
        self.media.enable_camera()
    }

    fn set_waiting_audio(&mut self, playing: bool) {
        self.waiting_audio = playing;
    }

    fn now(&self) -> SimInstant {
        self.env.now()
    }

    fn render(&mut self, view: &ViewState) -> Result<(), Self::Error> {
        self.renders += 1;
        if let Some(registry) = &self.invariants {
            let context = format!("after render {} at {:?}", self.renders, self.env.now());
            registry.assert_all(&SessionSnapshot::from_view(view), &context);
        }
        self.last_view = Some(view.clone());
        Ok(())
    }

    fn stop(&mut self) {
        self.close_transport();
    }
}
