//! Probe driver.
//!
//! Implements [`Driver`] over a real WebSocket, stdin commands and the
//! loopback media session. Rendering goes to the log: one status line
//! whenever the session summary changes, plus each new notification.

use std::{
    collections::VecDeque,
    io,
    time::{Duration, Instant},
};

use pairline_app::{Driver, MediaError, ViewState};
use pairline_client::{
    ClientEvent, Environment, Notification,
    transport::{self, ConnectedTransport, TransportError, TransportEvent},
};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use crate::{
    command::{self, Command, HELP},
    media::LoopbackMedia,
    render::{notification_line, status_line},
    system_env::SystemEnv,
};

/// How long one poll waits for input before letting the runtime tick.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Probe driver errors.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Reading stdin failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// WebSocket error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame sent with no transport open.
    #[error("transport not open")]
    NotConnected,
}

/// What one poll produced.
enum Input {
    Transport(TransportEvent),
    Line(Option<String>),
    Idle,
}

/// Driver for the command-line probe.
pub struct ProbeDriver {
    env: SystemEnv,
    transport: Option<ConnectedTransport>,
    stdin: Lines<BufReader<Stdin>>,
    stdin_open: bool,
    media: LoopbackMedia,
    pending: VecDeque<ClientEvent<Instant>>,
    waiting_audio: bool,
    last_status: String,
    last_notification: Option<Notification>,
}

impl ProbeDriver {
    /// Driver reading commands from stdin.
    pub fn new(env: SystemEnv) -> Self {
        Self {
            env,
            transport: None,
            stdin: BufReader::new(tokio::io::stdin()).lines(),
            stdin_open: true,
            media: LoopbackMedia::new(),
            pending: VecDeque::new(),
            waiting_audio: false,
            last_status: String::new(),
            last_notification: None,
        }
    }

    fn on_transport(&mut self, event: TransportEvent) -> ClientEvent<Instant> {
        match event {
            TransportEvent::Text(text) => ClientEvent::TransportText(text),
            TransportEvent::Closed { reason } => {
                self.transport = None;
                ClientEvent::TransportClosed { reason }
            },
        }
    }

    fn on_line(&mut self, line: Option<String>) -> Option<ClientEvent<Instant>> {
        let Some(line) = line else {
            info!("stdin closed, shutting down");
            self.stdin_open = false;
            return Some(ClientEvent::Shutdown);
        };

        match command::parse(&line) {
            Ok(Some(Command::Event(event))) => Some(event),
            Ok(Some(Command::Help)) => {
                info!("{HELP}");
                None
            },
            Ok(None) => None,
            Err(err) => {
                warn!(%err, "{HELP}");
                None
            },
        }
    }
}

async fn next_transport_event(transport: &mut Option<ConnectedTransport>) -> TransportEvent {
    match transport {
        Some(transport) => transport
            .from_server
            .recv()
            .await
            .unwrap_or_else(|| TransportEvent::Closed { reason: "transport task ended".into() }),
        None => std::future::pending().await,
    }
}

async fn next_line(stdin: &mut Lines<BufReader<Stdin>>, open: bool) -> io::Result<Option<String>> {
    if open { stdin.next_line().await } else { std::future::pending().await }
}

impl Driver for ProbeDriver {
    type Error = ProbeError;
    type Instant = Instant;

    async fn poll_event(&mut self) -> Result<Option<ClientEvent<Instant>>, Self::Error> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(Some(event));
        }

        let input = tokio::select! {
            biased;

            event = next_transport_event(&mut self.transport) => Input::Transport(event),
            line = next_line(&mut self.stdin, self.stdin_open) => Input::Line(line?),
            () = self.env.sleep(POLL_INTERVAL) => Input::Idle,
        };

        Ok(match input {
            Input::Transport(event) => Some(self.on_transport(event)),
            Input::Line(line) => self.on_line(line),
            Input::Idle => None,
        })
    }

    async fn open_transport(&mut self, url: &str) -> Result<(), Self::Error> {
        if let Some(old) = self.transport.take() {
            old.stop();
        }

        let transport = transport::connect(url).await?;
        info!(%url, "signaling transport open");
        self.transport = Some(transport);
        self.pending.push_back(ClientEvent::TransportOpened);
        Ok(())
    }

    async fn transmit(&mut self, text: String) -> Result<(), Self::Error> {
        let transport = self.transport.as_ref().ok_or(ProbeError::NotConnected)?;
        Ok(transport.send(text).await?)
    }

    fn close_transport(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.stop();
        }
    }

    async fn connect_media(
        &mut self,
        url: &str,
        token: &str,
        enable_microphone: bool,
    ) -> Result<(), MediaError> {
        let states = self.media.connect(url, token, enable_microphone)?;
        self.pending.extend(states.into_iter().map(ClientEvent::MediaStateChanged));
        Ok(())
    }

    async fn disconnect_media(&mut self) {
        let states = self.media.disconnect();
        self.pending.extend(states.into_iter().map(ClientEvent::MediaStateChanged));
    }

    async fn enable_camera(&mut self) -> Result<(), MediaError> {
        self.media.enable_camera()
    }

    fn set_waiting_audio(&mut self, playing: bool) {
        if self.waiting_audio != playing {
            self.waiting_audio = playing;
            info!(playing, "waiting sound");
        }
    }

    fn now(&self) -> Instant {
        self.env.now()
    }

    fn render(&mut self, view: &ViewState) -> Result<(), Self::Error> {
        let status = status_line(view);
        if status != self.last_status {
            info!("{status}");
            self.last_status = status;
        }

        let latest = view.latest_notification();
        if latest != self.last_notification.as_ref() {
            if let Some(notification) = latest {
                info!("{}", notification_line(notification));
            }
            self.last_notification = latest.cloned();
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.close_transport();
        self.media.disconnect();
    }
}
