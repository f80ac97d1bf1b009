//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`Client`]: matching state machine
//! - [`ViewState`]: what the frontend renders
//! - [`Driver`]: Platform-specific I/O
//!
//! The runtime is the single control context: it is the only caller of
//! [`Client::handle`], and I/O results re-enter the client as events.

use std::collections::VecDeque;

use pairline_client::{
    Client, ClientAction, ClientConfig, ClientEvent, Credentials, Environment, Notification,
    NotificationLevel,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{Driver, MediaError, RuntimeError, ViewState};

/// Generic runtime that orchestrates Client, ViewState and Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment supplying the client's clock
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    client: Client<E>,
    view: ViewState,
    updates: watch::Sender<ViewState>,
}

impl<D, E> Runtime<D, E>
where
    D: Driver<Instant = E::Instant>,
    E: Environment,
{
    /// Create a new runtime with the given driver and environment.
    pub fn new(driver: D, env: E, config: ClientConfig, credentials: Credentials) -> Self {
        let (updates, _) = watch::channel(ViewState::default());
        Self {
            driver,
            client: Client::new(env, config, credentials),
            view: ViewState::default(),
            updates,
        }
    }

    /// Run the main event loop until the driver yields
    /// [`ClientEvent::Shutdown`].
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot start or the driver fails to
    /// poll or render.
    pub async fn run(mut self) -> Result<(), RuntimeError<D::Error>> {
        self.driver.render(&self.view).map_err(RuntimeError::Driver)?;
        self.start().await?;

        loop {
            let should_quit = self.process_cycle().await?;
            if should_quit {
                break;
            }
        }

        self.driver.stop();
        Ok(())
    }

    /// Open the signaling channel.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Client`] for missing credentials or a bad
    /// endpoint.
    pub async fn start(&mut self) -> Result<(), RuntimeError<D::Error>> {
        let actions = self.client.handle(ClientEvent::Start)?;
        let mut pending = VecDeque::new();
        for action in actions {
            self.execute(action, &mut pending).await;
        }
        self.publish()?;
        self.drain(pending).await
    }

    /// Process one cycle of the event loop.
    ///
    /// Handles at most one driver event; when none is ready, fires the
    /// client's timers if due. Returns `true` if the application should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to poll or render.
    pub async fn process_cycle(&mut self) -> Result<bool, RuntimeError<D::Error>> {
        let event = self.driver.poll_event().await.map_err(RuntimeError::Driver)?;
        if let Some(event) = event {
            let quit = matches!(event, ClientEvent::Shutdown);
            self.handle(event).await?;
            return Ok(quit);
        }

        let now = self.driver.now();
        if self.client.next_deadline().is_some_and(|deadline| deadline <= now) {
            self.handle(ClientEvent::Tick { now }).await?;
        }
        Ok(false)
    }

    /// Feed one event to the client and execute everything it causes.
    ///
    /// Rejected events are logged and surfaced as an error notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to render.
    pub async fn handle(
        &mut self,
        event: ClientEvent<E::Instant>,
    ) -> Result<(), RuntimeError<D::Error>> {
        self.drain(VecDeque::from([event])).await
    }

    async fn drain(
        &mut self,
        mut pending: VecDeque<ClientEvent<E::Instant>>,
    ) -> Result<(), RuntimeError<D::Error>> {
        while let Some(event) = pending.pop_front() {
            match self.client.handle(event) {
                Ok(actions) => {
                    for action in actions {
                        self.execute(action, &mut pending).await;
                    }
                },
                Err(err) => {
                    warn!(%err, "event rejected");
                    self.view.apply(&ClientAction::Notify(
                        Notification::new(NotificationLevel::Error, "Request failed")
                            .with_message(err.to_string()),
                    ));
                },
            }
            self.publish()?;
        }
        Ok(())
    }

    /// Execute one action. I/O failures are queued back as client events.
    async fn execute(
        &mut self,
        action: ClientAction,
        pending: &mut VecDeque<ClientEvent<E::Instant>>,
    ) {
        self.view.apply(&action);

        match action {
            ClientAction::OpenTransport { url } => {
                if let Err(e) = self.driver.open_transport(&url).await {
                    warn!(%e, "transport open failed");
                    pending.push_back(ClientEvent::TransportClosed { reason: e.to_string() });
                }
            },
            ClientAction::Transmit(text) => {
                if let Err(e) = self.driver.transmit(text).await {
                    warn!(%e, "transmit failed");
                    pending.push_back(ClientEvent::TransportClosed { reason: e.to_string() });
                }
            },
            ClientAction::CloseTransport => self.driver.close_transport(),
            ClientAction::ConnectMedia { url, token, enable_microphone } => {
                if let Err(MediaError::Connect(reason) | MediaError::Camera(reason)) =
                    self.driver.connect_media(&url, &token, enable_microphone).await
                {
                    pending.push_back(ClientEvent::MediaConnectFailed { reason });
                }
            },
            ClientAction::DisconnectMedia => self.driver.disconnect_media().await,
            ClientAction::EnableCamera => {
                if let Err(MediaError::Connect(reason) | MediaError::Camera(reason)) =
                    self.driver.enable_camera().await
                {
                    pending.push_back(ClientEvent::CameraFailed { reason });
                }
            },
            ClientAction::PlayWaitingAudio => self.driver.set_waiting_audio(true),
            ClientAction::StopAudio => self.driver.set_waiting_audio(false),
            ClientAction::StateChanged { from, to } => debug!(?from, ?to, "session state"),
            ClientAction::FriendAdded { user_id } => info!(%user_id, "friend added"),
            ClientAction::Notify(_)
            | ClientAction::DismissNotification
            | ClientAction::RequestCompleted { .. }
            | ClientAction::ChannelStatus { .. } => {},
        }
    }

    /// Refresh the view; render and notify observers if it changed.
    fn publish(&mut self) -> Result<(), RuntimeError<D::Error>> {
        self.view.sync(&self.client);
        let changed = *self.updates.borrow() != self.view;
        if changed {
            self.driver.render(&self.view).map_err(RuntimeError::Driver)?;
            self.updates.send_replace(self.view.clone());
        }
        Ok(())
    }

    /// Observe view updates.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.updates.subscribe()
    }

    /// Current view.
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// The client.
    pub fn client(&self) -> &Client<E> {
        &self.client
    }

    /// The driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable driver, for scripting in tests.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
