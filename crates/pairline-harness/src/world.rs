//! One simulated user: runtime, driver, server, media and clock.
//!
//! [`SimWorld`] steps the real [`Runtime`] loop deterministically. Tests
//! script the server and media through it and read back the view.

use std::time::Duration;

use pairline_app::{Runtime, RuntimeError, ViewState};
use pairline_client::{Client, ClientConfig, ClientEvent, Credentials};
use serde_json::Value;

use crate::{
    invariants::InvariantRegistry,
    sim_driver::{SimDriver, SimDriverError},
    sim_env::{SimEnv, SimInstant},
    sim_media::SimMedia,
    sim_server::SimServer,
};

/// Cycles allowed per [`SimWorld::settle`] before giving up.
const MAX_SETTLE_CYCLES: usize = 512;

/// Result type for world operations.
pub type WorldResult<T = ()> = Result<T, RuntimeError<SimDriverError>>;

/// A runtime wired to a scripted server and media session.
pub struct SimWorld {
    env: SimEnv,
    runtime: Runtime<SimDriver, SimEnv>,
}

impl SimWorld {
    /// World with a default server and the standard invariants.
    pub fn new() -> Self {
        Self::with_server(SimServer::new())
    }

    /// World over a preconfigured server, with the standard invariants.
    pub fn with_server(server: SimServer) -> Self {
        let env = SimEnv::new();
        let driver = SimDriver::with_server(env.clone(), server)
            .with_invariants(InvariantRegistry::standard());
        let config = ClientConfig { media_url: "wss://media.sim".into(), ..ClientConfig::default() };
        let runtime = Runtime::new(driver, env.clone(), config, Credentials::new("me", "token"));
        Self { env, runtime }
    }

    /// Start the client and run until the channel is up.
    pub async fn boot(&mut self) -> WorldResult {
        self.runtime.start().await?;
        self.settle().await
    }

    /// Run cycles until the driver has nothing left to deliver.
    pub async fn settle(&mut self) -> WorldResult {
        for _ in 0..MAX_SETTLE_CYCLES {
            if !self.runtime.driver().has_pending() {
                return Ok(());
            }
            self.runtime.process_cycle().await?;
        }
        tracing::warn!(cycles = MAX_SETTLE_CYCLES, "world did not settle");
        Ok(())
    }

    /// Run one cycle. Returns `true` if the runtime wants to quit.
    pub async fn step(&mut self) -> WorldResult<bool> {
        self.runtime.process_cycle().await
    }

    /// Advance the clock, fire due timers and settle.
    pub async fn advance(&mut self, by: Duration) -> WorldResult {
        self.env.advance(by);
        self.runtime.process_cycle().await?;
        self.settle().await
    }

    /// Deliver a user or platform event and settle.
    pub async fn send(&mut self, event: ClientEvent<SimInstant>) -> WorldResult {
        self.runtime.handle(event).await?;
        self.settle().await
    }

    /// Queue a server push and settle.
    pub async fn push(&mut self, name: &str, payload: Value) -> WorldResult {
        self.runtime.driver_mut().server_mut().push(name, payload);
        self.settle().await
    }

    /// Queue an argument-less server push and settle.
    pub async fn push_bare(&mut self, name: &str) -> WorldResult {
        self.runtime.driver_mut().server_mut().push_bare(name);
        self.settle().await
    }

    /// Deliver a match and settle.
    pub async fn deliver_match(&mut self, room_id: &str, peers: &[&str], token: &str) -> WorldResult {
        self.runtime.driver_mut().server_mut().deliver_match(room_id, peers, token);
        self.settle().await
    }

    /// Current view.
    pub fn view(&self) -> &ViewState {
        self.runtime.view()
    }

    /// The client.
    pub fn client(&self) -> &Client<SimEnv> {
        self.runtime.client()
    }

    /// Driver.
    pub fn driver(&self) -> &SimDriver {
        self.runtime.driver()
    }

    /// Mutable driver.
    pub fn driver_mut(&mut self) -> &mut SimDriver {
        self.runtime.driver_mut()
    }

    /// Scripted server.
    pub fn server(&self) -> &SimServer {
        self.runtime.driver().server()
    }

    /// Mutable scripted server.
    pub fn server_mut(&mut self) -> &mut SimServer {
        self.runtime.driver_mut().server_mut()
    }

    /// Mutable media session.
    pub fn media_mut(&mut self) -> &mut SimMedia {
        self.runtime.driver_mut().media_mut()
    }

    /// Virtual clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}
