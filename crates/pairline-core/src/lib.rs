//! Pairline core.
//!
//! Pure state machines for the call lifecycle and the signaling channel.
//! Nothing in this crate performs I/O: every operation takes the current
//! time as a parameter and returns actions for a driver to execute.
//!
//! - [`SessionMachine`]: guarded transitions over [`SessionState`]
//! - [`EventChannel`]: one Socket.IO connection with reconnect backoff,
//!   keepalive and ack deadlines
//! - [`Dispatcher`]: typed, multi-subscriber inbound event fan-out
//! - [`Environment`]: time abstraction shared by runtime and simulation

#![forbid(unsafe_code)]

pub mod channel;
pub mod config;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod session;

pub use channel::{AckId, ChannelAction, ChannelState, EventChannel};
pub use config::{ChannelConfig, Credentials, Endpoint};
pub use dispatch::{Dispatcher, SubscriptionId};
pub use env::{Environment, Timestamp};
pub use error::{AckError, ChannelError, SessionError};
pub use session::{SessionMachine, SessionState, Transition, Trigger};
