//! Deterministic simulation harness for Pairline.
//!
//! Virtual-time implementations of the Environment and Driver traits, plus a
//! scripted signaling server and a fake media session, for reproducible
//! testing of the full runtime loop.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the session
//! invariants; [`SimWorld`] enables them by default.
//!
//! # Chaos
//!
//! [`SimServer::with_chaos`] duplicates and reorders server pushes from a
//! seeded RNG, so a failing seed replays exactly.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod invariants;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_media;
pub mod sim_server;
pub mod world;

pub use invariants::{
    ConnectBookDisjoint, ConnectedHasPeers, Invariant, InvariantRegistry, InvariantResult,
    NotificationBound, SessionSnapshot, TimerConsistency, Violation,
};
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::{SimEnv, SimInstant};
pub use sim_media::SimMedia;
pub use sim_server::{AckPolicy, ReceivedEvent, SimServer};
pub use world::{SimWorld, WorldResult};
