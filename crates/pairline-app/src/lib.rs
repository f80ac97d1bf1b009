//! Application layer for Pairline
//!
//! Generic runtime that owns the matching client on a single control context,
//! enabling deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver
//! - [`ViewState`]: Observable projection of the client for rendering

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod driver;
mod error;
mod runtime;
mod state;

pub use driver::Driver;
pub use error::{MediaError, RuntimeError};
pub use runtime::Runtime;
pub use state::{MAX_NOTIFICATIONS, ViewState};
