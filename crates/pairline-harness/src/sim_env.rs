//! Virtual clock for simulation.
//!
//! [`SimEnv`] starts at [`SimInstant::ZERO`] and only moves when a test
//! advances it, so reconnect backoff, ack deadlines and keepalive expiry are
//! reproducible without sleeping.

#![allow(clippy::disallowed_types, reason = "Synchronous locking of the virtual clock only")]

use std::{
    ops::{Add, Sub},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use pairline_core::Environment;

/// Point on the virtual timeline, measured from simulation start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Simulation start.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Time since simulation start.
    pub fn since_start(self) -> Duration {
        self.0
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs))
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// Shared virtual clock.
///
/// Clones observe the same timeline.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    now: Arc<Mutex<SimInstant>>,
}

impl SimEnv {
    /// Clock at [`SimInstant::ZERO`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = *now + by;
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }
}
