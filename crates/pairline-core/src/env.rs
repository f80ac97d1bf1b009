//! Environment abstraction for deterministic testing.
//!
//! Decouples protocol logic from the system clock. Production drivers use
//! `std::time::Instant`; the simulation harness supplies a virtual clock so
//! reconnect backoff and ack timeouts can be exercised without sleeping.

use std::{
    fmt::Debug,
    ops::{Add, Sub},
    time::Duration,
};

/// Point in time usable by the state machines.
///
/// Blanket-implemented for any type with the required arithmetic, which
/// includes `std::time::Instant`.
pub trait Timestamp:
    Copy + Ord + Debug + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = Self>
{
}

impl<T> Timestamp for T where
    T: Copy + Ord + Debug + Send + Sync + Sub<Output = Duration> + Add<Duration, Output = Self>
{
}

/// Abstract environment providing time and async sleeping.
///
/// # Invariants
///
/// - `now()` never goes backwards
pub trait Environment: Clone + Send + Sync + 'static {
    /// Instant type used by this environment.
    type Instant: Timestamp;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code awaits this. State machines receive time as a
    /// parameter instead.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// Test environments.
pub mod test_utils {
    #![allow(clippy::disallowed_types, reason = "Synchronous locking of the mock clock only")]

    use std::{
        sync::{Arc, Mutex},
        time::{Duration, Instant},
    };

    use super::Environment;

    /// Manually advanced clock over `std::time::Instant`.
    ///
    /// `sleep` advances the clock instead of waiting, so code under test sees
    /// time pass without real delays.
    #[derive(Debug, Clone)]
    pub struct MockEnv {
        base: Instant,
        offset: Arc<Mutex<Duration>>,
    }

    impl MockEnv {
        /// Clock starting at the current instant.
        pub fn new() -> Self {
            Self { base: Instant::now(), offset: Arc::new(Mutex::new(Duration::ZERO)) }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            if let Ok(mut offset) = self.offset.lock() {
                *offset += by;
            }
        }

        fn offset(&self) -> Duration {
            self.offset.lock().map(|o| *o).unwrap_or_default()
        }
    }

    impl Default for MockEnv {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Environment for MockEnv {
        type Instant = Instant;

        fn now(&self) -> Instant {
            self.base + self.offset()
        }

        fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            self.advance(duration);
            std::future::ready(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn advance_moves_now() {
            let env = MockEnv::new();
            let start = env.now();
            env.advance(Duration::from_secs(3));
            assert_eq!(env.now() - start, Duration::from_secs(3));
        }
    }
}
