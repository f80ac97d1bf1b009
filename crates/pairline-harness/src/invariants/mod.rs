//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties that must always hold during system execution.
//! Unlike example-based tests that check specific scenarios, invariants
//! verify behavioral properties across all possible execution paths.
//!
//! # Architecture
//!
//! The invariant system extracts observable state from the runtime's
//! [`ViewState`](pairline_app::ViewState) into a [`SessionSnapshot`], then
//! runs registered [`Invariant`] checks against it. The simulation driver
//! checks after every render, so a violation points at the event that
//! caused it.

mod checks;
mod snapshot;

pub use checks::{ConnectBookDisjoint, ConnectedHasPeers, NotificationBound, TimerConsistency};
pub use snapshot::SessionSnapshot;
use thiserror::Error;

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone, Error)]
#[error("{invariant}: {message}")]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

/// An invariant that can be checked against session state.
///
/// Invariants capture WHAT must be true, not specific test scenarios.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against a snapshot.
    fn check(&self, state: &SessionSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the session invariants.
    ///
    /// Includes:
    /// - [`ConnectedHasPeers`]: no call without a peer
    /// - [`TimerConsistency`]: an extended timer has a value
    /// - [`ConnectBookDisjoint`]: a user sits in one connect set at most
    /// - [`NotificationBound`]: the notification queue stays bounded
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(ConnectedHasPeers);
        registry.add(TimerConsistency);
        registry.add(ConnectBookDisjoint);
        registry.add(NotificationBound);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &SessionSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking on the first failure.
    ///
    /// Use this in tests where you want immediate failure with context.
    #[allow(clippy::panic, reason = "Harness assertions fail the test")]
    pub fn assert_all(&self, state: &SessionSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_invariants() {
        let registry = InvariantRegistry::standard();
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn default_snapshot_passes_invariants() {
        let registry = InvariantRegistry::standard();
        assert!(registry.check_all(&SessionSnapshot::default()).is_ok());
    }
}
