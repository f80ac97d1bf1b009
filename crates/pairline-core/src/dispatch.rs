//! Typed inbound event fan-out.
//!
//! Any number of subscribers may listen to the same [`EventName`], and
//! wildcard subscribers see every event. Handlers run in subscription order
//! on the caller's context, so they observe events in arrival order.

use std::{collections::HashMap, fmt};

use pairline_proto::{EventName, Inbound};

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Subscriber callback.
pub type Handler = Box<dyn FnMut(&Inbound) + Send>;

/// Multi-subscriber registry.
#[derive(Default)]
pub struct Dispatcher {
    next_id: u64,
    by_name: HashMap<EventName, Vec<(SubscriptionId, Handler)>>,
    wildcard: Vec<(SubscriptionId, Handler)>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("named", &self.by_name.values().map(Vec::len).sum::<usize>())
            .field("wildcard", &self.wildcard.len())
            .finish()
    }
}

impl Dispatcher {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> SubscriptionId {
        self.next_id += 1;
        SubscriptionId(self.next_id)
    }

    /// Subscribe to one event name.
    pub fn subscribe(
        &mut self,
        name: EventName,
        handler: impl FnMut(&Inbound) + Send + 'static,
    ) -> SubscriptionId {
        let id = self.allocate();
        self.by_name.entry(name).or_default().push((id, Box::new(handler)));
        id
    }

    /// Subscribe to every inbound event.
    pub fn subscribe_all(&mut self, handler: impl FnMut(&Inbound) + Send + 'static) -> SubscriptionId {
        let id = self.allocate();
        self.wildcard.push((id, Box::new(handler)));
        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.len();
        self.wildcard.retain(|(sub, _)| *sub != id);
        for handlers in self.by_name.values_mut() {
            handlers.retain(|(sub, _)| *sub != id);
        }
        self.by_name.retain(|_, handlers| !handlers.is_empty());
        self.len() != before
    }

    /// Deliver an event. Named subscribers run before wildcard ones.
    /// Returns the number of handlers invoked.
    pub fn dispatch(&mut self, event: &Inbound) -> usize {
        let mut delivered = 0;
        if let Some(handlers) = self.by_name.get_mut(&event.name()) {
            for (_, handler) in handlers.iter_mut() {
                handler(event);
                delivered += 1;
            }
        }
        for (_, handler) in &mut self.wildcard {
            handler(event);
            delivered += 1;
        }
        delivered
    }

    /// Drop every subscription.
    pub fn clear(&mut self) {
        self.by_name.clear();
        self.wildcard.clear();
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.wildcard.len() + self.by_name.values().map(Vec::len).sum::<usize>()
    }

    /// No live subscriptions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
