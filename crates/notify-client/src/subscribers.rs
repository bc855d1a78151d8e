//! Subscriber registry.
//!
//! Per-event-kind callback lists. Dispatch iterates a snapshot of the list,
//! so a callback may subscribe or unsubscribe (itself or a sibling) while it
//! runs; the change takes effect from the next dispatch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use notify_core::{EventKind, Notification};

pub type Callback = Arc<dyn Fn(&Notification) + Send + Sync>;

#[derive(Clone)]
struct Subscriber {
    id: u64,
    callback: Callback,
}

#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: DashMap<EventKind, Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(SubscriberRegistry::default())
    }

    /// Register `callback` for `kind`. Subscribers of one kind are called in
    /// registration order.
    pub fn subscribe<F>(self: &Arc<Self>, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.entry(kind).or_default().push(Subscriber {
            id,
            callback: Arc::new(callback),
        });

        Subscription {
            registry: Arc::downgrade(self),
            kind,
            id,
        }
    }

    /// Call every subscriber of the notification's kind. Returns how many
    /// were called.
    pub fn dispatch(&self, notification: &Notification) -> usize {
        let snapshot: Vec<Callback> = match self.subscribers.get(&notification.kind()) {
            Some(list) => list.iter().map(|s| s.callback.clone()).collect(),
            None => return 0,
        };

        for callback in &snapshot {
            callback(notification);
        }
        snapshot.len()
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.get(&kind).map(|list| list.len()).unwrap_or(0)
    }

    /// Drop every subscriber of every kind.
    pub fn clear(&self) {
        self.subscribers.clear();
    }

    fn remove(&self, kind: EventKind, id: u64) -> bool {
        let mut removed = false;
        if let Some(mut list) = self.subscribers.get_mut(&kind) {
            let before = list.len();
            list.retain(|s| s.id != id);
            removed = list.len() != before;
        }
        self.subscribers.remove_if(&kind, |_, list| list.is_empty());
        removed
    }
}

/// Capability to remove exactly one callback.
///
/// Dropping it does **not** unsubscribe; call [`unsubscribe`](Self::unsubscribe).
#[derive(Debug, Clone)]
pub struct Subscription {
    registry: Weak<SubscriberRegistry>,
    kind: EventKind,
    id: u64,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Remove this callback. Idempotent; returns `true` only the first time.
    pub fn unsubscribe(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.remove(self.kind, self.id),
            None => false,
        }
    }
}
