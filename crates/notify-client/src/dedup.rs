//! Short-window duplicate suppression.
//!
//! Dual-path delivery can hand the same event to a session twice, and events
//! carry no id of their own. Subscribers with visible side effects key on
//! `(kind, content key)` and ignore repeats seen within `window`.

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use notify_core::{EventKind, Notification};

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug)]
pub struct RecentEvents {
    window: Duration,
    capacity: usize,
    /// Insertion-ordered, so the front is always the oldest sighting.
    seen: IndexMap<(EventKind, String), Instant>,
}

impl RecentEvents {
    pub fn new(window: Duration) -> Self {
        RecentEvents {
            window,
            capacity: DEFAULT_CAPACITY,
            seen: IndexMap::new(),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// `true` the first time an event is seen within the window.
    pub fn first_sighting(&mut self, notification: &Notification) -> bool {
        self.first_sighting_at(notification, Instant::now())
    }

    pub fn first_sighting_at(&mut self, notification: &Notification, now: Instant) -> bool {
        self.evict(now);

        let key = (notification.kind(), notification.event.content_key().to_string());
        if self.seen.contains_key(&key) {
            return false;
        }

        self.seen.insert(key, now);
        while self.seen.len() > self.capacity {
            self.seen.shift_remove_index(0);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    fn evict(&mut self, now: Instant) {
        while let Some((_, &seen_at)) = self.seen.first() {
            if now.saturating_duration_since(seen_at) < self.window {
                break;
            }
            self.seen.shift_remove_index(0);
        }
    }
}
