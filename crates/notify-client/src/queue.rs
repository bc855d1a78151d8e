//! Client notification queue.
//!
//! Holds events that arrive before the consuming feature is ready and hands
//! them to the [`SubscriberRegistry`] once it is:
//!
//! - not ready: `process` appends to a bounded FIFO buffer
//! - `initialize`: marks ready and drains the buffer in arrival order
//! - ready: `process` dispatches immediately, nothing is buffered
//! - `teardown`: drops subscribers and pending events, back to not ready
//!
//! Buffer policy: at most `max_pending` events (the oldest is dropped to make
//! room) and nothing older than `max_age` is delivered at drain time.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify_core::{EventKind, Notification, UserId};
use tracing::{debug, warn};

use crate::subscribers::{SubscriberRegistry, Subscription};

#[derive(Debug, Clone)]
pub struct QueuePolicy {
    pub max_pending: usize,
    pub max_age: Duration,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        QueuePolicy {
            max_pending: 256,
            max_age: Duration::from_secs(300),
        }
    }
}

/// An event waiting for initialization.
#[derive(Debug, Clone)]
pub struct PendingNotification {
    pub notification: Notification,
    pub enqueued_at: Instant,
}

impl PendingNotification {
    pub fn kind(&self) -> EventKind {
        self.notification.kind()
    }
}

pub struct NotificationQueue {
    subscribers: Arc<SubscriberRegistry>,
    pending: VecDeque<PendingNotification>,
    policy: QueuePolicy,
    user_id: Option<UserId>,
    ready: bool,
    dropped: u64,
}

impl NotificationQueue {
    pub fn new(policy: QueuePolicy) -> Self {
        NotificationQueue {
            subscribers: SubscriberRegistry::new(),
            pending: VecDeque::new(),
            policy,
            user_id: None,
            ready: false,
            dropped: 0,
        }
    }

    pub fn subscribers(&self) -> &Arc<SubscriberRegistry> {
        &self.subscribers
    }

    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(kind, callback)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Events discarded by the buffer policy since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Mark ready for `user_id` and drain the buffer in FIFO order.
    ///
    /// Returns how many buffered events were dispatched.
    pub fn initialize(&mut self, user_id: UserId) -> usize {
        self.expire(Instant::now());
        self.ready = true;
        debug!(user_id = %user_id, pending = self.pending.len(), "notification queue ready");
        self.user_id = Some(user_id);

        let drained: Vec<PendingNotification> = self.pending.drain(..).collect();
        for pending in &drained {
            self.subscribers.dispatch(&pending.notification);
        }
        drained.len()
    }

    /// Dispatch now if ready, otherwise buffer.
    pub fn process(&mut self, notification: Notification) {
        if self.ready {
            self.subscribers.dispatch(&notification);
            return;
        }

        let now = Instant::now();
        self.expire(now);

        if self.policy.max_pending == 0 {
            self.dropped += 1;
            return;
        }
        while self.pending.len() >= self.policy.max_pending {
            if let Some(oldest) = self.pending.pop_front() {
                self.dropped += 1;
                warn!(event = %oldest.kind(), "notification queue full, dropping oldest");
            }
        }

        self.pending.push_back(PendingNotification {
            notification,
            enqueued_at: now,
        });
    }

    /// Forget subscribers, pending events and the bound user.
    pub fn teardown(&mut self) {
        self.subscribers.clear();
        self.pending.clear();
        self.user_id = None;
        self.ready = false;
    }

    fn expire(&mut self, now: Instant) {
        let max_age = self.policy.max_age;
        let before = self.pending.len();
        self.pending
            .retain(|p| now.saturating_duration_since(p.enqueued_at) < max_age);

        let expired = before - self.pending.len();
        if expired > 0 {
            self.dropped += expired as u64;
            warn!(expired, "pending notifications expired before initialization");
        }
    }
}
