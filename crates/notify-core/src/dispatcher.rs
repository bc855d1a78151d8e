//! Delivery dispatcher.
//!
//! Routes one event to the active sessions of exactly one user:
//! - room path: every member of the user's personal room,
//! - direct path (optional): every session tracked for that user in the
//!   [`DirectIndex`], with `direct = true` on the copy.
//!
//! The two paths usually reach the same sessions, so a session can see the
//! same event twice. That is expected; clients handle it idempotently.
//!
//! Delivery is fire-and-forget. The dispatcher only decides *who* gets
//! *what*; it returns [`Outbound`] routing decisions and never waits on
//! anything. An empty room yields no output.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::hub::Outbound;
use crate::identity::UserId;
use crate::messages::{Notification, NotificationEvent, ServerMessage};
use crate::registry::RoomRegistry;
use crate::room::{Room, SessionId};

/// `UserId -> sessions` index, maintained separately from room membership.
#[derive(Debug, Default)]
pub struct DirectIndex {
    by_user: HashMap<UserId, BTreeSet<SessionId>>,
    by_session: HashMap<SessionId, UserId>,
}

impl DirectIndex {
    pub fn new() -> Self {
        DirectIndex::default()
    }

    /// Track `session` under `user_id`, replacing any previous user it was
    /// tracked under.
    pub fn track(&mut self, session: SessionId, user_id: UserId) {
        self.untrack(session);
        self.by_user.entry(user_id.clone()).or_default().insert(session);
        self.by_session.insert(session, user_id);
    }

    /// Stop tracking `session`.
    pub fn untrack(&mut self, session: SessionId) {
        let Some(previous) = self.by_session.remove(&session) else {
            return;
        };
        let now_empty = match self.by_user.get_mut(&previous) {
            Some(sessions) => {
                sessions.remove(&session);
                sessions.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.by_user.remove(&previous);
        }
    }

    pub fn sessions_of(&self, user_id: &UserId) -> Vec<SessionId> {
        self.by_user
            .get(user_id)
            .map(|sessions| sessions.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_session.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_session.is_empty()
    }
}

/// Emits notifications over the room path and, if enabled, the direct path.
#[derive(Debug)]
pub struct Dispatcher {
    direct: Option<DirectIndex>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher::new(true)
    }
}

impl Dispatcher {
    pub fn new(direct_path: bool) -> Self {
        Dispatcher {
            direct: direct_path.then(DirectIndex::new),
        }
    }

    pub fn direct_path_enabled(&self) -> bool {
        self.direct.is_some()
    }

    /// Record that `session` now belongs to `user_id`. No-op when the direct
    /// path is disabled.
    pub fn track(&mut self, session: SessionId, user_id: UserId) {
        if let Some(index) = self.direct.as_mut() {
            index.track(session, user_id);
        }
    }

    pub fn untrack(&mut self, session: SessionId) {
        if let Some(index) = self.direct.as_mut() {
            index.untrack(session);
        }
    }

    /// Route `event` to `user_id`'s sessions.
    ///
    /// Room-path copies come first, in session order, followed by the
    /// direct-path copies.
    pub fn deliver(
        &self,
        registry: &RoomRegistry,
        user_id: &UserId,
        event: NotificationEvent,
        now: DateTime<Utc>,
    ) -> Vec<Outbound> {
        let room = Room::for_user(user_id);
        let mut outputs = Vec::new();

        for session in registry.members_of(&room) {
            outputs.push(Outbound::new(
                session,
                ServerMessage::Notification(Notification {
                    event: event.clone(),
                    server_ts: now,
                    direct: false,
                }),
            ));
        }

        if let Some(index) = &self.direct {
            for session in index.sessions_of(user_id) {
                outputs.push(Outbound::new(
                    session,
                    ServerMessage::Notification(Notification {
                        event: event.clone(),
                        server_ts: now,
                        direct: true,
                    }),
                ));
            }
        }

        outputs
    }
}
