//! Room registry.
//!
//! Maintains the bidirectional mapping between rooms and sessions, and the
//! single current [`Identity`] of each session.
//!
//! Rooms are implicit: a room exists exactly while at least one session is a
//! member. Empty rooms are removed as soon as their last member leaves.
//!
//! The registry is plain single-owner state (`&mut self` for every
//! mutation). Whoever hosts it must serialize access; the server does that
//! by giving it to exactly one task.

use std::collections::{BTreeSet, HashMap};

use crate::identity::Identity;
use crate::room::{Room, SessionId, TransportState};

#[derive(Debug, Default)]
struct SessionEntry {
    identity: Option<Identity>,
    rooms: BTreeSet<Room>,
}

/// Room -> sessions membership table plus per-session identity binding.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Room -> member sessions. Never holds an empty set.
    rooms: HashMap<Room, BTreeSet<SessionId>>,

    /// Open session -> identity and reverse room index.
    sessions: HashMap<SessionId, SessionEntry>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        RoomRegistry::default()
    }

    /// Register a freshly opened session. It starts with no identity and
    /// no rooms. Returns `false` if the session was already registered.
    pub fn register(&mut self, session: SessionId) -> bool {
        if self.sessions.contains_key(&session) {
            return false;
        }
        self.sessions.insert(session, SessionEntry::default());
        true
    }

    /// Add `session` to `room`.
    ///
    /// Idempotent. Returns `false` (and changes nothing) when the session is
    /// not registered, or when the room does not match the session's bound
    /// identity: an unannounced session may only join [`Room::Global`], and
    /// role/user rooms must match the announced role/user.
    pub fn join(&mut self, session: SessionId, room: Room) -> bool {
        let Some(entry) = self.sessions.get_mut(&session) else {
            return false;
        };

        let allowed = match (&room, &entry.identity) {
            (Room::Global, _) => true,
            (Room::Role(role), Some(identity)) => identity.role == *role,
            (Room::User(user_id), Some(identity)) => identity.user_id == *user_id,
            (_, None) => false,
        };
        if !allowed {
            return false;
        }

        entry.rooms.insert(room.clone());
        self.rooms.entry(room).or_default().insert(session);
        true
    }

    /// Remove `session` from every room it belongs to.
    ///
    /// Returns the rooms it left. The identity binding is kept.
    pub fn leave_all(&mut self, session: SessionId) -> Vec<Room> {
        let Some(entry) = self.sessions.get_mut(&session) else {
            return Vec::new();
        };

        let left = std::mem::take(&mut entry.rooms);
        for room in &left {
            self.remove_member(room, session);
        }
        left.into_iter().collect()
    }

    /// Bind `identity` to `session` and re-derive its rooms from scratch.
    ///
    /// Runs [`leave_all`](Self::leave_all) first, replaces the identity (never
    /// merges), then joins the global room, the role room and the per-user
    /// room. Returns the resulting room set, or `None` if the session is not
    /// registered.
    pub fn announce(&mut self, session: SessionId, identity: Identity) -> Option<Vec<Room>> {
        if !self.sessions.contains_key(&session) {
            return None;
        }

        self.leave_all(session);

        let rooms = [
            Room::Global,
            Room::Role(identity.role),
            Room::for_user(&identity.user_id),
        ];

        if let Some(entry) = self.sessions.get_mut(&session) {
            entry.identity = Some(identity);
        }

        for room in rooms {
            self.join(session, room);
        }

        Some(self.rooms_of(session))
    }

    /// Current members of `room`, in session id order.
    ///
    /// Reads the live table, so sessions removed by
    /// [`on_disconnect`](Self::on_disconnect) are never returned.
    pub fn members_of(&self, room: &Room) -> Vec<SessionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Destroy `session`: remove it from all rooms and discard its identity.
    ///
    /// Returns the identity it was bound to, if any.
    pub fn on_disconnect(&mut self, session: SessionId) -> Option<Identity> {
        self.leave_all(session);
        self.sessions.remove(&session).and_then(|entry| entry.identity)
    }

    /// Rooms `session` currently belongs to, in a stable order.
    pub fn rooms_of(&self, session: SessionId) -> Vec<Room> {
        self.sessions
            .get(&session)
            .map(|entry| entry.rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn identity_of(&self, session: SessionId) -> Option<&Identity> {
        self.sessions.get(&session).and_then(|entry| entry.identity.as_ref())
    }

    /// Routing state of `session`. Sessions still in their transport
    /// handshake are not known here, so anything unregistered is `Closed`.
    pub fn state_of(&self, session: SessionId) -> TransportState {
        if self.sessions.contains_key(&session) {
            TransportState::Open
        } else {
            TransportState::Closed
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn remove_member(&mut self, room: &Room, session: SessionId) {
        let now_empty = match self.rooms.get_mut(room) {
            Some(members) => {
                members.remove(&session);
                members.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.rooms.remove(room);
        }
    }
}
