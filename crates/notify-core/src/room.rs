//! Sessions and rooms.

use std::fmt;

use crate::identity::UserId;
use crate::role::Role;

/// Identifier for a live connection session.
///
/// Opaque; the server guarantees uniqueness over the lifetime of the
/// process. Never reused, so a stale handle can only ever miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s-{}", self.0)
    }
}

/// Transport state of a server-side session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Handshake in progress; not yet registered for routing.
    Connecting,
    /// Registered and routable.
    Open,
    /// Closed; the session no longer exists for routing purposes.
    Closed,
}

/// A named multicast group of sessions.
///
/// Names are derived deterministically:
/// - `Global`       => `"global"`
/// - `Role(r)`      => `"role:<r>"`
/// - `User(u)`      => `"user:<u>"`
///
/// Each variant owns a distinct prefix and the suffix is the full value, so
/// two different users can never map to the same room name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Room {
    Global,
    Role(Role),
    User(UserId),
}

pub const GLOBAL_ROOM: &str = "global";
pub const ROLE_ROOM_PREFIX: &str = "role:";
pub const USER_ROOM_PREFIX: &str = "user:";

impl Room {
    /// Per-user room for `user_id`.
    pub fn for_user(user_id: &UserId) -> Self {
        Room::User(user_id.clone())
    }

    /// Rendered room name, as sent to clients in `joined` / `roomList`.
    pub fn name(&self) -> String {
        match self {
            Room::Global => GLOBAL_ROOM.to_string(),
            Room::Role(role) => format!("{}{}", ROLE_ROOM_PREFIX, role),
            Room::User(user_id) => format!("{}{}", USER_ROOM_PREFIX, user_id),
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
