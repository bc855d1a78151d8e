//! Notification hub.
//!
//! Owns the [`RoomRegistry`] and the [`Dispatcher`] and turns inputs
//! (session lifecycle, client messages, delivery triggers) into routed
//! [`Outbound`] messages. It performs no I/O; the host decides how each
//! outbound message reaches its session, and silently skips sessions that
//! have gone away in the meantime.

use chrono::{DateTime, Utc};

use crate::dispatcher::Dispatcher;
use crate::identity::{Identity, UserId};
use crate::messages::{ClientMessage, NotificationEvent, ServerMessage};
use crate::registry::RoomRegistry;
use crate::room::{Room, SessionId, TransportState};

/// A message addressed to one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub session: SessionId,
    pub message: ServerMessage,
}

impl Outbound {
    pub fn new(session: SessionId, message: ServerMessage) -> Self {
        Outbound { session, message }
    }
}

/// Registry + dispatcher, driven by one owner.
#[derive(Debug, Default)]
pub struct NotificationHub {
    registry: RoomRegistry,
    dispatcher: Dispatcher,
}

impl NotificationHub {
    pub fn new(direct_path: bool) -> Self {
        NotificationHub {
            registry: RoomRegistry::new(),
            dispatcher: Dispatcher::new(direct_path),
        }
    }

    /// Register a new open session (no identity, no rooms yet).
    pub fn connect(&mut self, session: SessionId) {
        self.registry.register(session);
    }

    /// Process a single client message and return any replies.
    pub fn process(&mut self, session: SessionId, msg: ClientMessage) -> Vec<Outbound> {
        if self.registry.state_of(session) != TransportState::Open {
            return Vec::new();
        }

        match msg {
            ClientMessage::Announce(identity) => self.announce(session, identity),
            ClientMessage::WhoAmI => vec![Outbound::new(
                session,
                ServerMessage::RoomList {
                    rooms: room_names(&self.registry.rooms_of(session)),
                },
            )],
            ClientMessage::Ping => vec![Outbound::new(session, ServerMessage::Pong)],
        }
    }

    /// Deliver `event` to every active session of `user_id`.
    pub fn deliver(
        &self,
        user_id: &UserId,
        event: NotificationEvent,
        now: DateTime<Utc>,
    ) -> Vec<Outbound> {
        self.dispatcher.deliver(&self.registry, user_id, event, now)
    }

    /// Tear down `session`. Returns the identity it was bound to, if any.
    pub fn disconnect(&mut self, session: SessionId) -> Option<Identity> {
        self.dispatcher.untrack(session);
        self.registry.on_disconnect(session)
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn direct_path_enabled(&self) -> bool {
        self.dispatcher.direct_path_enabled()
    }

    fn announce(&mut self, session: SessionId, identity: Identity) -> Vec<Outbound> {
        let user_id = identity.user_id.clone();
        let Some(rooms) = self.registry.announce(session, identity) else {
            return Vec::new();
        };
        self.dispatcher.track(session, user_id);

        vec![Outbound::new(
            session,
            ServerMessage::Joined {
                rooms: room_names(&rooms),
            },
        )]
    }
}

fn room_names(rooms: &[Room]) -> Vec<String> {
    rooms.iter().map(Room::name).collect()
}
