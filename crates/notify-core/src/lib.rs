//! notify-core
//!
//! Pure notification routing logic:
//! - identities and roles
//! - room naming and sessions
//! - messages (client/server logical types)
//! - room registry
//! - delivery dispatcher
//! - the hub that ties registry and dispatcher together

pub mod role;
pub mod identity;
pub mod room;
pub mod messages;
pub mod registry;
pub mod dispatcher;
pub mod hub;
pub mod error;

pub use role::Role;
pub use identity::{Identity, UserId, MAX_USER_ID_LEN};
pub use room::{Room, SessionId, TransportState};

pub use messages::{
    ClientMessage,
    Engagement,
    EventKind,
    MediaApproved,
    MediaRejected,
    Notification,
    NotificationEvent,
    ParentEngagement,
    ServerMessage,
};

pub use registry::RoomRegistry;
pub use dispatcher::{DirectIndex, Dispatcher};
pub use hub::{NotificationHub, Outbound};
pub use error::IdentityError;
