//! Message types used by the notification core.
//!
//! These are **transport-agnostic** logical messages:
//! - [`ClientMessage`]: what a session sends to the server.
//! - [`ServerMessage`]: what the server pushes to a session.
//!
//! Every notification kind is a closed variant with its own payload struct,
//! so the payload shape for each kind is fixed at compile time.
//!
//! Note: JSON and framing codecs live in the `notify-protocol` crate; this
//! module is purely logical. Payload structs derive serde so the codec can
//! reuse them for the `data` object of each event.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// A request from a client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Bind (or re-bind) the session to an identity and (re)join its rooms.
    Announce(Identity),

    /// Diagnostic: ask for the session's current room list.
    WhoAmI,

    /// Keep-alive; answered with [`ServerMessage::Pong`].
    Ping,
}

/// A message pushed to a client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Confirms room membership after an announce.
    Joined { rooms: Vec<String> },

    /// Diagnostic answer to [`ClientMessage::WhoAmI`].
    RoomList { rooms: Vec<String> },

    /// A user-targeted notification.
    Notification(Notification),

    /// Keep-alive answer.
    Pong,
}

/// Kind of a notification event, used as the subscriber key on the client.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    MediaApproved,
    MediaRejected,
    NewParentEngagement,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::MediaApproved,
        EventKind::MediaRejected,
        EventKind::NewParentEngagement,
    ];

    /// Wire name of the event.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::MediaApproved => "mediaApproved",
            EventKind::MediaRejected => "mediaRejected",
            EventKind::NewParentEngagement => "newParentEngagement",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Media item approved by a moderator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaApproved {
    pub media_id: String,
    pub title: String,
}

/// Media item rejected by a moderator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRejected {
    pub media_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A parent's reaction to one of their child's stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engagement {
    pub id: String,
    pub parent_id: String,
    pub player_id: String,
    pub reaction: String,
}

/// Notification to a player that a parent engaged with their stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentEngagement {
    pub engagement: Engagement,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: DateTime<Utc>,
}

/// The event a trigger point asks to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    MediaApproved(MediaApproved),
    MediaRejected(MediaRejected),
    NewParentEngagement(ParentEngagement),
}

impl NotificationEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            NotificationEvent::MediaApproved(_) => EventKind::MediaApproved,
            NotificationEvent::MediaRejected(_) => EventKind::MediaRejected,
            NotificationEvent::NewParentEngagement(_) => EventKind::NewParentEngagement,
        }
    }

    /// Identifier of the thing the event is about (media id or engagement id).
    ///
    /// Events carry no unique id of their own; subscribers that need to
    /// suppress the duplicate copy from dual-path delivery key on
    /// `(kind, content_key)` instead.
    pub fn content_key(&self) -> &str {
        match self {
            NotificationEvent::MediaApproved(m) => &m.media_id,
            NotificationEvent::MediaRejected(m) => &m.media_id,
            NotificationEvent::NewParentEngagement(p) => &p.engagement.id,
        }
    }
}

/// A notification as received by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub event: NotificationEvent,

    /// When the server emitted the event.
    pub server_ts: DateTime<Utc>,

    /// `true` on the copy sent through the direct per-session index.
    pub direct: bool,
}

impl Notification {
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}

// -----------------------------------------------------------------------------
// Convenience constructors
// -----------------------------------------------------------------------------

impl NotificationEvent {
    pub fn media_approved(media_id: impl Into<String>, title: impl Into<String>) -> Self {
        NotificationEvent::MediaApproved(MediaApproved {
            media_id: media_id.into(),
            title: title.into(),
        })
    }

    pub fn media_rejected(
        media_id: impl Into<String>,
        title: impl Into<String>,
        reason: Option<String>,
    ) -> Self {
        NotificationEvent::MediaRejected(MediaRejected {
            media_id: media_id.into(),
            title: title.into(),
            reason,
        })
    }
}
