//! Low-level wire types and constants.
//!
//! This module defines:
//! - Event names for every message in both directions.
//! - Protocol versioning and size limits.
//! - Transport mode detection (framed vs line).
//!
//! The actual encode/decode logic lives in `json_codec`.

use std::str::FromStr;

use notify_core::EventKind;

/// Current protocol version.
///
/// Bump this if the envelope shape or framing changes incompatibly.
pub const PROTOCOL_VERSION: u8 = 1;

/// Size of the big-endian `u32` length prefix.
pub const FRAME_HEADER_LEN: usize = 4;

/// Maximum accepted frame body (or line) length.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Event names on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WireEvent {
    // client -> server
    Announce,
    WhoAmI,
    Ping,

    // server -> client
    Joined,
    RoomList,
    Pong,
    MediaApproved,
    MediaRejected,
    NewParentEngagement,
}

impl WireEvent {
    pub const ALL: [WireEvent; 9] = [
        WireEvent::Announce,
        WireEvent::WhoAmI,
        WireEvent::Ping,
        WireEvent::Joined,
        WireEvent::RoomList,
        WireEvent::Pong,
        WireEvent::MediaApproved,
        WireEvent::MediaRejected,
        WireEvent::NewParentEngagement,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WireEvent::Announce => "announce",
            WireEvent::WhoAmI => "whoAmI",
            WireEvent::Ping => "ping",
            WireEvent::Joined => "joined",
            WireEvent::RoomList => "roomList",
            WireEvent::Pong => "pong",
            WireEvent::MediaApproved => EventKind::MediaApproved.as_str(),
            WireEvent::MediaRejected => EventKind::MediaRejected.as_str(),
            WireEvent::NewParentEngagement => EventKind::NewParentEngagement.as_str(),
        }
    }

    /// Notification kind carried by this event, if it is a notification.
    pub fn notification_kind(self) -> Option<EventKind> {
        match self {
            WireEvent::MediaApproved => Some(EventKind::MediaApproved),
            WireEvent::MediaRejected => Some(EventKind::MediaRejected),
            WireEvent::NewParentEngagement => Some(EventKind::NewParentEngagement),
            _ => None,
        }
    }
}

impl FromStr for WireEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WireEvent::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl From<EventKind> for WireEvent {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::MediaApproved => WireEvent::MediaApproved,
            EventKind::MediaRejected => WireEvent::MediaRejected,
            EventKind::NewParentEngagement => WireEvent::NewParentEngagement,
        }
    }
}

/// How a connection delimits messages.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WireMode {
    /// `u32` BE length prefix + JSON body.
    Framed,
    /// One JSON object per `\n`-terminated line.
    Line,
}

impl WireMode {
    /// Guess the mode from the first byte a client sends.
    ///
    /// A JSON line starts with `{`. A framed connection starts with the high
    /// byte of a length that is at most [`MAX_FRAME_LEN`], which is always 0.
    pub fn detect(first_byte: u8) -> Self {
        if first_byte == b'{' {
            WireMode::Line
        } else {
            WireMode::Framed
        }
    }
}
