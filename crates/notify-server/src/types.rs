//! Shared types for the notification server.
//!
//! This module defines:
//! - channel aliases between sessions and the hub task
//! - `SessionRegistry`: outbound channel per live session
//! - `HubRequest`: everything that mutates or reads the hub

use std::collections::HashMap;
use std::sync::Arc;

use notify_core::{ClientMessage, NotificationEvent, ServerMessage, SessionId, UserId};
use tokio::sync::mpsc;
use tokio::sync::RwLock;

/// Outbound messages from the hub to a given session.
pub type OutboundTx = mpsc::UnboundedSender<ServerMessage>;
pub type OutboundRx = mpsc::UnboundedReceiver<ServerMessage>;

/// Registry of live sessions and their outbound channels.
///
/// - Key: `SessionId`
/// - Value: `OutboundTx` to push `ServerMessage`s to that session.
///
/// A session is removed as soon as its reader stops, so the hub may find
/// a routed session missing here; that is a silent miss, not an error.
pub type SessionRegistry = Arc<RwLock<HashMap<SessionId, OutboundTx>>>;

/// Request flowing into the hub task.
///
/// All registry mutations and deliveries go through this one channel, so
/// the hub sees them strictly one at a time.
#[derive(Debug)]
pub enum HubRequest {
    /// A session finished its handshake and is routable.
    Connect { session: SessionId },

    /// A decoded message from a session.
    Client { session: SessionId, msg: ClientMessage },

    /// A session's transport closed.
    Disconnect { session: SessionId },

    /// A trigger point asks to notify a user.
    Deliver { user_id: UserId, event: NotificationEvent },
}

/// Channel from sessions / notifiers -> hub task.
pub type HubTx = mpsc::UnboundedSender<HubRequest>;
pub type HubRx = mpsc::UnboundedReceiver<HubRequest>;
