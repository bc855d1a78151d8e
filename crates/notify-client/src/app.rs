// crates/notify-client/src/app.rs

use notify_core::{Identity, ServerMessage};
use tracing::{debug, info};

use crate::queue::{NotificationQueue, QueuePolicy};

/// Client application state fed by the transport's inbound channel.
pub struct NotificationApp {
    queue: NotificationQueue,
    rooms: Vec<String>,
    message_count: u64,
}

impl NotificationApp {
    pub fn new(policy: QueuePolicy) -> Self {
        Self {
            queue: NotificationQueue::new(policy),
            rooms: Vec::new(),
            message_count: 0,
        }
    }

    pub fn queue(&self) -> &NotificationQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut NotificationQueue {
        &mut self.queue
    }

    /// Rooms from the last `joined`/`roomList` the server sent.
    pub fn rooms(&self) -> &[String] {
        &self.rooms
    }

    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    pub fn handle_server_message(&mut self, msg: ServerMessage) {
        self.message_count += 1;

        match msg {
            ServerMessage::Joined { rooms } => {
                info!(rooms = ?rooms, "joined rooms");
                self.rooms = rooms;
            }
            ServerMessage::RoomList { rooms } => {
                info!(rooms = ?rooms, "current rooms");
                self.rooms = rooms;
            }
            ServerMessage::Notification(notification) => {
                debug!(
                    event = %notification.kind(),
                    direct = notification.direct,
                    "notification received"
                );
                self.queue.process(notification);
            }
            ServerMessage::Pong => {}
        }
    }
}

/// Startup banner for the stored identity.
///
/// An unannounced session joins no room, so nothing reaches it until login.
pub fn login_status(identity: Option<&Identity>) -> String {
    match identity {
        Some(identity) => format!("Logged in as {} ({})", identity.user_id, identity.role),
        None => "Not logged in; no notifications will arrive until you log in".to_string(),
    }
}
