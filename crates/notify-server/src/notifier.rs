//! Handle used by trigger points to push notifications.

use notify_core::{NotificationEvent, UserId};
use tracing::warn;

use crate::types::{HubRequest, HubTx};

/// Cloneable, fire-and-forget delivery handle.
///
/// Call [`deliver`](Notifier::deliver) once per persisted state change
/// (media moderated, parent engagement recorded). It never blocks and never
/// fails: if the user has no live session, or the hub has stopped, the
/// notification is dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    hub_tx: HubTx,
}

impl Notifier {
    pub(crate) fn new(hub_tx: HubTx) -> Self {
        Notifier { hub_tx }
    }

    /// Deliver `event` to every active session of `user_id`.
    pub fn deliver(&self, user_id: UserId, event: NotificationEvent) {
        let kind = event.kind();
        if self.hub_tx.send(HubRequest::Deliver { user_id, event }).is_err() {
            warn!(event = %kind, "hub stopped, notification dropped");
        }
    }
}
