//! Console toasts: the reference consumer of the notification queue.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify_core::{EventKind, Notification, NotificationEvent};
use tracing::debug;

use crate::dedup::RecentEvents;
use crate::queue::NotificationQueue;
use crate::subscribers::Subscription;

/// One-line, human readable rendering of a notification.
pub fn toast_text(notification: &Notification) -> String {
    match &notification.event {
        NotificationEvent::MediaApproved(m) => format!("Your media \"{}\" was approved", m.title),
        NotificationEvent::MediaRejected(m) => match &m.reason {
            Some(reason) => format!("Your media \"{}\" was rejected: {}", m.title, reason),
            None => format!("Your media \"{}\" was rejected", m.title),
        },
        NotificationEvent::NewParentEngagement(p) => p.message.clone(),
    }
}

/// Subscribe a toast printer for every event kind.
///
/// Repeats of the same event inside `window` print once. The returned
/// subscriptions keep the printers attached until unsubscribed or until the
/// queue is torn down.
pub fn install(queue: &NotificationQueue, window: Duration) -> Vec<Subscription> {
    let recent = Arc::new(Mutex::new(RecentEvents::new(window)));

    EventKind::ALL
        .into_iter()
        .map(|kind| {
            let recent = Arc::clone(&recent);
            queue.subscribe(kind, move |notification| {
                let first = match recent.lock() {
                    Ok(mut recent) => recent.first_sighting(notification),
                    Err(poisoned) => poisoned.into_inner().first_sighting(notification),
                };
                if !first {
                    debug!(event = %notification.kind(), "duplicate suppressed");
                    return;
                }
                println!(
                    "[{}] {}",
                    notification.server_ts.format("%H:%M:%S"),
                    toast_text(notification)
                );
            })
        })
        .collect()
}
