// crates/notify-client/tests/queue.rs
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use notify_client::{NotificationQueue, QueuePolicy, Subscription};
use notify_core::{EventKind, Notification, NotificationEvent, UserId};

fn approved(media_id: &str) -> Notification {
    Notification {
        event: NotificationEvent::media_approved(media_id, format!("clip {media_id}")),
        server_ts: Utc::now(),
        direct: false,
    }
}

fn rejected(media_id: &str) -> Notification {
    Notification {
        event: NotificationEvent::media_rejected(media_id, "clip", Some("blurry".into())),
        server_ts: Utc::now(),
        direct: false,
    }
}

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

type Seen = Arc<Mutex<Vec<String>>>;

fn record(
    queue: &NotificationQueue,
    kind: EventKind,
    tag: &'static str,
    seen: &Seen,
) -> Subscription {
    let seen = Arc::clone(seen);
    queue.subscribe(kind, move |n| {
        seen.lock()
            .unwrap()
            .push(format!("{tag}:{}", n.event.content_key()));
    })
}

#[test]
fn buffered_events_drain_in_arrival_order_exactly_once() {
    let mut queue = NotificationQueue::new(QueuePolicy::default());
    let seen: Seen = Arc::default();
    let _sub = record(&queue, EventKind::MediaApproved, "a", &seen);

    queue.process(approved("e1"));
    queue.process(approved("e2"));
    queue.process(approved("e3"));

    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(queue.pending_len(), 3);

    let drained = queue.initialize(user("p1"));

    assert_eq!(drained, 3);
    assert_eq!(queue.pending_len(), 0);
    assert_eq!(*seen.lock().unwrap(), vec!["a:e1", "a:e2", "a:e3"]);

    // A second initialize has nothing left to drain.
    assert_eq!(queue.initialize(user("p1")), 0);
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[test]
fn mixed_kinds_keep_global_fifo_order() {
    let mut queue = NotificationQueue::new(QueuePolicy::default());
    let seen: Seen = Arc::default();
    let _a = record(&queue, EventKind::MediaApproved, "ok", &seen);
    let _r = record(&queue, EventKind::MediaRejected, "no", &seen);

    queue.process(approved("m1"));
    queue.process(rejected("m2"));
    queue.process(approved("m3"));
    queue.initialize(user("p1"));

    assert_eq!(*seen.lock().unwrap(), vec!["ok:m1", "no:m2", "ok:m3"]);
}

#[test]
fn ready_queue_dispatches_immediately() {
    let mut queue = NotificationQueue::new(QueuePolicy::default());
    let seen: Seen = Arc::default();
    let _sub = record(&queue, EventKind::MediaApproved, "a", &seen);

    queue.initialize(user("p1"));
    assert!(queue.is_ready());

    queue.process(approved("live"));

    assert_eq!(queue.pending_len(), 0);
    assert_eq!(*seen.lock().unwrap(), vec!["a:live"]);
}

#[test]
fn every_subscriber_of_a_kind_is_called() {
    let mut queue = NotificationQueue::new(QueuePolicy::default());
    let seen: Seen = Arc::default();
    let _one = record(&queue, EventKind::MediaApproved, "one", &seen);
    let _two = record(&queue, EventKind::MediaApproved, "two", &seen);
    let _other = record(&queue, EventKind::MediaRejected, "other", &seen);

    queue.initialize(user("p1"));
    queue.process(approved("m1"));

    assert_eq!(*seen.lock().unwrap(), vec!["one:m1", "two:m1"]);
}

#[test]
fn self_unsubscribe_during_dispatch_keeps_siblings() {
    let mut queue = NotificationQueue::new(QueuePolicy::default());
    let seen: Seen = Arc::default();

    let slot: Arc<Mutex<Option<Subscription>>> = Arc::default();
    let first = {
        let slot = Arc::clone(&slot);
        let seen = Arc::clone(&seen);
        queue.subscribe(EventKind::MediaApproved, move |n| {
            seen.lock().unwrap().push(format!("once:{}", n.event.content_key()));
            if let Some(sub) = slot.lock().unwrap().take() {
                assert!(sub.unsubscribe());
            }
        })
    };
    *slot.lock().unwrap() = Some(first);
    let _sibling = record(&queue, EventKind::MediaApproved, "always", &seen);

    queue.initialize(user("p1"));
    queue.process(approved("m1"));
    queue.process(approved("m2"));

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["once:m1", "always:m1", "always:m2"]
    );
    assert_eq!(queue.subscribers().subscriber_count(EventKind::MediaApproved), 1);
}

#[test]
fn unsubscribe_is_idempotent() {
    let queue = NotificationQueue::new(QueuePolicy::default());
    let seen: Seen = Arc::default();
    let sub = record(&queue, EventKind::MediaApproved, "a", &seen);

    assert!(sub.unsubscribe());
    assert!(!sub.unsubscribe());
    assert_eq!(queue.subscribers().subscriber_count(EventKind::MediaApproved), 0);
}

#[test]
fn full_buffer_drops_oldest() {
    let policy = QueuePolicy {
        max_pending: 2,
        max_age: Duration::from_secs(300),
    };
    let mut queue = NotificationQueue::new(policy);
    let seen: Seen = Arc::default();
    let _sub = record(&queue, EventKind::MediaApproved, "a", &seen);

    queue.process(approved("e1"));
    queue.process(approved("e2"));
    queue.process(approved("e3"));

    assert_eq!(queue.pending_len(), 2);
    assert_eq!(queue.dropped(), 1);

    queue.initialize(user("p1"));
    assert_eq!(*seen.lock().unwrap(), vec!["a:e2", "a:e3"]);
}

#[test]
fn stale_events_are_not_delivered() {
    let policy = QueuePolicy {
        max_pending: 16,
        max_age: Duration::from_millis(20),
    };
    let mut queue = NotificationQueue::new(policy);
    let seen: Seen = Arc::default();
    let _sub = record(&queue, EventKind::MediaApproved, "a", &seen);

    queue.process(approved("old"));
    std::thread::sleep(Duration::from_millis(40));

    assert_eq!(queue.initialize(user("p1")), 0);
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(queue.dropped(), 1);
}

#[test]
fn teardown_resets_for_the_next_identity() {
    let mut queue = NotificationQueue::new(QueuePolicy::default());
    let seen: Seen = Arc::default();
    let _sub = record(&queue, EventKind::MediaApproved, "a", &seen);

    queue.initialize(user("p1"));
    assert_eq!(queue.user_id().map(|u| u.as_str()), Some("p1"));

    queue.teardown();
    assert!(!queue.is_ready());
    assert!(queue.user_id().is_none());
    assert_eq!(queue.subscribers().subscriber_count(EventKind::MediaApproved), 0);

    // Events for the next identity buffer again; the old callback is gone.
    queue.process(approved("after"));
    assert_eq!(queue.pending_len(), 1);

    let fresh: Seen = Arc::default();
    let _fresh = record(&queue, EventKind::MediaApproved, "b", &fresh);
    queue.initialize(user("p2"));

    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(*fresh.lock().unwrap(), vec!["b:after"]);
}
