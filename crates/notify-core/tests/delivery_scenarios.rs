// crates/notify-core/tests/delivery_scenarios.rs
use chrono::Utc;
use notify_core::{
    ClientMessage, Identity, NotificationEvent, NotificationHub, Outbound, Role, Room,
    ServerMessage, SessionId, UserId,
};

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

fn announce(hub: &mut NotificationHub, session: SessionId, id: &str, role: Role) -> Vec<Outbound> {
    hub.process(session, ClientMessage::Announce(Identity::new(user(id), role)))
}

fn notifications_for(outputs: &[Outbound], session: SessionId) -> Vec<&notify_core::Notification> {
    outputs
        .iter()
        .filter(|o| o.session == session)
        .filter_map(|o| match &o.message {
            ServerMessage::Notification(n) => Some(n),
            _ => None,
        })
        .collect()
}

#[test]
fn announce_confirms_rooms() {
    let mut hub = NotificationHub::new(true);
    let s = SessionId(1);
    hub.connect(s);

    let out = announce(&mut hub, s, "p1", Role::Player);
    assert_eq!(
        out,
        vec![Outbound::new(
            s,
            ServerMessage::Joined {
                rooms: vec![
                    "global".to_string(),
                    "role:player".to_string(),
                    "user:p1".to_string(),
                ],
            },
        )]
    );
}

#[test]
fn single_session_receives_media_approved() {
    let mut hub = NotificationHub::new(true);
    let s = SessionId(1);
    hub.connect(s);
    announce(&mut hub, s, "p1", Role::Player);

    let event = NotificationEvent::media_approved("m1", "Six hit");
    let out = hub.deliver(&user("p1"), event.clone(), Utc::now());
    let got = notifications_for(&out, s);

    // room path always, direct path may add a flagged copy
    assert!(!got.is_empty() && got.len() <= 2, "got {} copies", got.len());
    assert!(got.iter().all(|n| n.event == event));
    assert_eq!(got.iter().filter(|n| !n.direct).count(), 1);
    assert!(got.iter().skip(1).all(|n| n.direct));
}

#[test]
fn direct_path_disabled_sends_one_copy() {
    let mut hub = NotificationHub::new(false);
    let s = SessionId(1);
    hub.connect(s);
    announce(&mut hub, s, "p1", Role::Player);

    let out = hub.deliver(
        &user("p1"),
        NotificationEvent::media_approved("m1", "Six hit"),
        Utc::now(),
    );
    assert_eq!(out.len(), 1);
    assert_eq!(notifications_for(&out, s).len(), 1);
}

#[test]
fn two_tabs_of_the_same_user_both_receive() {
    let mut hub = NotificationHub::new(true);
    let tab1 = SessionId(1);
    let tab2 = SessionId(2);
    hub.connect(tab1);
    hub.connect(tab2);
    announce(&mut hub, tab1, "p1", Role::Player);
    announce(&mut hub, tab2, "p1", Role::Player);

    let out = hub.deliver(
        &user("p1"),
        NotificationEvent::media_rejected("m2", "Blurry", Some("out of focus".into())),
        Utc::now(),
    );

    assert!(!notifications_for(&out, tab1).is_empty());
    assert!(!notifications_for(&out, tab2).is_empty());
}

#[test]
fn delivery_is_isolated_per_user() {
    let mut hub = NotificationHub::new(true);
    let users = ["p1", "p2", "p10", "user:p1", "p1 "];
    for (i, id) in users.iter().enumerate() {
        let s = SessionId(i as u64 + 1);
        hub.connect(s);
        announce(&mut hub, s, id, Role::Player);
    }

    for (i, id) in users.iter().enumerate() {
        let target = SessionId(i as u64 + 1);
        let out = hub.deliver(&user(id), NotificationEvent::media_approved("m", "t"), Utc::now());
        assert!(!out.is_empty());
        assert!(
            out.iter().all(|o| o.session == target),
            "delivery to {id:?} leaked: {out:?}"
        );
    }
}

#[test]
fn re_announce_is_idempotent() {
    let mut hub = NotificationHub::new(true);
    let s = SessionId(9);
    hub.connect(s);
    announce(&mut hub, s, "c1", Role::Coach);
    announce(&mut hub, s, "c1", Role::Coach);

    assert_eq!(
        hub.registry().rooms_of(s),
        vec![Room::Global, Room::Role(Role::Coach), Room::for_user(&user("c1"))]
    );
    assert_eq!(hub.registry().members_of(&Room::Global), vec![s]);

    let out = hub.deliver(&user("c1"), NotificationEvent::media_approved("m", "t"), Utc::now());
    // one room copy, one direct copy; re-announce did not double either path
    assert_eq!(out.len(), 2);
}

#[test]
fn account_switch_replaces_binding() {
    let mut hub = NotificationHub::new(true);
    let s = SessionId(1);
    hub.connect(s);
    announce(&mut hub, s, "p1", Role::Player);
    announce(&mut hub, s, "parent7", Role::Parent);

    let old = hub.deliver(&user("p1"), NotificationEvent::media_approved("m", "t"), Utc::now());
    assert!(old.is_empty(), "old identity still reachable: {old:?}");

    let new = hub.deliver(
        &user("parent7"),
        NotificationEvent::media_approved("m", "t"),
        Utc::now(),
    );
    assert!(!notifications_for(&new, s).is_empty());
    assert_eq!(
        hub.registry().rooms_of(s),
        vec![Room::Global, Room::Role(Role::Parent), Room::for_user(&user("parent7"))]
    );
}

#[test]
fn delivery_to_absent_user_is_silently_dropped() {
    let hub = NotificationHub::new(true);
    let out = hub.deliver(&user("nobody"), NotificationEvent::media_approved("m", "t"), Utc::now());
    assert!(out.is_empty());
}

#[test]
fn disconnected_session_is_not_routed() {
    let mut hub = NotificationHub::new(true);
    let s = SessionId(1);
    hub.connect(s);
    announce(&mut hub, s, "p1", Role::Player);
    hub.disconnect(s);

    let out = hub.deliver(&user("p1"), NotificationEvent::media_approved("m", "t"), Utc::now());
    assert!(out.is_empty());

    // late messages from the dead session are ignored
    assert!(hub.process(s, ClientMessage::WhoAmI).is_empty());
    assert_eq!(hub.registry().room_count(), 0);
}

#[test]
fn who_am_i_lists_current_rooms() {
    let mut hub = NotificationHub::new(true);
    let s = SessionId(1);
    hub.connect(s);

    let before = hub.process(s, ClientMessage::WhoAmI);
    assert_eq!(before, vec![Outbound::new(s, ServerMessage::RoomList { rooms: vec![] })]);

    announce(&mut hub, s, "a1", Role::Admin);
    let after = hub.process(s, ClientMessage::WhoAmI);
    assert_eq!(
        after,
        vec![Outbound::new(
            s,
            ServerMessage::RoomList {
                rooms: vec!["global".into(), "role:admin".into(), "user:a1".into()],
            },
        )]
    );

    assert_eq!(hub.process(s, ClientMessage::Ping), vec![Outbound::new(s, ServerMessage::Pong)]);
}
