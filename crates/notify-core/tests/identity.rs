// crates/notify-core/tests/identity.rs
use notify_core::{Identity, IdentityError, Role, Room, UserId, MAX_USER_ID_LEN};

#[test]
fn user_id_limits() {
    assert_eq!(UserId::new(""), Err(IdentityError::EmptyUserId));
    assert_eq!(UserId::new("   "), Err(IdentityError::EmptyUserId));
    assert_eq!(
        UserId::new("x".repeat(MAX_USER_ID_LEN + 1)),
        Err(IdentityError::UserIdTooLong(MAX_USER_ID_LEN + 1))
    );
    assert!(UserId::new("x".repeat(MAX_USER_ID_LEN)).is_ok());
}

#[test]
fn role_names_round_trip() {
    for role in Role::ALL {
        assert_eq!(role.as_str().parse::<Role>(), Ok(role));
    }
    assert_eq!(
        "umpire".parse::<Role>(),
        Err(IdentityError::UnknownRole("umpire".to_string()))
    );
}

#[test]
fn identity_parse_validates_both_fields() {
    let id = Identity::parse("p1", "player").unwrap();
    assert_eq!(id.user_id.as_str(), "p1");
    assert_eq!(id.role, Role::Player);

    assert!(Identity::parse("", "player").is_err());
    assert!(Identity::parse("p1", "Player").is_err());
}

#[test]
fn room_names_are_prefixed() {
    let u = UserId::new("p1").unwrap();
    assert_eq!(Room::Global.name(), "global");
    assert_eq!(Room::Role(Role::Scout).name(), "role:scout");
    assert_eq!(Room::for_user(&u).name(), "user:p1");

    // a user literally named like a role room still lands under "user:"
    let tricky = UserId::new("role:admin").unwrap();
    assert_eq!(Room::for_user(&tricky).name(), "user:role:admin");
    assert_ne!(Room::for_user(&tricky).name(), Room::Role(Role::Admin).name());
}
