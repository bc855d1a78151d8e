// crates/notify-protocol/tests/codec.rs
use bytes::BytesMut;
use chrono::{TimeZone, Utc};
use notify_core::{
    ClientMessage, Engagement, Identity, Notification, NotificationEvent, ParentEngagement,
    ServerMessage, UserId,
};
use notify_protocol::wire_types::{WireMode, MAX_FRAME_LEN};
use notify_protocol::{
    decode_client, decode_server, decode_trigger, encode_client, encode_frame, encode_line,
    encode_server, encode_trigger, FrameDecoder, LineDecoder, ProtocolError,
};
use serde_json::Value;

fn ts() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap()
}

#[test]
fn announce_uses_camel_case_fields() {
    let msg = ClientMessage::Announce(Identity::parse("p1", "player").unwrap());
    let bytes = encode_client(&msg).unwrap();

    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["event"], "announce");
    assert_eq!(value["data"]["userId"], "p1");
    assert_eq!(value["data"]["role"], "player");

    assert_eq!(decode_client(&bytes).unwrap(), msg);
}

#[test]
fn announce_with_bad_identity_is_rejected() {
    let empty = br#"{"event":"announce","data":{"userId":"","role":"player"}}"#;
    assert!(matches!(decode_client(empty), Err(ProtocolError::Json(_))));

    let bad_role = br#"{"event":"announce","data":{"userId":"p1","role":"umpire"}}"#;
    assert!(matches!(decode_client(bad_role), Err(ProtocolError::Json(_))));
}

#[test]
fn data_may_be_omitted_for_empty_requests() {
    assert_eq!(decode_client(br#"{"event":"whoAmI"}"#).unwrap(), ClientMessage::WhoAmI);
    assert_eq!(decode_client(br#"{"event":"ping","data":{}}"#).unwrap(), ClientMessage::Ping);
}

#[test]
fn server_events_are_not_accepted_from_clients() {
    let err = decode_client(br#"{"event":"joined","data":{"rooms":[]}}"#).unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownEvent(name) if name == "joined"));

    let err = decode_client(br#"{"event":"shout","data":{}}"#).unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownEvent(name) if name == "shout"));
}

#[test]
fn direct_flag_only_on_direct_copies() {
    let event = NotificationEvent::media_rejected("m1", "Blurry", Some("out of focus".into()));

    let room_copy = ServerMessage::Notification(Notification {
        event: event.clone(),
        server_ts: ts(),
        direct: false,
    });
    let direct_copy = ServerMessage::Notification(Notification {
        event,
        server_ts: ts(),
        direct: true,
    });

    let room_json: Value = serde_json::from_slice(&encode_server(&room_copy).unwrap()).unwrap();
    let direct_json: Value = serde_json::from_slice(&encode_server(&direct_copy).unwrap()).unwrap();

    assert_eq!(room_json["event"], "mediaRejected");
    assert_eq!(room_json["data"]["reason"], "out of focus");
    assert!(room_json["data"].get("direct").is_none());
    assert_eq!(direct_json["data"]["direct"], true);
    assert_eq!(direct_json["serverTs"], "2024-05-01T10:30:00Z");

    assert_eq!(decode_server(&encode_server(&direct_copy).unwrap()).unwrap(), direct_copy);
}

#[test]
fn parent_engagement_keeps_type_field_name() {
    let msg = ServerMessage::Notification(Notification {
        event: NotificationEvent::NewParentEngagement(ParentEngagement {
            engagement: Engagement {
                id: "e9".into(),
                parent_id: "par1".into(),
                player_id: "p1".into(),
                reaction: "clap".into(),
            },
            message: "Your parent reacted to your 52*".into(),
            kind: "reaction".into(),
            timestamp: ts(),
        }),
        server_ts: ts(),
        direct: false,
    });

    let bytes = encode_server(&msg).unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["data"]["type"], "reaction");
    assert_eq!(value["data"]["engagement"]["playerId"], "p1");
    assert_eq!(decode_server(&bytes).unwrap(), msg);
}

#[test]
fn notification_without_server_timestamp_is_invalid() {
    let raw = br#"{"event":"mediaApproved","data":{"mediaId":"m1","title":"t"}}"#;
    assert!(matches!(decode_server(raw), Err(ProtocolError::InvalidField("serverTs"))));
}

#[test]
fn trigger_carries_target_user() {
    let user = UserId::new("p1").unwrap();
    let event = NotificationEvent::media_approved("m1", "Six hit");
    let bytes = encode_trigger(&user, &event).unwrap();

    let (decoded_user, decoded_event) = decode_trigger(&bytes).unwrap();
    assert_eq!(decoded_user, user);
    assert_eq!(decoded_event, event);

    let missing_user = br#"{"event":"mediaApproved","data":{"mediaId":"m1","title":"t"}}"#;
    assert!(matches!(decode_trigger(missing_user), Err(ProtocolError::InvalidField("userId"))));

    let not_a_notification = br#"{"userId":"p1","event":"joined","data":{"rooms":[]}}"#;
    assert!(matches!(decode_trigger(not_a_notification), Err(ProtocolError::UnknownEvent(_))));
}

#[test]
fn frame_decoder_handles_partial_and_empty_frames() {
    let decoder = FrameDecoder::new();
    let body = encode_client(&ClientMessage::Ping).unwrap();

    let mut wire = BytesMut::new();
    wire.extend_from_slice(&[0, 0, 0, 0]); // keep-alive empty frame
    encode_frame(&body, &mut wire).unwrap();
    encode_frame(&body, &mut wire).unwrap();

    // feed one byte at a time
    let mut buf = BytesMut::new();
    let mut frames = Vec::new();
    for byte in wire.iter() {
        buf.extend_from_slice(&[*byte]);
        while let Some(frame) = decoder.decode(&mut buf).unwrap() {
            frames.push(frame);
        }
    }

    assert_eq!(frames.len(), 2);
    assert!(frames.iter().all(|f| f[..] == body[..]));
    assert!(buf.is_empty());
}

#[test]
fn frame_decoder_rejects_oversized_header() {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&((MAX_FRAME_LEN as u32) + 1).to_be_bytes());
    assert!(matches!(
        FrameDecoder::new().decode(&mut buf),
        Err(ProtocolError::FrameTooLarge(_))
    ));

    let mut out = BytesMut::new();
    let big = vec![b'x'; MAX_FRAME_LEN + 1];
    assert!(encode_frame(&big, &mut out).is_err());
}

#[test]
fn line_decoder_skips_blank_lines_and_crlf() {
    let decoder = LineDecoder::new();
    let mut buf = BytesMut::from(&b"\r\n  \n{\"event\":\"ping\"}\r\n{\"event\":\"who"[..]);

    let line = decoder.decode(&mut buf).unwrap().unwrap();
    assert_eq!(decode_client(&line).unwrap(), ClientMessage::Ping);
    assert!(decoder.decode(&mut buf).unwrap().is_none());

    buf.extend_from_slice(b"AmI\"}\n");
    let line = decoder.decode(&mut buf).unwrap().unwrap();
    assert_eq!(decode_client(&line).unwrap(), ClientMessage::WhoAmI);

    let mut out = BytesMut::new();
    encode_line(b"{}", &mut out).unwrap();
    assert_eq!(&out[..], b"{}\n");
}

#[test]
fn mode_detection() {
    assert_eq!(WireMode::detect(b'{'), WireMode::Line);
    assert_eq!(WireMode::detect(0), WireMode::Framed);
}
