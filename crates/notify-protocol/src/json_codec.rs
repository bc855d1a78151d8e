//! JSON encoding/decoding for notification messages.
//!
//! Every message is one JSON object with an event name and a `data` object:
//!
//! ```text
//! client -> server
//!   {"event":"announce","data":{"userId":"p1","role":"player"}}
//!   {"event":"whoAmI","data":{}}
//!   {"event":"ping","data":{}}
//!
//! server -> client
//!   {"event":"joined","data":{"rooms":["global","role:player","user:p1"]}}
//!   {"event":"roomList","data":{"rooms":[...]}}
//!   {"event":"pong","data":{}}
//!   {"event":"mediaApproved","data":{"mediaId":"m1","title":"Six hit"},"serverTs":"<rfc3339>"}
//!   {"event":"mediaRejected",
//!    "data":{"mediaId":"m1","title":"..","reason":"..","direct":true},"serverTs":".."}
//!   {"event":"newParentEngagement",
//!    "data":{"engagement":{..},"message":"..","type":"..","timestamp":".."},"serverTs":".."}
//!
//! trigger ingress (collaborator -> server)
//!   {"userId":"p1","event":"mediaApproved","data":{"mediaId":"m1","title":"Six hit"}}
//! ```
//!
//! `direct` only appears, as `true`, on copies sent through the direct path.
//!
//! NOTE: This module encodes/decodes **one message per buffer**. Framing is
//! handled by `frame_codec` / `line_codec`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use notify_core::{
    ClientMessage, Identity, Notification, NotificationEvent, ServerMessage, UserId,
};

use crate::error::ProtocolError;
use crate::wire_types::WireEvent;

const DIRECT_FIELD: &str = "direct";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    event: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    server_ts: Option<DateTime<Utc>>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RoomsBody {
    rooms: Vec<String>,
}

// -----------------------------------------------------------------------------
// Client -> server
// -----------------------------------------------------------------------------

pub fn encode_client(msg: &ClientMessage) -> Result<Vec<u8>, ProtocolError> {
    let value = match msg {
        ClientMessage::Announce(identity) => {
            envelope(WireEvent::Announce, serde_json::to_value(identity)?)
        }
        ClientMessage::WhoAmI => envelope(WireEvent::WhoAmI, json!({})),
        ClientMessage::Ping => envelope(WireEvent::Ping, json!({})),
    };
    Ok(serde_json::to_vec(&value)?)
}

pub fn decode_client(buf: &[u8]) -> Result<ClientMessage, ProtocolError> {
    let raw: RawEnvelope = serde_json::from_slice(buf)?;

    match parse_event(&raw.event)? {
        WireEvent::Announce => {
            let identity: Identity = serde_json::from_value(raw.data)?;
            Ok(ClientMessage::Announce(identity))
        }
        WireEvent::WhoAmI => Ok(ClientMessage::WhoAmI),
        WireEvent::Ping => Ok(ClientMessage::Ping),
        _ => Err(ProtocolError::UnknownEvent(raw.event)),
    }
}

// -----------------------------------------------------------------------------
// Server -> client
// -----------------------------------------------------------------------------

pub fn encode_server(msg: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
    let value = match msg {
        ServerMessage::Joined { rooms } => {
            envelope(WireEvent::Joined, json!({ "rooms": rooms }))
        }
        ServerMessage::RoomList { rooms } => {
            envelope(WireEvent::RoomList, json!({ "rooms": rooms }))
        }
        ServerMessage::Pong => envelope(WireEvent::Pong, json!({})),
        ServerMessage::Notification(n) => encode_notification(n)?,
    };
    Ok(serde_json::to_vec(&value)?)
}

pub fn decode_server(buf: &[u8]) -> Result<ServerMessage, ProtocolError> {
    let raw: RawEnvelope = serde_json::from_slice(buf)?;
    let event = parse_event(&raw.event)?;

    match event {
        WireEvent::Joined => {
            let body: RoomsBody = serde_json::from_value(raw.data)?;
            Ok(ServerMessage::Joined { rooms: body.rooms })
        }
        WireEvent::RoomList => {
            let body: RoomsBody = serde_json::from_value(raw.data)?;
            Ok(ServerMessage::RoomList { rooms: body.rooms })
        }
        WireEvent::Pong => Ok(ServerMessage::Pong),
        WireEvent::MediaApproved | WireEvent::MediaRejected | WireEvent::NewParentEngagement => {
            let server_ts = raw.server_ts.ok_or(ProtocolError::InvalidField("serverTs"))?;
            let (event, direct) = decode_event(event, raw.data)?;
            Ok(ServerMessage::Notification(Notification {
                event,
                server_ts,
                direct,
            }))
        }
        _ => Err(ProtocolError::UnknownEvent(raw.event)),
    }
}

// -----------------------------------------------------------------------------
// Trigger ingress
// -----------------------------------------------------------------------------

/// Encode a delivery trigger as sent by a persistence-layer collaborator.
pub fn encode_trigger(
    user_id: &UserId,
    event: &NotificationEvent,
) -> Result<Vec<u8>, ProtocolError> {
    let mut value = envelope(WireEvent::from(event.kind()), event_data(event)?);
    if let Value::Object(map) = &mut value {
        map.insert("userId".to_string(), Value::String(user_id.to_string()));
    }
    Ok(serde_json::to_vec(&value)?)
}

/// Decode a delivery trigger into its target user and event.
pub fn decode_trigger(buf: &[u8]) -> Result<(UserId, NotificationEvent), ProtocolError> {
    let raw: RawEnvelope = serde_json::from_slice(buf)?;
    let event = parse_event(&raw.event)?;
    if event.notification_kind().is_none() {
        return Err(ProtocolError::UnknownEvent(raw.event));
    }

    let user_id = raw
        .user_id
        .and_then(|id| UserId::new(id).ok())
        .ok_or(ProtocolError::InvalidField("userId"))?;
    let (event, _) = decode_event(event, raw.data)?;
    Ok((user_id, event))
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn envelope(event: WireEvent, data: Value) -> Value {
    json!({ "event": event.as_str(), "data": data })
}

fn parse_event(name: &str) -> Result<WireEvent, ProtocolError> {
    name.parse::<WireEvent>().map_err(ProtocolError::UnknownEvent)
}

fn event_data(event: &NotificationEvent) -> Result<Value, ProtocolError> {
    let data = match event {
        NotificationEvent::MediaApproved(p) => serde_json::to_value(p)?,
        NotificationEvent::MediaRejected(p) => serde_json::to_value(p)?,
        NotificationEvent::NewParentEngagement(p) => serde_json::to_value(p)?,
    };
    Ok(data)
}

fn encode_notification(n: &Notification) -> Result<Value, ProtocolError> {
    let mut data = event_data(&n.event)?;
    if n.direct {
        if let Value::Object(map) = &mut data {
            map.insert(DIRECT_FIELD.to_string(), Value::Bool(true));
        }
    }

    let mut value = envelope(WireEvent::from(n.kind()), data);
    if let Value::Object(map) = &mut value {
        map.insert("serverTs".to_string(), serde_json::to_value(n.server_ts)?);
    }
    Ok(value)
}

/// Decode a notification `data` object, returning the event and its
/// `direct` flag.
fn decode_event(event: WireEvent, data: Value) -> Result<(NotificationEvent, bool), ProtocolError> {
    let Value::Object(mut map) = data else {
        return Err(ProtocolError::InvalidField("data"));
    };
    let direct = take_direct(&mut map)?;
    let data = Value::Object(map);

    let event = match event {
        WireEvent::MediaApproved => NotificationEvent::MediaApproved(serde_json::from_value(data)?),
        WireEvent::MediaRejected => NotificationEvent::MediaRejected(serde_json::from_value(data)?),
        WireEvent::NewParentEngagement => {
            NotificationEvent::NewParentEngagement(serde_json::from_value(data)?)
        }
        other => return Err(ProtocolError::UnknownEvent(other.as_str().to_string())),
    };
    Ok((event, direct))
}

fn take_direct(map: &mut Map<String, Value>) -> Result<bool, ProtocolError> {
    match map.remove(DIRECT_FIELD) {
        None => Ok(false),
        Some(Value::Bool(flag)) => Ok(flag),
        Some(_) => Err(ProtocolError::InvalidField(DIRECT_FIELD)),
    }
}
