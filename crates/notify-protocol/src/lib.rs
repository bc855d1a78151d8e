//! notify-protocol
//!
//! Wire-level encoding/decoding for the notification server.
//!
//! This crate is responsible for turning logical messages
//! (`notify_core::ClientMessage` / `ServerMessage`) into bytes and back.
//!
//! - [`json_codec`]  : JSON message bodies (one message per buffer)
//! - [`frame_codec`] : u32 length-prefixed framing (default transport)
//! - [`line_codec`]  : newline-delimited JSON (netcat / debugging)

pub mod wire_types;
pub mod json_codec;
pub mod frame_codec;
pub mod line_codec;
pub mod error;

pub use error::ProtocolError;
pub use wire_types::{WireEvent, WireMode};

pub use json_codec::{
    decode_client,
    decode_server,
    decode_trigger,
    encode_client,
    encode_server,
    encode_trigger,
};

pub use frame_codec::{encode_frame, FrameDecoder};
pub use line_codec::{encode_line, LineDecoder};
