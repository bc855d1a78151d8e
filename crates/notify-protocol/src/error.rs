//! Protocol errors.

use thiserror::Error;

use crate::wire_types::MAX_FRAME_LEN;

/// Errors that can arise when encoding/decoding a message or a frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame or line larger than [`MAX_FRAME_LEN`].
    #[error("frame of {0} bytes exceeds maximum of {max}", max = MAX_FRAME_LEN)]
    FrameTooLarge(usize),

    /// Unknown event name, or an event not valid in this direction.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// A required field is missing or malformed.
    #[error("invalid field: {0}")]
    InvalidField(&'static str),

    /// Body is not valid JSON or does not match the payload shape.
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}
