//! Length-prefixed framing.
//!
//! ```text
//! [0..4] : body length (u32 BE)
//! [4..]  : body (JSON, see `json_codec`)
//! ```
//!
//! Zero-length frames are legal and skipped by the decoder.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::ProtocolError;
use crate::wire_types::{FRAME_HEADER_LEN, MAX_FRAME_LEN};

/// Append one frame (header + body) to `out`.
pub fn encode_frame(body: &[u8], out: &mut BytesMut) -> Result<(), ProtocolError> {
    if body.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(body.len()));
    }
    out.reserve(FRAME_HEADER_LEN + body.len());
    out.put_u32(body.len() as u32);
    out.extend_from_slice(body);
    Ok(())
}

/// Incremental frame decoder.
///
/// Feed bytes into a `BytesMut` as they arrive and call [`decode`] until it
/// returns `Ok(None)`. Partial frames stay in the buffer, so reading more
/// bytes and retrying is always safe.
///
/// [`decode`]: FrameDecoder::decode
#[derive(Debug, Clone, Copy)]
pub struct FrameDecoder {
    max_len: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        FrameDecoder {
            max_len: MAX_FRAME_LEN,
        }
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        FrameDecoder::default()
    }

    /// Pop the next complete frame body from `buf`.
    ///
    /// An oversized length header is an unrecoverable error: the stream has
    /// lost sync and the connection should be closed.
    pub fn decode(&self, buf: &mut BytesMut) -> Result<Option<BytesMut>, ProtocolError> {
        loop {
            if buf.len() < FRAME_HEADER_LEN {
                return Ok(None);
            }

            let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
            if len > self.max_len {
                return Err(ProtocolError::FrameTooLarge(len));
            }

            if len == 0 {
                buf.advance(FRAME_HEADER_LEN);
                continue;
            }

            if buf.len() < FRAME_HEADER_LEN + len {
                buf.reserve(FRAME_HEADER_LEN + len - buf.len());
                return Ok(None);
            }

            buf.advance(FRAME_HEADER_LEN);
            return Ok(Some(buf.split_to(len)));
        }
    }
}
