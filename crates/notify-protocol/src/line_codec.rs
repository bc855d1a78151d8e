//! Newline-delimited JSON.
//!
//! Lets a human talk to the server with `nc`:
//!
//! ```text
//! {"event":"announce","data":{"userId":"p1","role":"player"}}
//! ```
//!
//! Blank lines are skipped; `\r\n` endings are accepted.

use bytes::{Buf, BytesMut};

use crate::error::ProtocolError;
use crate::wire_types::MAX_FRAME_LEN;

/// Append `body` followed by `\n` to `out`.
pub fn encode_line(body: &[u8], out: &mut BytesMut) -> Result<(), ProtocolError> {
    if body.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(body.len()));
    }
    out.extend_from_slice(body);
    out.extend_from_slice(b"\n");
    Ok(())
}

/// Incremental line decoder.
#[derive(Debug, Clone, Copy)]
pub struct LineDecoder {
    max_len: usize,
}

impl Default for LineDecoder {
    fn default() -> Self {
        LineDecoder {
            max_len: MAX_FRAME_LEN,
        }
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        LineDecoder::default()
    }

    /// Pop the next non-blank line (without its terminator) from `buf`.
    pub fn decode(&self, buf: &mut BytesMut) -> Result<Option<BytesMut>, ProtocolError> {
        loop {
            let Some(newline_pos) = buf.iter().position(|&b| b == b'\n') else {
                if buf.len() > self.max_len {
                    return Err(ProtocolError::FrameTooLarge(buf.len()));
                }
                return Ok(None);
            };

            if newline_pos > self.max_len {
                return Err(ProtocolError::FrameTooLarge(newline_pos));
            }

            let mut line = buf.split_to(newline_pos);
            buf.advance(1);

            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(Some(line));
        }
    }
}
