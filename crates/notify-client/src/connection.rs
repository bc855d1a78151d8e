// crates/notify-client/src/connection.rs

use anyhow::Result;
use bytes::BytesMut;
use notify_core::{ClientMessage, ServerMessage};
use notify_protocol::{decode_server, encode_client, encode_frame, FrameDecoder};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// One framed connection to the notification server.
pub struct Connection {
    stream: TcpStream,
    read_buffer: BytesMut,
    write_buffer: BytesMut,
    decoder: FrameDecoder,
}

impl Connection {
    pub async fn connect(server_addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(server_addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            read_buffer: BytesMut::with_capacity(65536),
            write_buffer: BytesMut::with_capacity(4096),
            decoder: FrameDecoder::new(),
        })
    }

    pub async fn send(&mut self, msg: &ClientMessage) -> Result<()> {
        let body = encode_client(msg)?;

        self.write_buffer.clear();
        encode_frame(&body, &mut self.write_buffer)?;

        self.stream.write_all(&self.write_buffer).await?;
        self.stream.flush().await?;

        debug!("Sent message: {:?}", msg);
        Ok(())
    }

    /// Next message from the server; `Ok(None)` once the server closes.
    ///
    /// Cancel-safe: partial frames stay buffered between calls, so this can
    /// sit in a `select!` next to timers and commands.
    pub async fn read_message(&mut self) -> Result<Option<ServerMessage>> {
        loop {
            while let Some(frame) = self.decoder.decode(&mut self.read_buffer)? {
                match decode_server(&frame) {
                    Ok(msg) => return Ok(Some(msg)),
                    Err(e) => warn!(error = %e, "undecodable server message skipped"),
                }
            }

            let n = self.stream.read_buf(&mut self.read_buffer).await?;
            if n == 0 {
                return Ok(None); // Connection closed
            }
        }
    }
}
