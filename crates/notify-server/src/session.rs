//! Per-session I/O.
//!
//! Each accepted connection gets:
//! - a writer task draining its outbound channel onto the socket,
//! - a reader loop (this task) decoding client messages into hub requests.
//!
//! The wire mode (length-prefixed frames or JSON lines) is detected from the
//! first byte and used for both directions.

use bytes::BytesMut;
use notify_core::{ServerMessage, SessionId, TransportState};
use notify_protocol::{
    decode_client, encode_frame, encode_line, encode_server, FrameDecoder, LineDecoder,
    ProtocolError, WireMode,
};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::types::{HubRequest, HubTx, OutboundRx, SessionRegistry};

const READ_BUFFER_CAPACITY: usize = 8 * 1024;

/// Run the I/O loops for a single session until its transport closes.
///
/// The session must already be in `sessions` and announced to the hub via
/// `HubRequest::Connect`. On exit it is removed from both.
///
/// A peer that sends nothing for `idle_timeout` (including before its first
/// byte) is treated as gone and the session is closed.
pub async fn run_session(
    session: SessionId,
    stream: TcpStream,
    hub_tx: HubTx,
    out_rx: OutboundRx,
    sessions: SessionRegistry,
    idle_timeout: Duration,
) {
    let result = serve(session, stream, &hub_tx, out_rx, idle_timeout).await;

    match result {
        Ok(()) => info!(session = %session, state = ?TransportState::Closed, "session closed"),
        Err(e) => warn!(
            session = %session,
            state = ?TransportState::Closed,
            error = %e,
            "session closed with error"
        ),
    }

    // Dropping the registry entry drops the last outbound sender, which
    // ends the writer task.
    {
        let mut guard = sessions.write().await;
        guard.remove(&session);
    }
    let _ = hub_tx.send(HubRequest::Disconnect { session });
}

async fn serve(
    session: SessionId,
    stream: TcpStream,
    hub_tx: &HubTx,
    out_rx: OutboundRx,
    idle_timeout: Duration,
) -> anyhow::Result<()> {
    let mut first_byte = [0u8; 1];
    let Ok(peeked) = timeout(idle_timeout, stream.peek(&mut first_byte)).await else {
        info!(session = %session, "no data before idle timeout, closing");
        return Ok(());
    };
    if peeked? == 0 {
        // closed before sending anything
        return Ok(());
    }
    let mode = WireMode::detect(first_byte[0]);
    debug!(session = %session, mode = ?mode, state = ?TransportState::Open, "wire mode detected");

    let (read_half, write_half) = stream.into_split();

    let _writer_handle = tokio::spawn(run_writer(session, write_half, mode, out_rx));

    run_reader(session, read_half, mode, hub_tx, idle_timeout).await?;
    Ok(())
}

async fn run_reader(
    session: SessionId,
    mut read_half: OwnedReadHalf,
    mode: WireMode,
    hub_tx: &HubTx,
    idle_timeout: Duration,
) -> anyhow::Result<()> {
    let mut buffer = BytesMut::with_capacity(READ_BUFFER_CAPACITY);

    loop {
        while let Some(body) = next_body(mode, &mut buffer)? {
            match decode_client(&body) {
                Ok(msg) => {
                    if hub_tx.send(HubRequest::Client { session, msg }).is_err() {
                        warn!(session = %session, "hub channel closed");
                        return Ok(());
                    }
                }
                Err(e) => {
                    // framing is intact, only this message is bad
                    warn!(session = %session, error = %e, "invalid client message skipped");
                }
            }
        }

        let Ok(read) = timeout(idle_timeout, read_half.read_buf(&mut buffer)).await else {
            info!(session = %session, idle = ?idle_timeout, "session idle, closing");
            return Ok(());
        };
        if read? == 0 {
            // EOF - client disconnected
            return Ok(());
        }
    }
}

fn next_body(mode: WireMode, buffer: &mut BytesMut) -> Result<Option<BytesMut>, ProtocolError> {
    match mode {
        WireMode::Framed => FrameDecoder::new().decode(buffer),
        WireMode::Line => LineDecoder::new().decode(buffer),
    }
}

async fn run_writer(
    session: SessionId,
    mut write_half: OwnedWriteHalf,
    mode: WireMode,
    mut out_rx: OutboundRx,
) {
    let mut out = BytesMut::with_capacity(READ_BUFFER_CAPACITY);

    while let Some(msg) = out_rx.recv().await {
        out.clear();
        if let Err(e) = encode_message(&msg, mode, &mut out) {
            warn!(session = %session, error = %e, "failed to encode outbound message");
            continue;
        }

        if let Err(e) = write_half.write_all(&out).await {
            debug!(session = %session, error = %e, "write failed, stopping writer");
            break;
        }
    }
}

fn encode_message(
    msg: &ServerMessage,
    mode: WireMode,
    out: &mut BytesMut,
) -> Result<(), ProtocolError> {
    let body = encode_server(msg)?;
    match mode {
        WireMode::Framed => encode_frame(&body, out),
        WireMode::Line => encode_line(&body, out),
    }
}
