//! Trigger ingress.
//!
//! A loopback-only listener for persistence-layer collaborators. Each line
//! is one delivery request:
//!
//! ```text
//! {"userId":"p1","event":"mediaApproved","data":{"mediaId":"m1","title":"Six hit"}}
//! ```
//!
//! Every line is answered with `ok` or `error: <reason>`. An `ok` only means
//! the request was handed to the hub; delivery itself stays fire-and-forget.

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Context;
use bytes::BytesMut;
use notify_protocol::{decode_trigger, LineDecoder};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::notifier::Notifier;

/// Bind the trigger listener on `127.0.0.1:port`.
pub async fn bind(port: u16) -> anyhow::Result<TcpListener> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind trigger ingress on {addr}"))
}

/// Accept trigger connections forever.
pub async fn run_trigger_listener(listener: TcpListener, notifier: Notifier) -> anyhow::Result<()> {
    info!(addr = %listener.local_addr()?, "listening for triggers");

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let notifier = notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, notifier).await {
                debug!(peer = %peer_addr, error = %e, "trigger connection ended with error");
            }
        });
    }
}

async fn handle_connection(mut stream: TcpStream, notifier: Notifier) -> anyhow::Result<()> {
    let decoder = LineDecoder::new();
    let mut buffer = BytesMut::with_capacity(4096);

    loop {
        while let Some(line) = decoder.decode(&mut buffer)? {
            let reply = match decode_trigger(&line) {
                Ok((user_id, event)) => {
                    debug!(user_id = %user_id, event = %event.kind(), "trigger accepted");
                    notifier.deliver(user_id, event);
                    "ok\n".to_string()
                }
                Err(e) => {
                    warn!(error = %e, "invalid trigger");
                    format!("error: {e}\n")
                }
            };
            stream.write_all(reply.as_bytes()).await?;
        }

        if stream.read_buf(&mut buffer).await? == 0 {
            return Ok(());
        }
    }
}
