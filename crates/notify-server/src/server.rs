//! TCP listener and top-level server wiring.
//!
//! This module:
//! - Listens on the configured address/port.
//! - Accepts new TCP connections.
//! - Assigns each connection a `SessionId`.
//! - Spawns:
//!   - a per-session task to handle I/O,
//!   - a single central hub task that owns `NotificationHub`,
//!   - optionally, the trigger ingress listener.
//!
//! The per-session logic and hub loop live in `session` and `hub_task`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use notify_core::{SessionId, TransportState};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::hub_task;
use crate::notifier::Notifier;
use crate::session;
use crate::trigger;
use crate::types::{HubRequest, HubRx, HubTx, OutboundRx, OutboundTx, SessionRegistry};

/// Process-wide counter for assigning unique `SessionId`s.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
}

/// A bound, not yet running, notification server.
pub struct Server {
    config: Config,
    listener: TcpListener,
    sessions: SessionRegistry,
    hub_tx: HubTx,
    hub_rx: HubRx,
}

impl Server {
    /// Bind the session listener.
    pub async fn bind(config: Config) -> anyhow::Result<Self> {
        let addr = config.socket_addr_string();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        let (hub_tx, hub_rx) = mpsc::unbounded_channel();

        Ok(Server {
            config,
            listener,
            sessions: Arc::new(RwLock::new(Default::default())),
            hub_tx,
            hub_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Delivery handle for trigger points. Works before and after `run`.
    pub fn notifier(&self) -> Notifier {
        Notifier::new(self.hub_tx.clone())
    }

    /// Spawn the hub task and accept sessions forever.
    pub async fn run(self) -> anyhow::Result<()> {
        let Server {
            config,
            listener,
            sessions,
            hub_tx,
            hub_rx,
        } = self;

        info!(addr = %listener.local_addr()?, "listening for sessions");

        {
            let sessions = sessions.clone();
            let direct_path = config.direct_path;
            tokio::spawn(async move {
                hub_task::run_hub_loop(hub_rx, sessions, direct_path).await;
            });
        }

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            let current_sessions = {
                let guard = sessions.read().await;
                guard.len()
            };

            if current_sessions >= config.max_sessions {
                warn!(
                    peer = %peer_addr,
                    max_sessions = config.max_sessions,
                    "rejecting connection: max_sessions reached"
                );
                // Just drop the stream; client will see the connection close.
                continue;
            }

            if let Err(e) = stream.set_nodelay(true) {
                debug!(peer = %peer_addr, error = %e, "set_nodelay failed");
            }

            let session = next_session_id();
            debug!(
                session = %session,
                peer = %peer_addr,
                state = ?TransportState::Connecting,
                "accepted connection"
            );

            let (out_tx, out_rx): (OutboundTx, OutboundRx) = mpsc::unbounded_channel();

            {
                let mut guard = sessions.write().await;
                guard.insert(session, out_tx);
            }

            if hub_tx.send(HubRequest::Connect { session }).is_err() {
                anyhow::bail!("hub task stopped");
            }

            let sessions_clone = sessions.clone();
            let hub_tx_clone = hub_tx.clone();
            let idle_timeout = config.session_idle_timeout;

            tokio::spawn(async move {
                session::run_session(
                    session,
                    stream,
                    hub_tx_clone,
                    out_rx,
                    sessions_clone,
                    idle_timeout,
                )
                .await;
            });
        }
    }
}

/// Bind everything the configuration asks for and run until an error.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let trigger_port = config.trigger_port;
    let server = Server::bind(config).await?;

    if let Some(port) = trigger_port {
        let listener = trigger::bind(port).await?;
        let notifier = server.notifier();
        tokio::spawn(async move {
            if let Err(e) = trigger::run_trigger_listener(listener, notifier).await {
                warn!(error = %e, "trigger ingress stopped");
            }
        });
    }

    server.run().await
}
