//! Client transport manager.
//!
//! Owns the single client-side connection and keeps it alive:
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> (drop) -> Disconnected
//!      ^                                                   |
//!      +------------------- backoff delay -----------------+
//! ```
//!
//! - Every transition into `Connected` re-announces the identity held in
//!   the [`IdentityStore`], so the server rebuilds room membership.
//! - Retries never give up. Only `logout`/`shutdown` (or dropping every
//!   [`TransportHandle`]) stops the loop.
//! - `force_reconnect` skips the remaining backoff while disconnected and is
//!   a no-op while connected.

use std::time::Duration;

use notify_core::{ClientMessage, Identity, ServerMessage};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, timeout, Instant};
use tracing::{debug, error, info, trace, warn};

use crate::backoff::Backoff;
use crate::connection::Connection;
use crate::identity_store::IdentityStore;

const MIN_HEARTBEAT: Duration = Duration::from_millis(100);

/// Connection state as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientTransportState {
    Disconnected,
    Connecting,
    Connected,
}

/// Commands accepted by a running [`TransportManager`].
#[derive(Debug, Clone)]
pub enum TransportCommand {
    /// Reconnect now if disconnected; ignored while connected.
    ForceReconnect,
    /// Ask the server for this session's rooms.
    WhoAmI,
    /// Persist a new identity and announce it (now if connected, otherwise
    /// on the next connect).
    Login(Identity),
    /// Forget the stored identity and stop.
    Logout,
    /// Stop, keeping the stored identity.
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub server_addr: String,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub heartbeat_interval: Duration,
    pub connect_timeout: Duration,
}

impl TransportConfig {
    pub fn new(server_addr: impl Into<String>) -> Self {
        TransportConfig {
            server_addr: server_addr.into(),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            heartbeat_interval: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Cloneable handle to a running transport manager.
#[derive(Debug, Clone)]
pub struct TransportHandle {
    cmd_tx: UnboundedSender<TransportCommand>,
    state_rx: watch::Receiver<ClientTransportState>,
}

impl TransportHandle {
    pub fn state(&self) -> ClientTransportState {
        *self.state_rx.borrow()
    }

    /// Watch channel of state transitions.
    pub fn watch_state(&self) -> watch::Receiver<ClientTransportState> {
        self.state_rx.clone()
    }

    /// Resolve once the manager reaches `state`. Returns `false` if the
    /// manager stopped first.
    pub async fn wait_for(&self, state: ClientTransportState) -> bool {
        let mut rx = self.state_rx.clone();
        let reached = rx.wait_for(|current| *current == state).await.is_ok();
        reached
    }

    pub fn force_reconnect(&self) {
        self.command(TransportCommand::ForceReconnect);
    }

    pub fn who_am_i(&self) {
        self.command(TransportCommand::WhoAmI);
    }

    pub fn login(&self, identity: Identity) {
        self.command(TransportCommand::Login(identity));
    }

    pub fn logout(&self) {
        self.command(TransportCommand::Logout);
    }

    pub fn shutdown(&self) {
        self.command(TransportCommand::Shutdown);
    }

    fn command(&self, cmd: TransportCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            debug!("transport manager already stopped");
        }
    }
}

enum SessionEnd {
    Dropped,
    Stop,
}

enum Connect {
    Open(Connection),
    Failed,
    Stop,
}

enum Offline {
    Continue,
    Reconnect,
    Stop,
}

pub struct TransportManager {
    config: TransportConfig,
    identity_store: IdentityStore,
    inbound_tx: UnboundedSender<ServerMessage>,
    cmd_rx: UnboundedReceiver<TransportCommand>,
    state_tx: watch::Sender<ClientTransportState>,
    backoff: Backoff,
}

impl TransportManager {
    /// Start the manager on the current tokio runtime.
    ///
    /// Server messages (except keep-alive pongs) are forwarded to
    /// `inbound_tx` in arrival order.
    pub fn spawn(
        config: TransportConfig,
        identity_store: IdentityStore,
        inbound_tx: UnboundedSender<ServerMessage>,
    ) -> (TransportHandle, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ClientTransportState::Disconnected);

        let manager = TransportManager {
            backoff: Backoff::new(config.initial_backoff, config.max_backoff),
            config,
            identity_store,
            inbound_tx,
            cmd_rx,
            state_tx,
        };

        let task = tokio::spawn(manager.run());
        (TransportHandle { cmd_tx, state_rx }, task)
    }

    async fn run(mut self) {
        loop {
            self.set_state(ClientTransportState::Connecting);
            info!("Connecting to {}...", self.config.server_addr);

            match self.connect().await {
                Connect::Open(mut conn) => {
                    self.backoff.reset();
                    self.set_state(ClientTransportState::Connected);
                    info!("Connected successfully");

                    match self.serve(&mut conn).await {
                        SessionEnd::Stop => break,
                        SessionEnd::Dropped => warn!("Connection lost, attempting to reconnect..."),
                    }
                }
                Connect::Failed => {}
                Connect::Stop => break,
            }

            self.set_state(ClientTransportState::Disconnected);
            let delay = self.backoff.next_delay();
            if !self.wait_backoff(delay).await {
                break;
            }
        }

        self.set_state(ClientTransportState::Disconnected);
        info!("transport stopped");
    }

    /// One connect attempt, serving commands while it is in flight.
    ///
    /// Commands win over a finished connect, so a logout issued while
    /// connecting is never followed by an announce.
    async fn connect(&mut self) -> Connect {
        let addr = self.config.server_addr.clone();
        let connecting = timeout(self.config.connect_timeout, Connection::connect(&addr));
        tokio::pin!(connecting);

        loop {
            tokio::select! {
                biased;

                cmd = self.cmd_rx.recv() => {
                    if let Offline::Stop = self.handle_offline(cmd) {
                        return Connect::Stop;
                    }
                }
                result = &mut connecting => {
                    return match result {
                        Ok(Ok(conn)) => Connect::Open(conn),
                        Ok(Err(e)) => {
                            let attempt = self.backoff.attempts() + 1;
                            error!(attempt, "Connection failed: {}", e);
                            Connect::Failed
                        }
                        Err(_) => {
                            let attempt = self.backoff.attempts() + 1;
                            error!(attempt, "Connection timed out");
                            Connect::Failed
                        }
                    };
                }
            }
        }
    }

    /// Drive one live connection until it drops or we are told to stop.
    async fn serve(&mut self, conn: &mut Connection) -> SessionEnd {
        // Commands that raced the connect are applied before announcing.
        let mut who_am_i = false;
        while let Ok(cmd) = self.cmd_rx.try_recv() {
            match cmd {
                TransportCommand::WhoAmI => who_am_i = true,
                other => {
                    if let Offline::Stop = self.handle_offline(Some(other)) {
                        return SessionEnd::Stop;
                    }
                }
            }
        }

        if let Err(e) = self.announce_stored(conn).await {
            warn!("Announce failed: {}", e);
            return SessionEnd::Dropped;
        }
        if who_am_i {
            if let Err(e) = conn.send(&ClientMessage::WhoAmI).await {
                warn!("Failed to send message: {}", e);
                return SessionEnd::Dropped;
            }
        }

        let period = self.config.heartbeat_interval.max(MIN_HEARTBEAT);
        let mut heartbeat = interval_at(Instant::now() + period, period);
        let mut last_seen = Instant::now();

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    let outcome = match cmd {
                        Some(TransportCommand::ForceReconnect) => {
                            debug!("already connected, force_reconnect ignored");
                            Ok(())
                        }
                        Some(TransportCommand::WhoAmI) => conn.send(&ClientMessage::WhoAmI).await,
                        Some(TransportCommand::Login(identity)) => {
                            self.persist(&identity);
                            conn.send(&ClientMessage::Announce(identity)).await
                        }
                        Some(TransportCommand::Logout) => {
                            self.forget();
                            return SessionEnd::Stop;
                        }
                        Some(TransportCommand::Shutdown) | None => return SessionEnd::Stop,
                    };
                    if let Err(e) = outcome {
                        error!("Failed to send message: {}", e);
                        return SessionEnd::Dropped;
                    }
                }

                _ = heartbeat.tick() => {
                    if last_seen.elapsed() > period * 2 {
                        warn!("no traffic from server for {:?}", last_seen.elapsed());
                        return SessionEnd::Dropped;
                    }
                    if let Err(e) = conn.send(&ClientMessage::Ping).await {
                        warn!("Heartbeat failed: {}", e);
                        return SessionEnd::Dropped;
                    }
                }

                result = conn.read_message() => {
                    match result {
                        Ok(Some(msg)) => {
                            last_seen = Instant::now();
                            self.forward(msg);
                        }
                        Ok(None) => return SessionEnd::Dropped,
                        Err(e) => {
                            error!("Read error: {}", e);
                            return SessionEnd::Dropped;
                        }
                    }
                }
            }
        }
    }

    /// Wait out a backoff delay while still serving commands.
    ///
    /// Returns `false` if the manager should stop.
    async fn wait_backoff(&mut self, delay: Duration) -> bool {
        debug!(delay_ms = delay.as_millis() as u64, "waiting before reconnect");
        let deadline = Instant::now() + delay;

        loop {
            tokio::select! {
                _ = sleep_until(deadline) => return true,
                cmd = self.cmd_rx.recv() => match self.handle_offline(cmd) {
                    Offline::Continue => {}
                    Offline::Reconnect => {
                        info!("forced reconnect, skipping backoff");
                        return true;
                    }
                    Offline::Stop => return false,
                },
            }
        }
    }

    /// Apply a command received while no connection is open.
    fn handle_offline(&self, cmd: Option<TransportCommand>) -> Offline {
        match cmd {
            Some(TransportCommand::ForceReconnect) => Offline::Reconnect,
            Some(TransportCommand::Login(identity)) => {
                // announced on the next connect
                self.persist(&identity);
                Offline::Continue
            }
            Some(TransportCommand::WhoAmI) => {
                debug!("not connected, who_am_i ignored");
                Offline::Continue
            }
            Some(TransportCommand::Logout) => {
                self.forget();
                Offline::Stop
            }
            Some(TransportCommand::Shutdown) | None => Offline::Stop,
        }
    }

    async fn announce_stored(&mut self, conn: &mut Connection) -> anyhow::Result<()> {
        match self.identity_store.load() {
            Ok(Some(identity)) => {
                info!(user_id = %identity.user_id, role = %identity.role, "announcing identity");
                conn.send(&ClientMessage::Announce(identity)).await
            }
            Ok(None) => {
                info!("no stored identity, session stays unannounced");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "could not read stored identity, session stays unannounced");
                Ok(())
            }
        }
    }

    fn forward(&self, msg: ServerMessage) {
        if msg == ServerMessage::Pong {
            trace!("pong");
            return;
        }
        if let Err(e) = self.inbound_tx.send(msg) {
            debug!("inbound receiver dropped: {}", e);
        }
    }

    fn persist(&self, identity: &Identity) {
        if let Err(e) = self.identity_store.save(identity) {
            warn!(error = %e, "failed to persist identity");
        }
    }

    fn forget(&self) {
        if let Err(e) = self.identity_store.clear() {
            warn!(error = %e, "failed to clear stored identity");
        }
    }

    fn set_state(&self, state: ClientTransportState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!(from = ?previous, to = ?state, "transport state");
        }
    }
}
