// crates/notify-client/src/main.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use notify_client::{app, toast, ClientConfig, IdentityStore, NotificationApp, TransportManager};
use notify_core::Identity;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(name = "notify-client")]
#[clap(about = "Console client for the notification server")]
struct Cli {
    /// TOML config file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Server address (overrides the config file)
    #[clap(short, long)]
    server: Option<String>,

    /// Log in as this user (requires --role)
    #[clap(short, long, requires = "role")]
    user_id: Option<String>,

    /// Role for --user-id (player, parent, coach, scout, admin)
    #[clap(short, long)]
    role: Option<String>,

    /// Where the logged-in identity is persisted
    #[clap(long)]
    identity_file: Option<PathBuf>,

    /// Forget the stored identity and exit
    #[clap(long)]
    logout: bool,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(server) = cli.server {
        config.server_addr = server;
    }
    if let Some(path) = cli.identity_file {
        config.identity_file = path;
    }

    let store = IdentityStore::new(config.identity_file.clone());

    if cli.logout {
        store.clear().context("failed to clear stored identity")?;
        println!("Logged out");
        return Ok(());
    }

    if let (Some(user_id), Some(role)) = (cli.user_id.as_deref(), cli.role.as_deref()) {
        let identity = Identity::parse(user_id, role).context("invalid identity")?;
        store.save(&identity).context("failed to persist identity")?;
    }

    let identity = match store.load() {
        Ok(identity) => identity,
        Err(e) => {
            warn!(error = %e, "ignoring unreadable identity file");
            None
        }
    };

    let mut app = NotificationApp::new(config.queue_policy());
    let _toasts = toast::install(app.queue(), config.dedup_window());
    println!("{}", app::login_status(identity.as_ref()));
    if let Some(identity) = &identity {
        app.queue_mut().initialize(identity.user_id.clone());
    }

    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
    let (handle, task) = TransportManager::spawn(config.transport(), store, inbound_tx);

    println!("Commands: whoami, reconnect, logout, quit");
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            msg = inbound_rx.recv() => match msg {
                Some(msg) => app.handle_server_message(msg),
                None => break,
            },

            line = stdin.next_line() => match line {
                Ok(Some(line)) => match line.trim() {
                    "whoami" => handle.who_am_i(),
                    "reconnect" => handle.force_reconnect(),
                    "logout" => {
                        handle.logout();
                        break;
                    }
                    "quit" | "exit" => break,
                    "" => {}
                    other => println!("Unknown command: {}", other),
                },
                Ok(None) => break,
                Err(e) => {
                    warn!("stdin error: {}", e);
                    break;
                }
            },

            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    app.queue_mut().teardown();
    handle.shutdown();
    let _ = task.await;

    Ok(())
}
