// crates/notify-client/src/config.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::queue::QueuePolicy;
use crate::transport::TransportConfig;

/// Configuration for the notification client, loaded from TOML.
///
/// Every field is optional in the file; missing ones take the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_addr: String,
    pub identity_file: PathBuf,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub heartbeat_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_pending: usize,
    pub max_pending_age_secs: u64,
    pub dedup_window_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:9400".to_string(),
            identity_file: PathBuf::from("notify-identity.json"),
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            heartbeat_secs: 30,
            connect_timeout_secs: 10,
            max_pending: 256,
            max_pending_age_secs: 300,
            dedup_window_secs: 10,
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            server_addr: self.server_addr.clone(),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            heartbeat_interval: Duration::from_secs(self.heartbeat_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }

    pub fn queue_policy(&self) -> QueuePolicy {
        QueuePolicy {
            max_pending: self.max_pending,
            max_age: Duration::from_secs(self.max_pending_age_secs),
        }
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_secs(self.dedup_window_secs)
    }
}
