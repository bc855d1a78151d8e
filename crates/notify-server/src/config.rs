//! Configuration for the notification server.
//!
//! Defaults can be overridden via environment variables:
//!
//! - `NOTIFY_BIND_ADDR`     (default: "0.0.0.0")
//! - `NOTIFY_PORT`          (default: "9400")
//! - `NOTIFY_MAX_SESSIONS`  (default: "4096")
//! - `NOTIFY_DIRECT_PATH`   (default: "true")
//! - `NOTIFY_TRIGGER_PORT`  (default: unset, trigger ingress disabled)
//! - `NOTIFY_SESSION_IDLE_SECS` (default: "90")

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port for client sessions. `0` picks a free port.
    pub port: u16,

    /// Maximum number of simultaneously connected sessions.
    pub max_sessions: usize,

    /// Also deliver through the per-user direct index (second, flagged copy).
    pub direct_path: bool,

    /// Loopback port for the trigger ingress; `None` disables it.
    pub trigger_port: Option<u16>,

    /// A session that sends nothing for this long is closed. Must stay above
    /// the client heartbeat interval (30 s by default).
    pub session_idle_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0".to_string(),
            port: 9400,
            max_sessions: 4096,
            direct_path: true,
            trigger_port: None,
            session_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl Config {
    /// Construct a `Config` from environment variables, falling back
    /// to the defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();

        let bind_addr = env::var("NOTIFY_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let port = read_env_or_default("NOTIFY_PORT", defaults.port)?;
        let max_sessions = read_env_or_default("NOTIFY_MAX_SESSIONS", defaults.max_sessions)?;
        let direct_path = read_env_or_default("NOTIFY_DIRECT_PATH", defaults.direct_path)?;
        let trigger_port = match env::var("NOTIFY_TRIGGER_PORT") {
            Ok(val) => Some(
                val.parse::<u16>()
                    .with_context(|| format!("invalid NOTIFY_TRIGGER_PORT: {val:?}"))?,
            ),
            Err(_) => None,
        };
        let idle_secs = read_env_or_default(
            "NOTIFY_SESSION_IDLE_SECS",
            defaults.session_idle_timeout.as_secs(),
        )?;

        Ok(Config {
            bind_addr,
            port,
            max_sessions,
            direct_path,
            trigger_port,
            session_idle_timeout: Duration::from_secs(idle_secs),
        })
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn read_env_or_default<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .with_context(|| format!("invalid {key}: {val:?}")),
        Err(_) => Ok(default),
    }
}
