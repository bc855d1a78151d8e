//! notify-server
//!
//! Multi-session async TCP server that pushes user-targeted notifications.

pub mod config;
pub mod types;
pub mod server;
pub mod notifier;
pub mod trigger;

// these are internal modules, not re-exported
mod session;
mod hub_task;

pub use config::Config;
pub use notifier::Notifier;
pub use server::Server;
