//! notify-client
//!
//! Client side of the notification layer:
//! - [`transport`]: keeps one connection alive, reconnects with backoff and
//!   re-announces the stored identity after every reconnect
//! - [`queue`] / [`subscribers`]: buffers events until the consuming
//!   feature initializes, then dispatches to per-kind callbacks
//! - [`dedup`]: short window for suppressing dual-path duplicates

pub mod app;
pub mod backoff;
pub mod config;
pub mod connection;
pub mod dedup;
pub mod identity_store;
pub mod queue;
pub mod subscribers;
pub mod toast;
pub mod transport;

pub use app::NotificationApp;
pub use backoff::Backoff;
pub use config::ClientConfig;
pub use dedup::RecentEvents;
pub use identity_store::{IdentityStore, IdentityStoreError};
pub use queue::{NotificationQueue, PendingNotification, QueuePolicy};
pub use subscribers::{SubscriberRegistry, Subscription};
pub use transport::{
    ClientTransportState, TransportCommand, TransportConfig, TransportHandle, TransportManager,
};
