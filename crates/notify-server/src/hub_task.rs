//! Central hub loop.
//!
//! This task owns the `NotificationHub` instance and processes every
//! `HubRequest` coming from sessions and notifiers, one at a time. That
//! single owner is what keeps the room registry consistent without any
//! lock around it.
//!
//! Routing: each `Outbound` produced by the hub goes to exactly the session
//! it names. Sessions that disappeared between the hub's decision and the
//! send are skipped.

use std::collections::HashMap;

use chrono::Utc;
use notify_core::{NotificationHub, Outbound, SessionId};
use tracing::{debug, info};

use crate::types::{HubRequest, HubRx, OutboundTx, SessionRegistry};

/// Run the central hub processing loop.
///
/// - `hub_rx`: receives requests from all session tasks and notifiers.
/// - `sessions`: registry of live sessions and their outbound channels.
pub async fn run_hub_loop(mut hub_rx: HubRx, sessions: SessionRegistry, direct_path: bool) {
    let mut hub = NotificationHub::new(direct_path);

    while let Some(req) = hub_rx.recv().await {
        let outputs = handle_request(&mut hub, req);

        if outputs.is_empty() {
            continue;
        }

        let guard = sessions.read().await;
        for out in outputs {
            route_output(out, &guard);
        }
    }

    info!("hub loop shutting down (hub_rx closed)");
}

fn handle_request(hub: &mut NotificationHub, req: HubRequest) -> Vec<Outbound> {
    match req {
        HubRequest::Connect { session } => {
            hub.connect(session);
            debug!(
                session = %session,
                sessions = hub.registry().session_count(),
                "session registered"
            );
            Vec::new()
        }
        HubRequest::Client { session, msg } => {
            debug!(session = %session, msg = ?msg, "client message");
            hub.process(session, msg)
        }
        HubRequest::Disconnect { session } => {
            match hub.disconnect(session) {
                Some(identity) => debug!(
                    session = %session,
                    user_id = %identity.user_id,
                    role = %identity.role,
                    "session destroyed"
                ),
                None => debug!(session = %session, "unannounced session destroyed"),
            }
            Vec::new()
        }
        HubRequest::Deliver { user_id, event } => {
            let kind = event.kind();
            let outputs = hub.deliver(&user_id, event, Utc::now());
            if outputs.is_empty() {
                debug!(
                    user_id = %user_id,
                    event = %kind,
                    "no active sessions, notification dropped"
                );
            } else {
                debug!(
                    user_id = %user_id,
                    event = %kind,
                    copies = outputs.len(),
                    "notification routed"
                );
            }
            outputs
        }
    }
}

/// Send a single `Outbound` to its session, if it is still around.
fn route_output(out: Outbound, sessions: &HashMap<SessionId, OutboundTx>) {
    let Outbound { session, message } = out;
    match sessions.get(&session) {
        Some(tx) => {
            if tx.send(message).is_err() {
                debug!(session = %session, "session writer gone, message dropped");
            }
        }
        None => debug!(session = %session, "session unreachable, message dropped"),
    }
}
