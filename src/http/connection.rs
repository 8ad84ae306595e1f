//! Per-connection message loop for the `/mcp` WebSocket transport

use std::{
    any::Any,
    net::SocketAddr,
    panic::{self, AssertUnwindSafe},
};

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::errors::RpcError;
use crate::mcp::{rpc::Envelope, server::dispatch};
use crate::registry::ConnectionRegistry;

/// Serves one upgraded connection until the peer closes it, a read or write
/// fails, an inbound message cannot be parsed, or the server severs it.
pub async fn run_connection(
    mut socket: WebSocket,
    registry: ConnectionRegistry,
    peer: Option<SocketAddr>,
) {
    let mut guard = registry.register(peer);
    let connection_id = guard.id();
    info!(
        connection_id,
        peer = ?peer,
        clients = registry.count(),
        "client connected"
    );

    loop {
        let message = tokio::select! {
            message = socket.recv() => message,
            () = guard.severed() => {
                warn!(connection_id, "severing connection for shutdown");
                break;
            }
        };

        let parsed = match message {
            Some(Ok(Message::Text(text))) => serde_json::from_str::<Envelope>(text.as_str()),
            Some(Ok(Message::Binary(bytes))) => serde_json::from_slice::<Envelope>(&bytes),
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(err)) => {
                warn!(connection_id, error = %err, "failed to read message");
                break;
            }
        };

        let envelope = match parsed {
            Ok(envelope) => envelope,
            Err(err) => {
                error!(connection_id, error = %err, "failed to parse message");
                break;
            }
        };

        debug!(connection_id, method = ?envelope.method, id = ?envelope.id, "received message");

        let Some(response) = respond(envelope, dispatch) else {
            continue;
        };

        let text = match serde_json::to_string(&response) {
            Ok(text) => text,
            Err(err) => {
                error!(connection_id, error = %err, "failed to encode response");
                break;
            }
        };

        if let Err(err) = socket.send(Message::Text(text.into())).await {
            warn!(connection_id, error = %err, "failed to send response");
            break;
        }
    }

    let duration_ms = registry
        .connection(connection_id)
        .map(|info| (Utc::now() - info.connected_at).num_milliseconds());
    drop(guard);
    info!(
        connection_id,
        duration_ms = ?duration_ms,
        clients = registry.count(),
        "client disconnected"
    );
}

/// Runs `route` on the envelope, turning a handler panic into an internal-error
/// response for the same request id.
pub fn respond(
    envelope: Envelope,
    route: impl FnOnce(Envelope) -> Option<Envelope>,
) -> Option<Envelope> {
    let id = envelope.id.clone();

    match panic::catch_unwind(AssertUnwindSafe(|| route(envelope))) {
        Ok(response) => response,
        Err(payload) => {
            let reason = panic_reason(payload.as_ref());
            error!(id = ?id, reason = %reason, "handler panicked");
            id.is_some()
                .then(|| Envelope::error(id, RpcError::internal(reason)))
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(reason) = payload.downcast_ref::<&str>() {
        return (*reason).to_string();
    }

    payload
        .downcast_ref::<String>()
        .cloned()
        .unwrap_or_else(|| "handler panicked".to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn routed_response_is_returned_unchanged() {
        let request = Envelope::request(Some(1_i64.into()), "tools/list", None);
        let response = respond(request, dispatch).expect("response");

        assert!(response.result.is_some());
        assert_eq!(response.id, Some(1_i64.into()));
    }

    #[test]
    fn handler_panic_becomes_internal_error() {
        let request = Envelope::request(Some("p-1".into()), "tools/call", Some(json!({})));
        let response = respond(request, |_| panic!("tool exploded")).expect("response");

        assert_eq!(response.id, Some("p-1".into()));
        assert!(response.result.is_none());
        let error = response.error.expect("error");
        assert_eq!(error.code, -32603);
        assert!(error.message.contains("tool exploded"));
    }

    #[test]
    fn panicking_notification_stays_silent() {
        let notification = Envelope::request(None, "tools/call", None);
        assert!(respond(notification, |_| panic!("ignored")).is_none());
    }
}
