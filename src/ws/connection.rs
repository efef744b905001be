//! Persistent connection read/write loop.
//!
//! Each accepted WebSocket is registered in the worker's
//! [`ConnectionRegistry`](crate::domain::ConnectionRegistry), receives an
//! initial `items` + `msgs` sync, and then multiplexes two streams:
//! client frames (dispatched to the storefront) and its own outbound queue
//! (written to the socket in FIFO order).

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::app_state::AppState;
use crate::domain::{ClientEvent, ConnectionId, NewCatalogItem, NewChatMessage, ServerEvent, SessionId};
use crate::error::GatewayError;

/// Runs the read/write loop for a single WebSocket connection.
///
/// The connection is unregistered as soon as the loop exits, whether the
/// client closed, the transport failed, or a write errored.
pub async fn run_connection(socket: WebSocket, state: AppState, session_id: Option<SessionId>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (outbox, mut inbox) = mpsc::unbounded_channel();
    let connection_id = state.registry.register(session_id, outbox);
    tracing::info!(%connection_id, "client connected");

    state.broadcaster.sync_connection(connection_id).await;

    loop {
        tokio::select! {
            // Incoming frame from the client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        dispatch_client_text(&state, connection_id, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(%connection_id, error = %e, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            // Queued event for this connection
            Some(event) = inbox.recv() => {
                let json = match serde_json::to_string(&*event) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(%connection_id, error = %e, "failed to serialize event");
                        continue;
                    }
                };
                if ws_tx.send(Message::text(json)).await.is_err() {
                    tracing::debug!(%connection_id, event = event.name(), "ws write failed");
                    break;
                }
            }
        }
    }

    state.registry.unregister(connection_id);
    tracing::info!(%connection_id, "client disconnected");
}

/// Handles one text frame from `connection_id`.
///
/// Successful writes fan out through the broadcast engine. Failures are
/// reported to the sending connection only, as an `error` event.
pub async fn dispatch_client_text(state: &AppState, connection_id: ConnectionId, text: &str) {
    let outcome = match serde_json::from_str::<ClientEvent>(text) {
        Ok(ClientEvent::NewItem(data)) => submit_item(state, data).await,
        Ok(ClientEvent::NewMsg(data)) => submit_message(state, data).await,
        Err(e) => Err(GatewayError::InvalidRequest(format!("malformed event: {e}"))),
    };

    if let Err(err) = outcome {
        tracing::warn!(%connection_id, error = %err, "client event rejected");
        state
            .registry
            .send(connection_id, Arc::new(ServerEvent::from(&err)));
    }
}

async fn submit_item(state: &AppState, data: serde_json::Value) -> Result<(), GatewayError> {
    let item = NewCatalogItem::from_value(data)?;
    state.storefront.submit_item(item).await.map(|_| ())
}

async fn submit_message(state: &AppState, data: serde_json::Value) -> Result<(), GatewayError> {
    let message = NewChatMessage::from_value(data)?;
    state.storefront.submit_message(message).await.map(|_| ())
}
