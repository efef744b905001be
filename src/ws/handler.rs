//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::SignedCookieJar;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::{SESSION_COOKIE, SessionId};

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// The session cookie, if present and correctly signed, is recorded on the
/// connection. It is not required: anonymous clients still get the live
/// catalog and chat.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> impl IntoResponse {
    let session_id = jar
        .get(SESSION_COOKIE)
        .map(|cookie| SessionId::from(cookie.value().to_string()));

    ws.on_upgrade(move |socket| run_connection(socket, state, session_id))
}
