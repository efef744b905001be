//! Chat handlers: list and post.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::NewChatMessage;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /messages` — Full chat history.
///
/// # Errors
///
/// Returns [`GatewayError::PersistenceError`] if the history cannot be read.
#[utoipa::path(
    get,
    path = "/api/messages",
    tag = "Chat",
    summary = "List chat messages",
    responses(
        (status = 200, description = "Chat snapshot", body = serde_json::Value),
        (status = 500, description = "Message store unavailable", body = ErrorResponse),
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.storefront.list_messages().await?))
}

/// `POST /messages` — Post a message and push the history to this
/// worker's live connections.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if `author`/`body` are missing,
/// or the repository error if the write fails.
#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "Chat",
    summary = "Post a chat message",
    description = "Stores a message and broadcasts the full history as a `msgs` event.",
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Message stored", body = serde_json::Value),
        (status = 400, description = "Invalid message", body = ErrorResponse),
        (status = 500, description = "Message store unavailable", body = ErrorResponse),
    )
)]
pub async fn create_message(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, GatewayError> {
    let message = NewChatMessage::from_value(body)?;
    let stored = state.storefront.submit_message(message).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Chat routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/messages", get(list_messages).post(create_message))
}
