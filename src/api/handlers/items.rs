//! Catalog handlers: list and create.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::NewCatalogItem;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /items` — Full catalog snapshot.
///
/// # Errors
///
/// Returns [`GatewayError::PersistenceError`] if the catalog cannot be read.
#[utoipa::path(
    get,
    path = "/api/items",
    tag = "Catalog",
    summary = "List catalog items",
    description = "Returns every catalog item in insertion order.",
    responses(
        (status = 200, description = "Catalog snapshot", body = serde_json::Value),
        (status = 500, description = "Catalog store unavailable", body = ErrorResponse),
    )
)]
pub async fn list_items(State(state): State<AppState>) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.storefront.list_items().await?))
}

/// `POST /items` — Add an item and push the new catalog to this worker's
/// live connections.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] on a malformed item, or the
/// repository error if the write fails.
#[utoipa::path(
    post,
    path = "/api/items",
    tag = "Catalog",
    summary = "Create a catalog item",
    description = "Stores an item with a `name`, a `price`, and any additional fields, then broadcasts the full catalog as an `items` event.",
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Item stored", body = serde_json::Value),
        (status = 400, description = "Invalid item", body = ErrorResponse),
        (status = 500, description = "Catalog store unavailable", body = ErrorResponse),
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, GatewayError> {
    let item = NewCatalogItem::from_value(body)?;
    let stored = state.storefront.submit_item(item).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Catalog routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/items", get(list_items).post(create_item))
}
