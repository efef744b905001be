//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto::LoginRequest;
use super::handlers::{items, messages, sessions};
use crate::domain::UserSession;
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI description of `/api`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "catalog-chat-gateway", description = "Live catalog and chat over HTTP and WebSocket"),
    paths(
        items::list_items,
        items::create_item,
        messages::list_messages,
        messages::create_message,
        sessions::login,
        sessions::me,
        sessions::logout,
    ),
    components(schemas(ErrorResponse, ErrorBody, LoginRequest, UserSession)),
    tags(
        (name = "Catalog", description = "Catalog items"),
        (name = "Chat", description = "Chat messages"),
        (name = "Sessions", description = "Cookie sessions backed by the shared store"),
    )
)]
pub struct ApiDoc;
