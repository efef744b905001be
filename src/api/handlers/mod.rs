//! REST endpoint handlers organized by resource.

pub mod items;
pub mod messages;
pub mod sessions;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(items::routes())
        .merge(messages::routes())
        .nest("/sessions", sessions::routes())
}
