//! Session handlers: login, identity, logout.
//!
//! The session id travels in a signed `sid` cookie; the payload lives in
//! the shared session store, so whichever worker handles the next request
//! can resolve it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};

use crate::api::dto::LoginRequest;
use crate::app_state::AppState;
use crate::domain::{SESSION_COOKIE, SessionId, UserSession};
use crate::error::{ErrorResponse, GatewayError};

fn session_id(jar: &SignedCookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| SessionId::from(cookie.value().to_string()))
}

/// `POST /sessions/login` — Start a session.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a blank username, or
/// [`GatewayError::SessionStoreError`] if the session cannot be stored.
#[utoipa::path(
    post,
    path = "/api/sessions/login",
    tag = "Sessions",
    summary = "Log in",
    description = "Creates a session valid for ten minutes after the last access and sets the signed `sid` cookie.",
    request_body = LoginRequest,
    responses(
        (status = 201, description = "Session created", body = UserSession),
        (status = 400, description = "Blank username", body = ErrorResponse),
        (status = 500, description = "Session store unavailable", body = ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let (id, session) = state.sessions.login(&req.username).await?;
    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    Ok((StatusCode::CREATED, jar.add(cookie), Json(session)))
}

/// `GET /sessions/me` — Current session, refreshing its expiry.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] if there is no live session.
#[utoipa::path(
    get,
    path = "/api/sessions/me",
    tag = "Sessions",
    summary = "Current session",
    responses(
        (status = 200, description = "Live session", body = UserSession),
        (status = 401, description = "Missing or expired session", body = ErrorResponse),
    )
)]
pub async fn me(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<impl IntoResponse, GatewayError> {
    let id = session_id(&jar).ok_or(GatewayError::Unauthorized)?;
    let session = state
        .sessions
        .current(&id)
        .await?
        .ok_or(GatewayError::Unauthorized)?;
    Ok(Json(session))
}

/// `POST /sessions/logout` — Destroy the session and clear the cookie.
///
/// # Errors
///
/// Returns [`GatewayError::SessionStoreError`] if the store fails.
#[utoipa::path(
    post,
    path = "/api/sessions/logout",
    tag = "Sessions",
    summary = "Log out",
    responses(
        (status = 204, description = "Session destroyed"),
        (status = 500, description = "Session store unavailable", body = ErrorResponse),
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<impl IntoResponse, GatewayError> {
    if let Some(id) = session_id(&jar) {
        state.sessions.logout(&id).await?;
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((StatusCode::NO_CONTENT, jar))
}

/// Session routes, nested under `/api/sessions`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/logout", post(logout))
}
