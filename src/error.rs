//! Error type shared by the worker, the supervisor, and the REST layer.
//!
//! Every [`GatewayError`] carries a numeric code and an HTTP status. REST
//! handlers return it as a JSON body; the persistent connection pushes the
//! same code/message pair to the offending client as an `error` event.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// JSON body of every non-2xx REST response:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: name must not be empty",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Code/message pair, also used as the `error` event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Everything that can go wrong in a worker or the supervisor.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request            |
/// | 2000–2999 | Authentication  | 401 Unauthorized           |
/// | 3000–3999 | Server          | 500 Internal Server Error  |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Malformed or invalid client payload.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No live session is associated with the request.
    #[error("session missing or expired")]
    Unauthorized,

    /// Catalog or message repository failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Session store failure.
    #[error("session store error: {0}")]
    SessionStoreError(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// A worker process could not be spawned.
    #[error("failed to spawn worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// Socket or other I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected failure with no better category.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Unauthorized => 2001,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::SessionStoreError(_) => 3002,
            Self::Config(_) => 3003,
            Self::Spawn(_) => 3004,
            Self::Io(_) => 3005,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PersistenceError(_)
            | Self::SessionStoreError(_)
            | Self::Config(_)
            | Self::Spawn(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the wire body for this error.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.error_code(),
            message: self.to_string(),
            details: None,
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse { error: self.body() };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
