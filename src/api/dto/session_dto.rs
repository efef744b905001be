//! Session DTOs for login and identity lookups.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /api/sessions/login`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Name to log in as.
    pub username: String,
}
