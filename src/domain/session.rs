//! Session identity and payload.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sliding session lifetime: ten minutes after the last read or write.
pub const SESSION_TTL_SECS: u64 = 600;

/// [`SESSION_TTL_SECS`] as a [`Duration`].
pub const SESSION_TTL: Duration = Duration::from_secs(SESSION_TTL_SECS);

/// Name of the signed cookie carrying the session id.
pub const SESSION_COOKIE: &str = "sid";

/// Opaque session key shared by every worker through the session store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a fresh random session id (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload stored for a logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserSession {
    /// Name the user logged in with.
    pub username: String,
    /// When the session was created.
    pub logged_in_at: DateTime<Utc>,
}
