//! Chat messages as stored by the message repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;

/// A message posted to the shared chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Server-assigned identifier.
    pub id: i64,
    /// Author handle (typically an e-mail address).
    pub author: String,
    /// Message text.
    pub body: String,
    /// Server-side timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Fields of a chat message before the repository assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChatMessage {
    /// Author handle.
    pub author: String,
    /// Message text.
    pub body: String,
}

impl NewChatMessage {
    /// Parses an untyped JSON payload into message fields.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `author` or `body` is
    /// missing or not a string.
    pub fn from_value(value: Value) -> Result<Self, GatewayError> {
        serde_json::from_value(value).map_err(|e| GatewayError::InvalidRequest(e.to_string()))
    }

    /// Attaches repository-assigned metadata.
    #[must_use]
    pub fn into_message(self, id: i64, timestamp: DateTime<Utc>) -> ChatMessage {
        ChatMessage {
            id,
            author: self.author,
            body: self.body,
            timestamp,
        }
    }
}
