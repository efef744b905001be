//! Events exchanged over the persistent client connection.
//!
//! Every frame is a JSON text message of the form
//! `{"event": "<name>", "data": <payload>}`. Catalog and chat state is
//! always pushed as a full snapshot, never as a delta.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CatalogItem, ChatMessage};
use crate::error::{ErrorBody, GatewayError};

/// Server → client event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Full catalog snapshot.
    #[serde(rename = "items")]
    Items(Vec<CatalogItem>),
    /// Full chat history snapshot.
    #[serde(rename = "msgs")]
    Msgs(Vec<ChatMessage>),
    /// A request issued on this connection failed.
    #[serde(rename = "error")]
    Error(ErrorBody),
}

impl ServerEvent {
    /// Wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Items(_) => "items",
            Self::Msgs(_) => "msgs",
            Self::Error(_) => "error",
        }
    }
}

impl From<&GatewayError> for ServerEvent {
    fn from(err: &GatewayError) -> Self {
        Self::Error(err.body())
    }
}

/// Client → server event.
///
/// Payloads stay untyped here so a malformed item can be reported back
/// with a precise message instead of a generic parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Submit a catalog item.
    #[serde(rename = "new-item")]
    NewItem(Value),
    /// Submit a chat message.
    #[serde(rename = "new-msg")]
    NewMsg(Value),
}
