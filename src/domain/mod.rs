//! Domain layer: core types, connection registry, and realtime events.
//!
//! This module contains the worker-side domain model: catalog items and
//! chat messages, session identity, the wire events pushed to clients, and
//! the per-worker registry of live connections.

pub mod catalog_item;
pub mod chat_message;
pub mod connection_id;
pub mod connection_registry;
pub mod realtime_event;
pub mod session;

pub use catalog_item::{CatalogItem, NewCatalogItem};
pub use chat_message::{ChatMessage, NewChatMessage};
pub use connection_id::ConnectionId;
pub use connection_registry::{Connection, ConnectionRegistry, Inbox, Outbox};
pub use realtime_event::{ClientEvent, ServerEvent};
pub use session::{SESSION_COOKIE, SESSION_TTL, SESSION_TTL_SECS, SessionId, UserSession};
