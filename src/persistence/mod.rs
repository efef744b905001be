//! Persistence layer: catalog, chat, and session storage contracts.
//!
//! The gateway only needs three narrow contracts from its stores:
//! read-all/append for catalog items and chat messages, and
//! get/set/expire for sessions. [`postgres`] implements all three on a
//! shared PostgreSQL database so every worker sees the same state;
//! [`memory`] keeps them in-process for single-worker runs and tests.
//!
//! Stores shared between workers are expected to serialize concurrent
//! writes themselves; the gateway does no cross-process coordination.

pub mod memory;
pub mod postgres;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::WorkerConfig;
use crate::domain::{CatalogItem, ChatMessage, NewCatalogItem, NewChatMessage, SessionId};
use crate::error::GatewayError;

/// Append/read store for catalog items.
#[async_trait]
pub trait CatalogRepository: Send + Sync + fmt::Debug {
    /// Returns every stored item in insertion order.
    async fn get_all(&self) -> Result<Vec<CatalogItem>, GatewayError>;

    /// Appends an item and returns it with its server-assigned id.
    async fn save(&self, item: NewCatalogItem) -> Result<CatalogItem, GatewayError>;
}

/// Append/read store for chat messages.
#[async_trait]
pub trait MessageRepository: Send + Sync + fmt::Debug {
    /// Returns every stored message in insertion order.
    async fn get_all(&self) -> Result<Vec<ChatMessage>, GatewayError>;

    /// Appends a message and returns it with its server-assigned id.
    async fn save(&self, message: NewChatMessage) -> Result<ChatMessage, GatewayError>;
}

/// Key/value session store with sliding per-entry expiry.
#[async_trait]
pub trait SessionStore: Send + Sync + fmt::Debug {
    /// Returns the payload for `id`, or `None` if absent or expired.
    ///
    /// A successful read pushes the expiry forward by the entry's TTL.
    async fn get(&self, id: &SessionId) -> Result<Option<Value>, GatewayError>;

    /// Stores `payload` under `id`, expiring after `ttl` without access.
    async fn set(&self, id: &SessionId, payload: Value, ttl: Duration) -> Result<(), GatewayError>;

    /// Removes `id` immediately.
    async fn destroy(&self, id: &SessionId) -> Result<(), GatewayError>;

    /// Drops expired entries and returns how many were removed.
    async fn purge_expired(&self) -> Result<u64, GatewayError>;
}

/// The three stores a worker is wired to.
#[derive(Debug, Clone)]
pub struct Backends {
    /// Catalog item store.
    pub catalog: Arc<dyn CatalogRepository>,
    /// Chat message store.
    pub messages: Arc<dyn MessageRepository>,
    /// Session store.
    pub sessions: Arc<dyn SessionStore>,
}

impl Backends {
    /// Process-local stores. State is not shared between workers.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            catalog: Arc::new(memory::MemoryCatalogRepository::new()),
            messages: Arc::new(memory::MemoryMessageRepository::new()),
            sessions: Arc::new(memory::MemorySessionStore::new()),
        }
    }

    /// Connects the stores selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the database cannot be
    /// reached or migrated.
    pub async fn connect(config: &WorkerConfig) -> Result<Self, GatewayError> {
        if !config.persistence_enabled {
            tracing::warn!("persistence disabled: using in-memory stores local to this worker");
            return Ok(Self::in_memory());
        }

        let store = Arc::new(postgres::PostgresStore::connect(config).await?);
        Ok(Self {
            catalog: Arc::clone(&store) as Arc<dyn CatalogRepository>,
            messages: Arc::clone(&store) as Arc<dyn MessageRepository>,
            sessions: store,
        })
    }
}
