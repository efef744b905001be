//! Storefront service: catalog and chat writes followed by fan-out.

use std::sync::Arc;

use crate::domain::{CatalogItem, ChatMessage, NewCatalogItem, NewChatMessage};
use crate::error::GatewayError;
use crate::persistence::{CatalogRepository, MessageRepository};

use super::BroadcastEngine;

/// Orchestration layer for catalog and chat mutations.
///
/// Every mutation follows the same pattern: validate → write to the
/// repository → on success, let the [`BroadcastEngine`] re-read and fan
/// out. The broadcast only starts after the write has completed, so every
/// snapshot it sends already contains the new entry.
#[derive(Debug, Clone)]
pub struct StorefrontService {
    catalog: Arc<dyn CatalogRepository>,
    messages: Arc<dyn MessageRepository>,
    broadcaster: Arc<BroadcastEngine>,
}

impl StorefrontService {
    /// Creates a new `StorefrontService`.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        messages: Arc<dyn MessageRepository>,
        broadcaster: Arc<BroadcastEngine>,
    ) -> Self {
        Self {
            catalog,
            messages,
            broadcaster,
        }
    }

    /// Returns a reference to the inner [`BroadcastEngine`].
    #[must_use]
    pub fn broadcaster(&self) -> &Arc<BroadcastEngine> {
        &self.broadcaster
    }

    /// Returns the full catalog.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the read fails.
    pub async fn list_items(&self) -> Result<Vec<CatalogItem>, GatewayError> {
        self.catalog.get_all().await
    }

    /// Returns the full chat history.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the read fails.
    pub async fn list_messages(&self) -> Result<Vec<ChatMessage>, GatewayError> {
        self.messages.get_all().await
    }

    /// Validates and stores a catalog item, then broadcasts `items`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for a malformed item, or the
    /// repository error if the write fails. Nothing is broadcast in either
    /// case.
    pub async fn submit_item(&self, item: NewCatalogItem) -> Result<CatalogItem, GatewayError> {
        item.validate()?;
        let stored = self.catalog.save(item).await?;
        tracing::info!(item_id = stored.id, name = %stored.name, "catalog item stored");
        self.broadcaster.on_catalog_changed().await;
        Ok(stored)
    }

    /// Stores a chat message, then broadcasts `msgs`.
    ///
    /// # Errors
    ///
    /// Returns the repository error if the write fails; nothing is
    /// broadcast in that case.
    pub async fn submit_message(&self, message: NewChatMessage) -> Result<ChatMessage, GatewayError> {
        let stored = self.messages.save(message).await?;
        tracing::info!(message_id = stored.id, author = %stored.author, "chat message stored");
        self.broadcaster.on_messages_changed().await;
        Ok(stored)
    }
}
