//! Snapshot fan-out to the connections of this worker.
//!
//! After every successful write the engine re-reads the whole collection
//! and pushes it to every registered connection. No per-client diff state
//! is kept: work per mutation is O(connections × collection size), which
//! is fine for demo-sized catalogs and chats.
//!
//! Fan-out reaches only this worker's registry. Connections held by other
//! workers catch up on their next mutation or reconnect.

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, ServerEvent};
use crate::persistence::{CatalogRepository, MessageRepository};

/// Re-reads repository state and pushes full snapshots to clients.
#[derive(Debug, Clone)]
pub struct BroadcastEngine {
    registry: Arc<ConnectionRegistry>,
    catalog: Arc<dyn CatalogRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl BroadcastEngine {
    /// Creates an engine over one worker's registry and shared stores.
    #[must_use]
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        catalog: Arc<dyn CatalogRepository>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        Self {
            registry,
            catalog,
            messages,
        }
    }

    /// Returns the registry this engine broadcasts to.
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Pushes the current catalog to every connection as `items`.
    ///
    /// Returns how many connections the snapshot was queued for. A failed
    /// read skips the whole cycle and returns 0.
    pub async fn on_catalog_changed(&self) -> usize {
        let Some(event) = self.catalog_snapshot().await else {
            return 0;
        };
        let delivered = self.registry.broadcast(&event);
        tracing::debug!(event = "items", delivered, "catalog broadcast");
        delivered
    }

    /// Pushes the current chat history to every connection as `msgs`.
    ///
    /// Same failure semantics as [`Self::on_catalog_changed`].
    pub async fn on_messages_changed(&self) -> usize {
        let Some(event) = self.messages_snapshot().await else {
            return 0;
        };
        let delivered = self.registry.broadcast(&event);
        tracing::debug!(event = "msgs", delivered, "messages broadcast");
        delivered
    }

    /// Initial state sync for a freshly registered connection: one `items`
    /// and one `msgs` event, sent to that connection only.
    ///
    /// Each collection is read independently; a failed read skips only its
    /// own event.
    pub async fn sync_connection(&self, connection_id: ConnectionId) {
        if let Some(event) = self.catalog_snapshot().await {
            self.registry.send(connection_id, event);
        }
        if let Some(event) = self.messages_snapshot().await {
            self.registry.send(connection_id, event);
        }
    }

    async fn catalog_snapshot(&self) -> Option<Arc<ServerEvent>> {
        match self.catalog.get_all().await {
            Ok(items) => Some(Arc::new(ServerEvent::Items(items))),
            Err(e) => {
                tracing::error!(error = %e, event = "items", "catalog read failed; broadcast skipped");
                None
            }
        }
    }

    async fn messages_snapshot(&self) -> Option<Arc<ServerEvent>> {
        match self.messages.get_all().await {
            Ok(msgs) => Some(Arc::new(ServerEvent::Msgs(msgs))),
            Err(e) => {
                tracing::error!(error = %e, event = "msgs", "message read failed; broadcast skipped");
                None
            }
        }
    }
}
