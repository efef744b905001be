//! In-memory stores.
//!
//! Useful for development and single-process deployments.
//! Data is lost on restart and is not visible to other workers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use super::{CatalogRepository, MessageRepository, SessionStore};
use crate::domain::{CatalogItem, ChatMessage, NewCatalogItem, NewChatMessage, SessionId};
use crate::error::GatewayError;

/// Catalog items held in a `Vec`.
#[derive(Debug)]
pub struct MemoryCatalogRepository {
    items: RwLock<Vec<CatalogItem>>,
    next_id: AtomicI64,
}

impl MemoryCatalogRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryCatalogRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogRepository for MemoryCatalogRepository {
    async fn get_all(&self) -> Result<Vec<CatalogItem>, GatewayError> {
        Ok(self.items.read().await.clone())
    }

    async fn save(&self, item: NewCatalogItem) -> Result<CatalogItem, GatewayError> {
        let mut items = self.items.write().await;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let stored = item.into_item(id, Utc::now());
        items.push(stored.clone());
        Ok(stored)
    }
}

/// Chat messages held in a `Vec`.
#[derive(Debug)]
pub struct MemoryMessageRepository {
    messages: RwLock<Vec<ChatMessage>>,
    next_id: AtomicI64,
}

impl MemoryMessageRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn get_all(&self) -> Result<Vec<ChatMessage>, GatewayError> {
        Ok(self.messages.read().await.clone())
    }

    async fn save(&self, message: NewChatMessage) -> Result<ChatMessage, GatewayError> {
        let mut messages = self.messages.write().await;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let stored = message.into_message(id, Utc::now());
        messages.push(stored.clone());
        Ok(stored)
    }
}

#[derive(Debug)]
struct SessionEntry {
    payload: Value,
    ttl: Duration,
    expires_at: Instant,
}

/// Sessions held in a `HashMap` with lazy expiry.
///
/// Uses [`tokio::time::Instant`], so expiry follows a paused test clock.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<SessionId, SessionEntry>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &SessionId) -> Result<Option<Value>, GatewayError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        match entries.get_mut(id) {
            None => return Ok(None),
            Some(entry) if entry.expires_at > now => {
                entry.expires_at = now + entry.ttl;
                return Ok(Some(entry.payload.clone()));
            }
            Some(_) => {}
        }
        entries.remove(id);
        Ok(None)
    }

    async fn set(&self, id: &SessionId, payload: Value, ttl: Duration) -> Result<(), GatewayError> {
        let entry = SessionEntry {
            payload,
            ttl,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().await.insert(id.clone(), entry);
        Ok(())
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), GatewayError> {
        self.entries.lock().await.remove(id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, GatewayError> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        Ok(u64::try_from(before - entries.len()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::SESSION_TTL;
    use serde_json::{Map, json};

    fn book() -> NewCatalogItem {
        NewCatalogItem {
            name: "Book".to_string(),
            price: 10.0,
            attributes: Map::new(),
        }
    }

    #[tokio::test]
    async fn catalog_save_assigns_sequential_ids() {
        let repo = MemoryCatalogRepository::new();
        let Ok(first) = repo.save(book()).await else {
            panic!("save failed");
        };
        let Ok(second) = repo.save(book()).await else {
            panic!("save failed");
        };
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let Ok(all) = repo.get_all().await else {
            panic!("get_all failed");
        };
        assert_eq!(all, vec![first, second]);
    }

    #[tokio::test]
    async fn messages_keep_insertion_order() {
        let repo = MemoryMessageRepository::new();
        for body in ["hola", "que tal"] {
            let msg = NewChatMessage {
                author: "ana@example.com".to_string(),
                body: body.to_string(),
            };
            tokio_test::assert_ok!(repo.save(msg).await);
        }
        let Ok(all) = repo.get_all().await else {
            panic!("get_all failed");
        };
        let bodies: Vec<&str> = all.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["hola", "que tal"]);
    }

    #[tokio::test(start_paused = true)]
    async fn session_round_trip_then_expiry() {
        let store = MemorySessionStore::new();
        let id = SessionId::generate();
        let payload = json!({"username": "ana"});

        tokio_test::assert_ok!(store.set(&id, payload.clone(), SESSION_TTL).await);
        let Ok(got) = store.get(&id).await else {
            panic!("get failed");
        };
        assert_eq!(got, Some(payload));

        tokio::time::advance(SESSION_TTL + Duration::from_secs(1)).await;
        let Ok(got) = store.get(&id).await else {
            panic!("get failed");
        };
        assert_eq!(got, None);
    }

    #[tokio::test(start_paused = true)]
    async fn session_access_slides_expiry() {
        let store = MemorySessionStore::new();
        let id = SessionId::generate();
        tokio_test::assert_ok!(store.set(&id, json!(1), SESSION_TTL).await);

        // Touch at 500 s, then check at 1000 s: still inside the refreshed window.
        tokio::time::advance(Duration::from_secs(500)).await;
        assert!(matches!(store.get(&id).await, Ok(Some(_))));
        tokio::time::advance(Duration::from_secs(500)).await;
        assert!(matches!(store.get(&id).await, Ok(Some(_))));

        tokio::time::advance(Duration::from_secs(601)).await;
        assert!(matches!(store.get(&id).await, Ok(None)));
    }

    #[tokio::test]
    async fn destroy_removes_session() {
        let store = MemorySessionStore::new();
        let id = SessionId::generate();
        tokio_test::assert_ok!(store.set(&id, json!({}), SESSION_TTL).await);
        tokio_test::assert_ok!(store.destroy(&id).await);
        assert!(matches!(store.get(&id).await, Ok(None)));
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_only_expired() {
        let store = MemorySessionStore::new();
        let short = SessionId::generate();
        let long = SessionId::generate();
        tokio_test::assert_ok!(store.set(&short, json!(1), Duration::from_secs(10)).await);
        tokio_test::assert_ok!(store.set(&long, json!(2), SESSION_TTL).await);

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(matches!(store.purge_expired().await, Ok(1)));
        assert!(matches!(store.get(&long).await, Ok(Some(_))));
    }
}
