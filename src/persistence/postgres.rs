//! PostgreSQL implementation of the persistence layer.
//!
//! One [`PostgresStore`] backs all three contracts. Every worker opens its
//! own pool against the same database, which is what lets any worker serve
//! any session.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{CatalogRepository, MessageRepository, SessionStore};
use crate::config::WorkerConfig;
use crate::domain::catalog_item::strip_reserved;
use crate::domain::{CatalogItem, ChatMessage, NewCatalogItem, NewChatMessage, SessionId};
use crate::error::GatewayError;

/// PostgreSQL-backed stores using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool from `config` and applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the database is
    /// unreachable or a migration fails.
    pub async fn connect(config: &WorkerConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        tracing::info!(
            max_connections = config.database_max_connections,
            "database connection established"
        );
        Ok(Self::new(pool))
    }
}

/// Item attributes from the JSONB column, minus reserved keys.
fn into_attributes(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(mut map) => {
            strip_reserved(&mut map);
            map
        }
        _ => Map::new(),
    }
}

fn into_catalog_item(
    (id, name, price, attributes, created_at): (i64, String, f64, Value, DateTime<Utc>),
) -> CatalogItem {
    CatalogItem {
        id,
        name,
        price,
        created_at,
        attributes: into_attributes(attributes),
    }
}

#[async_trait]
impl CatalogRepository for PostgresStore {
    async fn get_all(&self) -> Result<Vec<CatalogItem>, GatewayError> {
        let rows = sqlx::query_as::<_, (i64, String, f64, Value, DateTime<Utc>)>(
            "SELECT id, name, price, attributes, created_at FROM catalog_items ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(into_catalog_item).collect())
    }

    async fn save(&self, mut item: NewCatalogItem) -> Result<CatalogItem, GatewayError> {
        strip_reserved(&mut item.attributes);
        let (id, created_at) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            "INSERT INTO catalog_items (name, price, attributes) VALUES ($1, $2, $3) \
             RETURNING id, created_at",
        )
        .bind(&item.name)
        .bind(item.price)
        .bind(Value::Object(item.attributes.clone()))
        .fetch_one(&self.pool)
        .await?;

        Ok(item.into_item(id, created_at))
    }
}

#[async_trait]
impl MessageRepository for PostgresStore {
    async fn get_all(&self) -> Result<Vec<ChatMessage>, GatewayError> {
        let rows = sqlx::query_as::<_, (i64, String, String, DateTime<Utc>)>(
            "SELECT id, author, body, created_at FROM chat_messages ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, author, body, timestamp)| ChatMessage {
                id,
                author,
                body,
                timestamp,
            })
            .collect())
    }

    async fn save(&self, message: NewChatMessage) -> Result<ChatMessage, GatewayError> {
        let (id, timestamp) = sqlx::query_as::<_, (i64, DateTime<Utc>)>(
            "INSERT INTO chat_messages (author, body) VALUES ($1, $2) RETURNING id, created_at",
        )
        .bind(&message.author)
        .bind(&message.body)
        .fetch_one(&self.pool)
        .await?;

        Ok(message.into_message(id, timestamp))
    }
}

#[async_trait]
impl SessionStore for PostgresStore {
    async fn get(&self, id: &SessionId) -> Result<Option<Value>, GatewayError> {
        sqlx::query_scalar::<_, Value>(
            "UPDATE sessions \
             SET expires_at = now() + make_interval(secs => ttl_secs::double precision) \
             WHERE sid = $1 AND expires_at > now() \
             RETURNING payload",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatewayError::SessionStoreError(e.to_string()))
    }

    async fn set(&self, id: &SessionId, payload: Value, ttl: Duration) -> Result<(), GatewayError> {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        sqlx::query(
            "INSERT INTO sessions (sid, payload, ttl_secs, expires_at) \
             VALUES ($1, $2, $3, now() + make_interval(secs => $4)) \
             ON CONFLICT (sid) DO UPDATE \
             SET payload = EXCLUDED.payload, ttl_secs = EXCLUDED.ttl_secs, expires_at = EXCLUDED.expires_at",
        )
        .bind(id.as_str())
        .bind(payload)
        .bind(ttl_secs)
        .bind(ttl.as_secs_f64())
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::SessionStoreError(e.to_string()))?;
        Ok(())
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), GatewayError> {
        sqlx::query("DELETE FROM sessions WHERE sid = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::SessionStoreError(e.to_string()))?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, GatewayError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::SessionStoreError(e.to_string()))?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attributes_fall_back_to_empty_map() {
        assert!(into_attributes(json!(null)).is_empty());
        assert_eq!(
            into_attributes(json!({"color": "red"})).get("color"),
            Some(&json!("red"))
        );
    }

    #[test]
    fn stored_reserved_keys_never_reach_snapshot() {
        let row = (
            7,
            "Book".to_string(),
            10.0,
            json!({"id": "evil", "created_at": "x", "thumbnail": "b.png"}),
            Utc::now(),
        );
        let item = into_catalog_item(row);
        assert_eq!(item.id, 7);
        assert_eq!(item.attributes.len(), 1);

        let value = serde_json::to_value(&item).unwrap_or_default();
        assert_eq!(value.get("id"), Some(&json!(7)));
        assert_ne!(value.get("created_at"), Some(&json!("x")));
        assert_eq!(value.get("thumbnail"), Some(&json!("b.png")));
    }
}
