//! Session service: login, lookup, and logout over the shared store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::domain::{SESSION_TTL, SessionId, UserSession};
use crate::error::GatewayError;
use crate::persistence::SessionStore;

/// Thin layer that (de)serializes [`UserSession`] payloads.
///
/// Every read goes through [`SessionStore::get`], which slides the expiry
/// window forward. Session expiry never touches open persistent
/// connections; it only fails later authenticated HTTP requests.
#[derive(Debug, Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl SessionService {
    /// Creates a service with the standard ten-minute TTL.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            ttl: SESSION_TTL,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Creates a session for `username`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for a blank username, or
    /// [`GatewayError::SessionStoreError`] if the store rejects the write.
    pub async fn login(&self, username: &str) -> Result<(SessionId, UserSession), GatewayError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "username must not be empty".to_string(),
            ));
        }

        let id = SessionId::generate();
        let session = UserSession {
            username: username.to_string(),
            logged_in_at: Utc::now(),
        };
        let payload = serde_json::to_value(&session)
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        self.store.set(&id, payload, self.ttl).await?;
        tracing::info!(username = %session.username, "session created");
        Ok((id, session))
    }

    /// Looks up a live session, refreshing its expiry.
    ///
    /// A payload that no longer parses is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionStoreError`] if the store fails.
    pub async fn current(&self, id: &SessionId) -> Result<Option<UserSession>, GatewayError> {
        let Some(payload) = self.store.get(id).await? else {
            return Ok(None);
        };
        match serde_json::from_value(payload) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable session payload");
                Ok(None)
            }
        }
    }

    /// Destroys a session.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionStoreError`] if the store fails.
    pub async fn logout(&self, id: &SessionId) -> Result<(), GatewayError> {
        self.store.destroy(id).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::memory::MemorySessionStore;

    fn service() -> SessionService {
        SessionService::new(Arc::new(MemorySessionStore::new()))
    }

    #[tokio::test]
    async fn login_then_current() {
        let svc = service();
        let Ok((id, session)) = svc.login("ana").await else {
            panic!("login failed");
        };
        let Ok(Some(found)) = svc.current(&id).await else {
            panic!("session not found");
        };
        assert_eq!(found, session);
    }

    #[tokio::test]
    async fn blank_username_is_rejected() {
        assert!(matches!(
            service().login("   ").await,
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn session_expires_after_ttl_without_access() {
        let svc = service();
        let Ok((id, _)) = svc.login("ana").await else {
            panic!("login failed");
        };
        tokio::time::advance(SESSION_TTL + Duration::from_secs(1)).await;
        assert!(matches!(svc.current(&id).await, Ok(None)));
    }

    #[tokio::test]
    async fn logout_forgets_session() {
        let svc = service();
        let Ok((id, _)) = svc.login("ana").await else {
            panic!("login failed");
        };
        tokio_test::assert_ok!(svc.logout(&id).await);
        assert!(matches!(svc.current(&id).await, Ok(None)));
    }

    #[tokio::test]
    async fn unreadable_payload_counts_as_absent() {
        let svc = service();
        let id = SessionId::generate();
        tokio_test::assert_ok!(
            svc.store()
                .set(&id, serde_json::json!("not a session"), SESSION_TTL)
                .await
        );
        assert!(matches!(svc.current(&id).await, Ok(None)));
    }
}
