//! Shared application state injected into all Axum handlers.

use std::fmt;
use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::domain::ConnectionRegistry;
use crate::persistence::Backends;
use crate::service::{BroadcastEngine, SessionService, StorefrontService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
///
/// One instance per worker process: the registry and broadcast engine it
/// holds are local to that worker.
#[derive(Clone)]
pub struct AppState {
    /// Catalog and chat writes with fan-out.
    pub storefront: Arc<StorefrontService>,
    /// Login/logout over the shared session store.
    pub sessions: Arc<SessionService>,
    /// Live persistent connections of this worker.
    pub registry: Arc<ConnectionRegistry>,
    /// Snapshot broadcaster for this worker's registry.
    pub broadcaster: Arc<BroadcastEngine>,
    /// Signing key for the session cookie.
    pub cookie_key: Key,
}

impl AppState {
    /// Wires the registry, broadcast engine, and services over `backends`.
    #[must_use]
    pub fn new(backends: Backends, cookie_key: Key) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Arc::new(BroadcastEngine::new(
            Arc::clone(&registry),
            Arc::clone(&backends.catalog),
            Arc::clone(&backends.messages),
        ));
        let storefront = Arc::new(StorefrontService::new(
            backends.catalog,
            backends.messages,
            Arc::clone(&broadcaster),
        ));
        let sessions = Arc::new(SessionService::new(backends.sessions));

        Self {
            storefront,
            sessions,
            registry,
            broadcaster,
            cookie_key,
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("storefront", &self.storefront)
            .field("sessions", &self.sessions)
            .field("connections", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
