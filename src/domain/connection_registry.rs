//! Per-worker registry of live persistent connections.
//!
//! [`ConnectionRegistry`] maps each [`ConnectionId`] to the connection's
//! metadata and its outbound queue. Entries are kept in a `BTreeMap` keyed
//! by a monotonically increasing id, so iteration order is registration
//! order.
//!
//! # Concurrency
//!
//! Each worker runs a single-threaded runtime, so the inner mutex is never
//! contended. It exists only because Axum state must be `Send + Sync`.
//! Every operation holds the lock for a bounded, non-awaiting section.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::{ConnectionId, ServerEvent, SessionId};

/// Sending half of a connection's outbound queue.
///
/// Unbounded: a slow client can grow its queue without limit.
pub type Outbox = mpsc::UnboundedSender<Arc<ServerEvent>>;

/// Receiving half of a connection's outbound queue.
pub type Inbox = mpsc::UnboundedReceiver<Arc<ServerEvent>>;

/// Metadata for one registered connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Worker-local identifier.
    pub connection_id: ConnectionId,
    /// Session cookie presented at upgrade time, if any.
    pub session_id: Option<SessionId>,
    /// When the connection was registered.
    pub opened_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Entry {
    connection: Connection,
    outbox: Outbox,
}

/// Live connections of one worker process.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    entries: Mutex<BTreeMap<ConnectionId, Entry>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<ConnectionId, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a newly accepted connection and returns its handle.
    pub fn register(&self, session_id: Option<SessionId>, outbox: Outbox) -> ConnectionId {
        let connection_id = ConnectionId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed));
        let connection = Connection {
            connection_id,
            session_id,
            opened_at: Utc::now(),
        };
        self.entries()
            .insert(connection_id, Entry { connection, outbox });
        tracing::debug!(%connection_id, "connection registered");
        connection_id
    }

    /// Removes a connection. Once this returns, no further event is queued
    /// for it.
    ///
    /// Returns the connection metadata, or `None` if it was already gone.
    pub fn unregister(&self, connection_id: ConnectionId) -> Option<Connection> {
        let removed = self.entries().remove(&connection_id);
        if removed.is_some() {
            tracing::debug!(%connection_id, "connection unregistered");
        }
        removed.map(|entry| entry.connection)
    }

    /// Visits every live connection in registration order.
    pub fn for_each(&self, mut f: impl FnMut(&Connection)) {
        for entry in self.entries().values() {
            f(&entry.connection);
        }
    }

    /// Queues `event` for a single connection.
    ///
    /// Best effort: returns `false` if the connection is unknown or its
    /// transport has already closed. Failures are logged, never propagated.
    pub fn send(&self, connection_id: ConnectionId, event: Arc<ServerEvent>) -> bool {
        let entries = self.entries();
        let Some(entry) = entries.get(&connection_id) else {
            tracing::debug!(%connection_id, event = event.name(), "send to unregistered connection dropped");
            return false;
        };
        deliver(entry, event)
    }

    /// Queues the same `event` for every live connection.
    ///
    /// Returns the number of connections the event was queued for. A closed
    /// connection is skipped without affecting the others.
    pub fn broadcast(&self, event: &Arc<ServerEvent>) -> usize {
        self.entries()
            .values()
            .filter(|entry| deliver(entry, Arc::clone(event)))
            .count()
    }

    /// Returns a snapshot of all live connections in registration order.
    #[must_use]
    pub fn connections(&self) -> Vec<Connection> {
        self.entries()
            .values()
            .map(|entry| entry.connection.clone())
            .collect()
    }

    /// Returns the number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Returns `true` if no connection is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

fn deliver(entry: &Entry, event: Arc<ServerEvent>) -> bool {
    let name = event.name();
    match entry.outbox.send(event) {
        Ok(()) => true,
        Err(_) => {
            tracing::warn!(
                connection_id = %entry.connection.connection_id,
                event = name,
                "send failed: transport closed"
            );
            false
        }
    }
}
