//! Type-safe connection identifier.
//!
//! [`ConnectionId`] is a newtype wrapper around a worker-local `u64`
//! sequence number. Identifiers are only unique within the worker process
//! that assigned them; they never cross process boundaries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier for a persistent client connection within one worker.
///
/// Assigned by [`super::ConnectionRegistry::register`] from a monotonically
/// increasing counter, so ordering by id is registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a `ConnectionId` from a raw sequence number.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw sequence number.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_sequence() {
        assert!(ConnectionId::from_raw(1) < ConnectionId::from_raw(2));
    }

    #[test]
    fn display_is_prefixed() {
        assert_eq!(ConnectionId::from_raw(7).to_string(), "conn-7");
    }
}
