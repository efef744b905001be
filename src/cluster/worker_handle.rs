//! Supervisor-side record of a running worker.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A worker process as seen by the supervisor.
///
/// Created on spawn and dropped when the process exits; the replacement
/// gets a fresh handle with `restart_count` incremented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerHandle {
    /// OS process id.
    pub pid: u32,
    /// When the process was spawned.
    pub started_at: DateTime<Utc>,
    /// How many predecessors this worker slot has had.
    pub restart_count: u64,
}

impl WorkerHandle {
    /// Creates a handle for a process spawned now.
    #[must_use]
    pub fn new(pid: u32, restart_count: u64) -> Self {
        Self {
            pid,
            started_at: Utc::now(),
            restart_count,
        }
    }
}
