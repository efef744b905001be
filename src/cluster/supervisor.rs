//! Worker pool supervision.
//!
//! [`Supervisor`] spawns a fixed number of worker processes and keeps that
//! number alive: whenever a worker exits, for any reason and with any
//! status, it is logged and replaced immediately. The supervisor and its
//! workers share no memory and exchange no messages; process spawn and
//! exit are the only signals between them.
//!
//! There is no restart ceiling. A worker that dies on startup (for example
//! because the database is unreachable) is respawned forever, throttled
//! only by the optional `respawn_backoff`.

use std::collections::HashMap;
use std::process::ExitStatus;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use super::{WorkerHandle, WorkerLauncher};
use crate::config::SupervisorConfig;
use crate::error::GatewayError;

/// Record of a worker exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitRecord {
    /// PID of the process that exited.
    pub pid: u32,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Restart count of the handle that exited.
    pub restart_count: u64,
    /// When the exit was observed.
    pub died_at: DateTime<Utc>,
}

/// Lifecycle notifications emitted by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// A worker process was started.
    Spawned(WorkerHandle),
    /// A worker process exited.
    Exited(ExitRecord),
}

#[derive(Debug)]
struct WorkerExit {
    pid: u32,
    status: std::io::Result<ExitStatus>,
}

/// Spawns, monitors, and respawns worker processes.
#[derive(Debug)]
pub struct Supervisor<L> {
    launcher: L,
    config: SupervisorConfig,
    workers: HashMap<u32, WorkerHandle>,
    observer: Option<mpsc::UnboundedSender<SupervisorEvent>>,
}

impl<L: WorkerLauncher> Supervisor<L> {
    /// Creates a supervisor that will keep `config.worker_count` workers
    /// started by `launcher`.
    #[must_use]
    pub fn new(launcher: L, config: SupervisorConfig) -> Self {
        Self {
            launcher,
            config,
            workers: HashMap::new(),
            observer: None,
        }
    }

    /// Forwards every spawn and exit to `observer` in addition to the log.
    #[must_use]
    pub fn with_observer(mut self, observer: mpsc::UnboundedSender<SupervisorEvent>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Spawns the pool and supervises it until `shutdown` turns `true`.
    ///
    /// On shutdown every remaining worker is killed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Spawn`] if a worker process cannot be
    /// created, at startup or on respawn.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), GatewayError> {
        let mut running = JoinSet::new();
        for _ in 0..self.config.worker_count {
            self.spawn_worker(&mut running, 0)?;
        }

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                Some(joined) = running.join_next() => {
                    match joined {
                        Ok(exit) => self.handle_exit(exit, &mut running).await?,
                        Err(e) => tracing::error!(error = %e, "worker monitor task failed"),
                    }
                }
            }
        }

        tracing::info!(workers = self.workers.len(), "supervisor shutting down");
        running.shutdown().await;
        self.workers.clear();
        Ok(())
    }

    async fn handle_exit(
        &mut self,
        exit: WorkerExit,
        running: &mut JoinSet<WorkerExit>,
    ) -> Result<(), GatewayError> {
        let died_at = Utc::now();
        let restart_count = self
            .workers
            .remove(&exit.pid)
            .map_or(0, |handle| handle.restart_count);

        let code = match &exit.status {
            Ok(status) => {
                tracing::warn!(pid = exit.pid, %status, died_at = %died_at, "worker died");
                status.code()
            }
            Err(e) => {
                tracing::warn!(pid = exit.pid, error = %e, died_at = %died_at, "worker died (status unavailable)");
                None
            }
        };
        self.notify(SupervisorEvent::Exited(ExitRecord {
            pid: exit.pid,
            code,
            restart_count,
            died_at,
        }));

        if !self.config.respawn_backoff.is_zero() {
            tokio::time::sleep(self.config.respawn_backoff).await;
        }
        self.spawn_worker(running, restart_count.saturating_add(1))
    }

    fn spawn_worker(
        &mut self,
        running: &mut JoinSet<WorkerExit>,
        restart_count: u64,
    ) -> Result<(), GatewayError> {
        let mut child = self.launcher.launch().map_err(GatewayError::Spawn)?;
        let pid = child.id().unwrap_or_default();
        let handle = WorkerHandle::new(pid, restart_count);
        tracing::info!(pid, restart_count, started_at = %handle.started_at, "worker spawned");

        self.workers.insert(pid, handle.clone());
        self.notify(SupervisorEvent::Spawned(handle));

        running.spawn(async move {
            let status = child.wait().await;
            WorkerExit { pid, status }
        });
        Ok(())
    }

    fn notify(&self, event: SupervisorEvent) {
        if let Some(observer) = &self.observer {
            let _ = observer.send(event);
        }
    }
}
