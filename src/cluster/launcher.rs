//! How the supervisor starts a worker process.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};

/// Starts one worker process.
///
/// Spawning is fire-and-forget: the supervisor treats the worker as started
/// as soon as the OS process exists, without waiting for its listener.
pub trait WorkerLauncher: Send + Sync + fmt::Debug {
    /// Spawns a new worker.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the process cannot be created.
    fn launch(&self) -> std::io::Result<Child>;
}

/// Re-executes the current binary in worker mode.
///
/// The child receives only the port argument, so it takes the single-worker
/// path. It inherits the environment and the console, so its log lines
/// land in the same sink as the supervisor's.
#[derive(Debug, Clone)]
pub struct CurrentExeLauncher {
    program: PathBuf,
    port: u16,
}

impl CurrentExeLauncher {
    /// Creates a launcher for workers listening on `port`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the current executable path is unavailable.
    pub fn new(port: u16) -> std::io::Result<Self> {
        Ok(Self {
            program: std::env::current_exe()?,
            port,
        })
    }
}

impl WorkerLauncher for CurrentExeLauncher {
    fn launch(&self) -> std::io::Result<Child> {
        Command::new(&self.program)
            .arg(self.port.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
    }
}
