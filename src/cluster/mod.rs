//! Multi-process topology: one supervisor, N worker processes.
//!
//! Only this module knows that more than one process exists. Workers are
//! full copies of the application that share nothing but the listening
//! port and the external stores.

pub mod launcher;
pub mod supervisor;
pub mod worker_handle;

pub use launcher::{CurrentExeLauncher, WorkerLauncher};
pub use supervisor::{ExitRecord, Supervisor, SupervisorEvent};
pub use worker_handle::WorkerHandle;
