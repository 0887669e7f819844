//! Simulator workers.
//!
//! A worker is bound to exactly one episode, or to one evaluation pass, and
//! is never reused: it is spawned, driven through the channel pair, then
//! joined with [`Worker::wait`].
mod config;
mod process;
mod thread;
use crate::error::CoordError;
pub use config::WorkerConfig;
pub use process::{ProcessSpawner, WorkerProcess};
pub use thread::{ThreadSpawner, ThreadWorker};

/// How a worker ended.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExitReport {
    /// `true` if the worker exited normally.
    pub success: bool,

    /// Exit code, if the worker reported one.
    pub code: Option<i32>,

    /// Captured standard output.
    pub stdout: String,

    /// Captured standard error.
    pub stderr: String,
}

/// Handle on a running worker.
pub trait Worker {
    /// Blocks until the worker ends.
    fn wait(&mut self) -> Result<ExitReport, CoordError>;

    /// Stops the worker without waiting for the protocol to finish.
    fn kill(&mut self) -> Result<(), CoordError>;
}

/// Starts workers.
pub trait Spawner {
    /// Handle of a started worker.
    type Worker: Worker;

    /// Starts a worker with the given command line arguments.
    fn spawn(&mut self, args: &[String]) -> Result<Self::Worker, CoordError>;
}
