//! Workers as threads of the controller process.
use super::{ExitReport, Spawner, Worker};
use crate::error::CoordError;
use anyhow::Result;
use log::warn;
use std::thread::{self, JoinHandle};

/// Runs an in-process simulator on a new thread for every worker.
///
/// `body` receives the index of the worker and its arguments. This is how
/// the generation loop is exercised without an external executable.
pub struct ThreadSpawner<F> {
    body: F,
    n_spawned: usize,
}

impl<F> ThreadSpawner<F>
where
    F: Fn(usize, Vec<String>) -> Result<()> + Clone + Send + 'static,
{
    /// Constructs a spawner running `body`.
    pub fn new(body: F) -> Self {
        Self {
            body,
            n_spawned: 0,
        }
    }

    /// Number of workers spawned so far.
    pub fn n_spawned(&self) -> usize {
        self.n_spawned
    }
}

impl<F> Spawner for ThreadSpawner<F>
where
    F: Fn(usize, Vec<String>) -> Result<()> + Clone + Send + 'static,
{
    type Worker = ThreadWorker;

    fn spawn(&mut self, args: &[String]) -> Result<ThreadWorker, CoordError> {
        let body = self.body.clone();
        let index = self.n_spawned;
        let args = args.to_vec();
        let handle = thread::Builder::new()
            .name(format!("worker-{}", index))
            .spawn(move || body(index, args))
            .map_err(|source| CoordError::Spawn {
                program: format!("worker-{}", index),
                source,
            })?;
        self.n_spawned += 1;
        Ok(ThreadWorker {
            handle: Some(handle),
        })
    }
}

/// Handle on an in-process worker.
pub struct ThreadWorker {
    handle: Option<JoinHandle<Result<()>>>,
}

impl Worker for ThreadWorker {
    fn wait(&mut self) -> Result<ExitReport, CoordError> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => return Ok(ExitReport::default()),
        };
        let report = match handle.join() {
            Ok(Ok(())) => ExitReport {
                success: true,
                code: Some(0),
                ..ExitReport::default()
            },
            Ok(Err(e)) => ExitReport {
                success: false,
                code: Some(1),
                stderr: format!("{:#}", e),
                ..ExitReport::default()
            },
            Err(_) => ExitReport {
                success: false,
                code: None,
                stderr: "worker thread panicked".to_string(),
                ..ExitReport::default()
            },
        };
        if !report.success {
            warn!("In-process worker failed: {}", report.stderr);
        }
        Ok(report)
    }

    /// Threads cannot be stopped from outside; the worker is detached.
    fn kill(&mut self) -> Result<(), CoordError> {
        if self.handle.take().is_some() {
            warn!("Detached in-process worker");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_workers() {
        let mut spawner = ThreadSpawner::new(|index, args: Vec<String>| {
            if args.is_empty() {
                anyhow::bail!("worker {} got no input file", index);
            }
            Ok(())
        });

        let mut ok = spawner.spawn(&["input".to_string()]).unwrap();
        let mut failing = spawner.spawn(&[]).unwrap();
        assert_eq!(spawner.n_spawned(), 2);

        assert!(ok.wait().unwrap().success);
        let report = failing.wait().unwrap();
        assert!(!report.success);
        assert_eq!(report.stderr, "worker 1 got no input file");
    }
}
