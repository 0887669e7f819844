//! Workers as external processes.
use super::{ExitReport, Spawner, Worker};
use crate::error::CoordError;
use log::{debug, warn};
use std::{
    io::Read,
    process::{Child, Command, Stdio},
    thread::{self, JoinHandle},
};

/// Spawns the simulator executable.
pub struct ProcessSpawner {
    program: String,
}

impl ProcessSpawner {
    /// Constructs a spawner of `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Spawner for ProcessSpawner {
    type Worker = WorkerProcess;

    fn spawn(&mut self, args: &[String]) -> Result<WorkerProcess, CoordError> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CoordError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        debug!("Spawned {} {:?} (pid {})", self.program, args, child.id());

        // Both pipes are read on their own threads until the worker exits.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        Ok(WorkerProcess {
            child,
            program: self.program.clone(),
            stdout,
            stderr,
            joined: false,
        })
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// A running simulator process.
///
/// Its standard output and error are captured as text. Dropping a handle
/// that was never joined kills the process.
pub struct WorkerProcess {
    child: Child,
    program: String,
    stdout: Option<JoinHandle<String>>,
    stderr: Option<JoinHandle<String>>,
    joined: bool,
}

impl WorkerProcess {
    /// OS process id.
    pub fn id(&self) -> u32 {
        self.child.id()
    }
}

impl Worker for WorkerProcess {
    fn wait(&mut self) -> Result<ExitReport, CoordError> {
        let status = self.child.wait()?;
        self.joined = true;
        let report = ExitReport {
            success: status.success(),
            code: status.code(),
            stdout: collect(self.stdout.take()),
            stderr: collect(self.stderr.take()),
        };
        if report.success {
            debug!("{} exited with {:?}", self.program, report.code);
        } else {
            warn!(
                "{} exited with {:?}: {}",
                self.program,
                report.code,
                report.stderr.trim()
            );
        }
        Ok(report)
    }

    fn kill(&mut self) -> Result<(), CoordError> {
        if self.joined {
            return Ok(());
        }
        // Fails only if the process already exited.
        let _ = self.child.kill();
        self.child.wait()?;
        self.joined = true;
        warn!("Killed {} (pid {})", self.program, self.child.id());
        Ok(())
    }
}

impl Drop for WorkerProcess {
    fn drop(&mut self) {
        if !self.joined {
            let _ = self.kill();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_spawn_error() {
        let mut spawner = ProcessSpawner::new("/nonexistent/furrow-simulator");
        match spawner.spawn(&[]) {
            Err(CoordError::Spawn { program, .. }) => {
                assert_eq!(program, "/nonexistent/furrow-simulator")
            }
            Err(e) => panic!("unexpected error {:?}", e),
            Ok(_) => panic!("spawned a missing program"),
        }
    }

    #[test]
    fn test_wait_captures_output() {
        let mut spawner = ProcessSpawner::new("sh");
        let args = vec!["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()];
        let mut worker = spawner.spawn(&args).unwrap();
        let report = worker.wait().unwrap();
        assert!(!report.success);
        assert_eq!(report.code, Some(3));
        assert_eq!(report.stdout.trim(), "out");
        assert_eq!(report.stderr.trim(), "err");
    }

    #[test]
    fn test_kill_hung_worker() {
        let mut spawner = ProcessSpawner::new("sleep");
        let mut worker = spawner.spawn(&["30".to_string()]).unwrap();
        worker.kill().unwrap();
        // Killing twice is harmless.
        worker.kill().unwrap();
    }
}
