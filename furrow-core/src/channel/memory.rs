//! In-process channel pair.
use super::Transport;
use crate::error::CoordError;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// [`Transport`] over in-memory queues.
///
/// Useful to run a simulator on a thread of the controller process. Clones
/// share the same queues, so a clone can be handed to each worker thread.
#[derive(Clone)]
pub struct MemoryTransport {
    tx: Option<Sender<Vec<u8>>>,
    rx: Option<Receiver<Vec<u8>>>,
    recv_timeout: Option<Duration>,
}

/// Creates two connected ends, `(controller, simulator)`.
pub fn memory_pair() -> (MemoryTransport, MemoryTransport) {
    let (action_tx, action_rx) = unbounded();
    let (obs_tx, obs_rx) = unbounded();
    (
        MemoryTransport::new(action_tx, obs_rx),
        MemoryTransport::new(obs_tx, action_rx),
    )
}

impl MemoryTransport {
    fn new(tx: Sender<Vec<u8>>, rx: Receiver<Vec<u8>>) -> Self {
        Self {
            tx: Some(tx),
            rx: Some(rx),
            recv_timeout: None,
        }
    }

    /// Sets the receive timeout.
    pub fn recv_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Number of frames waiting to be received on this end.
    pub fn pending(&self) -> usize {
        self.rx.as_ref().map_or(0, |rx| rx.len())
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, frame: &[u8]) -> Result<(), CoordError> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| CoordError::ChannelDisconnect("transport is closed".to_string()))?;
        tx.send(frame.to_vec())
            .map_err(|_| CoordError::ChannelDisconnect("peer dropped its end".to_string()))
    }

    fn recv(&mut self) -> Result<Vec<u8>, CoordError> {
        let rx = self
            .rx
            .as_ref()
            .ok_or_else(|| CoordError::ChannelDisconnect("transport is closed".to_string()))?;
        match self.recv_timeout {
            None => rx
                .recv()
                .map_err(|_| CoordError::ChannelDisconnect("peer dropped its end".to_string())),
            Some(timeout) => rx.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => CoordError::Timeout(timeout.as_millis() as u64),
                RecvTimeoutError::Disconnected => {
                    CoordError::ChannelDisconnect("peer dropped its end".to_string())
                }
            }),
        }
    }

    fn close(&mut self) {
        self.tx = None;
        self.rx = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_pair() {
        let (mut controller, mut simulator) = memory_pair();
        simulator.send(b"obs").unwrap();
        assert_eq!(controller.pending(), 1);
        assert_eq!(controller.recv().unwrap(), b"obs");
        controller.send(b"act").unwrap();
        assert_eq!(simulator.recv().unwrap(), b"act");

        simulator.close();
        assert!(matches!(
            controller.recv(),
            Err(CoordError::ChannelDisconnect(_))
        ));
        assert!(matches!(
            simulator.send(b"late"),
            Err(CoordError::ChannelDisconnect(_))
        ));
    }

    #[test]
    fn test_memory_timeout() {
        let (controller, _simulator) = memory_pair();
        let mut controller = controller.recv_timeout(Some(Duration::from_millis(10)));
        assert!(matches!(controller.recv(), Err(CoordError::Timeout(10))));
    }
}
