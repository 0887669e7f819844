//! Typed ends of the channel pair.
use super::{
    frame::{decode_scalar, encode_scalar},
    ChannelConfig, TcpTransport, Transport,
};
use crate::{error::CoordError, TerminationSignal};
use log::{debug, trace};

/// Controller end of the channel pair.
///
/// Acquired once for the lifetime of a generation loop. The transport is
/// released by [`close`](ControllerChannels::close) or, on any other exit
/// path, when the value is dropped.
pub struct ControllerChannels<T: Transport> {
    transport: T,
    closed: bool,
}

impl ControllerChannels<TcpTransport> {
    /// Binds the observation endpoint and prepares the action endpoint.
    pub fn open_tcp(config: &ChannelConfig) -> Result<Self, CoordError> {
        Ok(Self::new(TcpTransport::open(config)?))
    }
}

impl<T: Transport> ControllerChannels<T> {
    /// Wraps a transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            closed: false,
        }
    }

    /// Sends the action of the current step.
    pub fn send_action(&mut self, action: f64) -> Result<(), CoordError> {
        trace!("-> action {}", action);
        self.transport.send(&encode_scalar(action))
    }

    /// Sends the end-of-episode signal.
    pub fn send_final_signal(&mut self, value: f64) -> Result<(), CoordError> {
        trace!("-> final signal {}", value);
        self.transport.send(&encode_scalar(value))
    }

    /// Receives the serialized observation of the current step.
    pub fn recv_observation(&mut self) -> Result<Vec<u8>, CoordError> {
        let blob = self.transport.recv()?;
        trace!("<- observation ({} bytes)", blob.len());
        Ok(blob)
    }

    /// Receives the reward of the current step.
    pub fn recv_reward(&mut self) -> Result<f64, CoordError> {
        let reward = decode_scalar(&self.transport.recv()?)?;
        trace!("<- reward {}", reward);
        Ok(reward)
    }

    /// Receives the closure flag of the current step.
    pub fn recv_termination(&mut self) -> Result<TerminationSignal, CoordError> {
        let signal = TerminationSignal::from_wire(decode_scalar(&self.transport.recv()?)?);
        trace!("<- termination {:?}", signal);
        Ok(signal)
    }

    /// Forgets the worker that just finished.
    pub fn reset_peer(&mut self) {
        self.transport.reset_peer();
    }

    /// Mutable access to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Releases the transport.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.closed {
            self.transport.close();
            self.closed = true;
            debug!("Closed controller channels");
        }
    }
}

impl<T: Transport> Drop for ControllerChannels<T> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Simulator end of the channel pair.
pub struct SimulatorChannels<T: Transport> {
    transport: T,
}

impl SimulatorChannels<TcpTransport> {
    /// Binds the action endpoint and prepares the observation endpoint.
    pub fn open_tcp(config: &ChannelConfig) -> Result<Self, CoordError> {
        Ok(Self::new(TcpTransport::open(config)?))
    }
}

impl<T: Transport> SimulatorChannels<T> {
    /// Wraps a transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Sends a serialized observation.
    pub fn send_observation(&mut self, blob: &[u8]) -> Result<(), CoordError> {
        self.transport.send(blob)
    }

    /// Sends the reward of the step just taken.
    pub fn send_reward(&mut self, reward: f64) -> Result<(), CoordError> {
        self.transport.send(&encode_scalar(reward))
    }

    /// Sends the closure flag of the step just taken.
    pub fn send_termination_flag(&mut self, signal: TerminationSignal) -> Result<(), CoordError> {
        self.transport.send(&encode_scalar(signal.to_wire()))
    }

    /// Receives the action chosen by the controller.
    pub fn recv_action(&mut self) -> Result<f64, CoordError> {
        decode_scalar(&self.transport.recv()?)
    }

    /// Receives the end-of-episode signal.
    pub fn recv_final_signal(&mut self) -> Result<f64, CoordError> {
        decode_scalar(&self.transport.recv()?)
    }

    /// Releases the transport.
    pub fn close(mut self) {
        self.transport.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::memory_pair;

    #[test]
    fn test_typed_messages() {
        let (c, s) = memory_pair();
        let mut controller = ControllerChannels::new(c);
        let mut simulator = SimulatorChannels::new(s);

        simulator.send_observation(&[9, 8, 7]).unwrap();
        assert_eq!(controller.recv_observation().unwrap(), vec![9, 8, 7]);

        controller.send_action(1.25).unwrap();
        assert_eq!(simulator.recv_action().unwrap(), 1.25);

        simulator.send_reward(-3.5).unwrap();
        simulator
            .send_termination_flag(TerminationSignal::closed(2))
            .unwrap();
        assert_eq!(controller.recv_reward().unwrap(), -3.5);
        assert_eq!(
            controller.recv_termination().unwrap(),
            TerminationSignal::closed(2)
        );

        controller.send_final_signal(0.0).unwrap();
        assert_eq!(simulator.recv_final_signal().unwrap(), 0.0);
    }

    #[test]
    fn test_reward_desync() {
        let (c, s) = memory_pair();
        let mut controller = ControllerChannels::new(c);
        let mut simulator = SimulatorChannels::new(s);

        // An observation where a reward is expected.
        simulator.send_observation(&[0xde, 0xad]).unwrap();
        assert!(matches!(
            controller.recv_reward(),
            Err(CoordError::ProtocolDesync(_))
        ));
    }
}
