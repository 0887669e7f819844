//! Channel pair over TCP.
use super::{
    frame::{read_frame, write_frame},
    ChannelConfig, Transport,
};
use crate::error::CoordError;
use log::{debug, trace, warn};
use std::{
    io::{self, BufReader, BufWriter},
    net::{SocketAddr, TcpListener, TcpStream},
    thread,
    time::{Duration, Instant},
};

const ACCEPT_POLL: Duration = Duration::from_millis(5);
const WARN_EVERY_ATTEMPTS: usize = 200;

/// [`Transport`] that listens for the incoming link and dials the outgoing one.
///
/// Both peer connections are established lazily: the incoming one on the
/// first [`recv`](Transport::recv), the outgoing one on the first
/// [`send`](Transport::send), retrying until the peer listens. After
/// [`reset_peer`](Transport::reset_peer) the next worker is picked up the
/// same way, while the listening socket stays bound for the whole lifetime
/// of the transport.
pub struct TcpTransport {
    listener: Option<TcpListener>,
    send_addr: String,
    inbound: Option<BufReader<TcpStream>>,
    outbound: Option<BufWriter<TcpStream>>,
    connect_retry: Duration,
    recv_timeout: Option<Duration>,
}

impl TcpTransport {
    /// Binds the incoming endpoint of `config`.
    pub fn open(config: &ChannelConfig) -> Result<Self, CoordError> {
        let listener = TcpListener::bind(&config.recv_addr).map_err(|e| {
            CoordError::ChannelDisconnect(format!("cannot bind {}: {}", config.recv_addr, e))
        })?;
        debug!(
            "Listening on {:?}, peer at {}",
            listener.local_addr().ok(),
            config.send_addr
        );

        Ok(Self {
            listener: Some(listener),
            send_addr: config.send_addr.clone(),
            inbound: None,
            outbound: None,
            connect_retry: config.connect_retry(),
            recv_timeout: config.recv_timeout(),
        })
    }

    /// Address actually bound for incoming frames.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    fn timeout_error(&self) -> CoordError {
        CoordError::Timeout(self.recv_timeout.map_or(0, |t| t.as_millis() as u64))
    }

    fn accept(&self) -> Result<TcpStream, CoordError> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| CoordError::ChannelDisconnect("transport is closed".to_string()))?;
        let disconnect = |e: io::Error| CoordError::ChannelDisconnect(format!("accept: {}", e));

        let stream = match self.recv_timeout {
            None => listener.accept().map_err(disconnect)?.0,
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                listener.set_nonblocking(true).map_err(disconnect)?;
                let accepted = loop {
                    match listener.accept() {
                        Ok((stream, _)) => break Ok(stream),
                        Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                            if Instant::now() >= deadline {
                                break Err(self.timeout_error());
                            }
                            thread::sleep(ACCEPT_POLL);
                        }
                        Err(e) => break Err(disconnect(e)),
                    }
                };
                listener.set_nonblocking(false).map_err(disconnect)?;
                let stream = accepted?;
                stream.set_nonblocking(false).map_err(disconnect)?;
                stream
            }
        };
        stream
            .set_read_timeout(self.recv_timeout)
            .map_err(disconnect)?;
        stream.set_nodelay(true).map_err(disconnect)?;
        debug!("Accepted peer {:?}", stream.peer_addr().ok());
        Ok(stream)
    }

    fn connect(&self) -> Result<TcpStream, CoordError> {
        let deadline = self.recv_timeout.map(|t| Instant::now() + t);
        let mut attempts = 0usize;

        loop {
            match TcpStream::connect(self.send_addr.as_str()) {
                Ok(stream) => {
                    stream.set_nodelay(true).map_err(|e| {
                        CoordError::ChannelDisconnect(format!("connect: {}", e))
                    })?;
                    debug!("Connected to {} after {} retries", self.send_addr, attempts);
                    return Ok(stream);
                }
                Err(e) if is_retryable(&e) => {
                    if deadline.map_or(false, |d| Instant::now() >= d) {
                        return Err(self.timeout_error());
                    }
                    attempts += 1;
                    if attempts % WARN_EVERY_ATTEMPTS == 0 {
                        warn!(
                            "Still waiting for a peer at {} ({} attempts)",
                            self.send_addr, attempts
                        );
                    }
                    thread::sleep(self.connect_retry);
                }
                Err(e) => {
                    return Err(CoordError::ChannelDisconnect(format!(
                        "cannot connect to {}: {}",
                        self.send_addr, e
                    )))
                }
            }
        }
    }

    fn map_read_error(&self, e: io::Error) -> CoordError {
        match e.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => self.timeout_error(),
            io::ErrorKind::InvalidData => CoordError::MalformedMessage(e.to_string()),
            _ => CoordError::ChannelDisconnect(format!("incoming link: {}", e)),
        }
    }
}

fn is_retryable(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::TimedOut
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::Interrupted
    )
}

impl Transport for TcpTransport {
    fn send(&mut self, frame: &[u8]) -> Result<(), CoordError> {
        if self.outbound.is_none() {
            let stream = self.connect()?;
            self.outbound = Some(BufWriter::new(stream));
        }
        let writer = self
            .outbound
            .as_mut()
            .ok_or_else(|| CoordError::ChannelDisconnect("no outgoing link".to_string()))?;

        match write_frame(writer, frame) {
            Ok(()) => {
                trace!("Sent frame of {} bytes", frame.len());
                Ok(())
            }
            Err(e) => {
                self.outbound = None;
                Err(CoordError::ChannelDisconnect(format!("outgoing link: {}", e)))
            }
        }
    }

    fn recv(&mut self) -> Result<Vec<u8>, CoordError> {
        if self.inbound.is_none() {
            let stream = self.accept()?;
            self.inbound = Some(BufReader::new(stream));
        }
        let reader = self
            .inbound
            .as_mut()
            .ok_or_else(|| CoordError::ChannelDisconnect("no incoming link".to_string()))?;

        let result = read_frame(reader);
        match result {
            Ok(frame) => {
                trace!("Received frame of {} bytes", frame.len());
                Ok(frame)
            }
            Err(e) => {
                self.inbound = None;
                Err(self.map_read_error(e))
            }
        }
    }

    fn reset_peer(&mut self) {
        self.inbound = None;
        self.outbound = None;
    }

    fn close(&mut self) {
        self.reset_peer();
        if self.listener.take().is_some() {
            debug!("Closed TCP transport");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    fn endpoints() -> (ChannelConfig, ChannelConfig) {
        let (a, b) = (free_port(), free_port());
        let controller = ChannelConfig::default()
            .recv_addr(format!("127.0.0.1:{}", a))
            .send_addr(format!("127.0.0.1:{}", b))
            .connect_retry_millis(5)
            .recv_timeout_millis(Some(5000));
        let simulator = ChannelConfig::simulator()
            .recv_addr(format!("127.0.0.1:{}", b))
            .send_addr(format!("127.0.0.1:{}", a))
            .connect_retry_millis(5)
            .recv_timeout_millis(Some(5000));
        (controller, simulator)
    }

    #[test]
    fn test_exchange_and_peer_reset() {
        let (c_config, s_config) = endpoints();
        let mut controller = TcpTransport::open(&c_config).unwrap();

        for round in 0..2u8 {
            let s_config = s_config.clone();
            let handle = thread::spawn(move || {
                let mut sim = TcpTransport::open(&s_config).unwrap();
                sim.send(&[round, 1, 2]).unwrap();
                let reply = sim.recv().unwrap();
                sim.close();
                reply
            });

            assert_eq!(controller.recv().unwrap(), vec![round, 1, 2]);
            controller.send(b"ack").unwrap();
            assert_eq!(handle.join().unwrap(), b"ack");
            controller.reset_peer();
        }
        controller.close();
        assert!(controller.local_addr().is_none());
    }

    #[test]
    fn test_peer_exit_is_disconnect() {
        let (c_config, s_config) = endpoints();
        let mut controller = TcpTransport::open(&c_config).unwrap();

        let handle = thread::spawn(move || {
            let mut sim = TcpTransport::open(&s_config).unwrap();
            sim.send(b"only").unwrap();
        });
        assert_eq!(controller.recv().unwrap(), b"only");
        handle.join().unwrap();
        assert!(matches!(
            controller.recv(),
            Err(CoordError::ChannelDisconnect(_))
        ));
    }

    #[test]
    fn test_recv_timeout() {
        let (c_config, _) = endpoints();
        let mut controller =
            TcpTransport::open(&c_config.recv_timeout_millis(Some(50))).unwrap();
        assert!(matches!(controller.recv(), Err(CoordError::Timeout(50))));
        assert!(matches!(controller.send(b"x"), Err(CoordError::Timeout(50))));
    }
}
