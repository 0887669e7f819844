use crate::error::CoordError;

/// Moves frames between the two ends of a channel pair.
///
/// [`send`](Transport::send) writes to the outgoing link and
/// [`recv`](Transport::recv) reads from the incoming one. Both block.
pub trait Transport {
    /// Sends one frame to the peer.
    fn send(&mut self, frame: &[u8]) -> Result<(), CoordError>;

    /// Waits for the next frame from the peer.
    fn recv(&mut self) -> Result<Vec<u8>, CoordError>;

    /// Drops the connection to the current peer.
    ///
    /// The next call to `send` or `recv` waits for a new peer.
    fn reset_peer(&mut self) {}

    /// Releases the endpoints. Calling it twice is harmless.
    fn close(&mut self);
}
