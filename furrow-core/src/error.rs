//! Errors in the library.
use thiserror::Error;

/// Errors raised while coordinating simulator workers.
///
/// None of these is retried. Any of them stops the current generation and,
/// when returned from [`GenerationLoop::run`](crate::GenerationLoop::run),
/// the whole loop.
#[derive(Error, Debug)]
pub enum CoordError {
    /// The worker executable could not be started.
    #[error("Failed to spawn worker {program}: {source}")]
    Spawn {
        /// Program that was launched.
        program: String,

        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The peer closed its end of a channel or could not be reached.
    #[error("Channel disconnected: {0}")]
    ChannelDisconnect(String),

    /// A binary record on the observation channel could not be decoded.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// A scalar channel received text that is not a number.
    #[error("Protocol desync: expected a decimal scalar, got {0:?}")]
    ProtocolDesync(String),

    /// No message arrived within the configured receive timeout.
    #[error("Timed out after {0} ms waiting for the simulator")]
    Timeout(u64),

    /// I/O failure outside the channel pair, e.g. on a side file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
