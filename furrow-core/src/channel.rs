//! Message channel pair between the controller and a simulator worker.
//!
//! The pair consists of two one-directional links:
//!
//! * the *action channel*, controller to worker, carrying actions and the
//!   optional final signal;
//! * the *observation channel*, worker to controller, carrying observations,
//!   rewards and termination flags.
//!
//! Every message is one length-delimited frame. Observations are opaque
//! binary records; scalars are decimal text tokens. Delivery is ordered per
//! direction and every call blocks.
mod config;
mod frame;
mod memory;
mod pair;
mod tcp;
mod transport;
pub use config::ChannelConfig;
pub use frame::{decode_scalar, encode_scalar, read_frame, write_frame, MAX_FRAME_LEN};
pub use memory::{memory_pair, MemoryTransport};
pub use pair::{ControllerChannels, SimulatorChannels};
pub use tcp::TcpTransport;
pub use transport::Transport;
