#![warn(missing_docs)]
//! Coordination of episodic interaction between a learning controller and
//! external simulator processes.
//!
//! A controller and one simulator worker at a time exchange, per step, an
//! observation, an action, a reward and a termination flag over a pair of
//! one-directional channels. Complete episodes of a generation are ranked
//! by cumulative reward and the best `topn` are handed to a learner.
//!
//! * [`channel`] provides the channel pair: framing, the [`Transport`]
//!   trait with TCP and in-memory implementations, and the typed
//!   [`ControllerChannels`] and [`SimulatorChannels`] ends.
//! * [`worker`] spawns and joins simulator workers.
//! * [`EpisodeRunner`] performs the per-step handshake with one worker.
//! * [`EpisodeSelector`] keeps the best episodes of a generation.
//! * [`EvaluationRunner`] runs the held-out evaluation worker.
//! * [`GenerationLoop`] ties everything together.
pub mod channel;
pub mod dummy;
pub mod error;
pub mod record;
pub mod scenario;
pub mod side_log;
pub mod worker;

mod base;
pub use base::{
    sentinel_state, Configurable, Episode, Flatten, Learner, Policy, StepRecord,
    TerminationSignal, SENTINEL_ACTION,
};

pub use channel::{ChannelConfig, ControllerChannels, SimulatorChannels, Transport};

mod episode;
pub use episode::{EpisodeRunner, EpisodeSelector};

mod evaluator;
pub use evaluator::EvaluationRunner;

mod trainer;
pub use trainer::{GenerationLoop, GenerationLoopConfig, GenerationSummary};
