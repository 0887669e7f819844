//! Core data types and collaborator traits.
mod policy;
mod step;
pub use policy::{Configurable, Flatten, Learner, Policy};
pub use step::{sentinel_state, Episode, StepRecord, TerminationSignal, SENTINEL_ACTION};
