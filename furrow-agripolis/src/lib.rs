#![warn(missing_docs)]
//! AgriPoliS collaborators of the furrow controller.
//!
//! * [`RlData`] is the observation sent by a farm at each period, encoded
//!   with `bincode`.
//! * [`RlDataFlattener`] turns it into the feature vector described by an
//!   [`ObsSchema`].
//! * [`LinearPolicy`] chooses the scalar action and learns from the best
//!   episodes of each generation.
//! * [`MockFarm`] plays the simulator side of the protocol, standing in for
//!   the AgriPoliS executable.
mod config;
mod flatten;
pub mod mock;
mod obs;
mod policy;
pub use config::FurrowConfig;
pub use flatten::{ObsSchema, RlDataFlattener};
pub use mock::{MockFarm, MockFarmConfig};
pub use obs::{Invest, RlData};
pub use policy::{LinearModel, LinearPolicy, LinearPolicyConfig};
