//! Collaborators of the controller: flattening, policy and learner.
use super::Episode;
use crate::error::CoordError;
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Turns the raw observation blob into a fixed-length feature vector.
///
/// Implementations must be deterministic and free of side effects.
pub trait Flatten {
    /// Decodes and flattens one observation.
    fn flatten(&self, raw: &[u8]) -> Result<Vec<f64>, CoordError>;

    /// Length of every vector returned by [`Flatten::flatten`], if fixed.
    fn feature_len(&self) -> Option<usize> {
        None
    }
}

/// A policy on the simulator.
///
/// Policy is a mapping from a feature vector to a scalar action.
pub trait Policy {
    /// Chooses an action given the features of the current observation.
    fn sample(&mut self, features: &[f64]) -> f64;
}

/// Represents a trainable policy.
pub trait Learner: Policy {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Updates the policy from the best episodes of a generation.
    ///
    /// `episodes` are sorted by descending cumulative reward.
    fn learn(&mut self, episodes: &[Episode]) -> Result<()>;

    /// Saves the parameters of the policy in the given directory.
    fn persist(&self, model_dir: &Path) -> Result<()>;
}

/// A configurable object.
pub trait Configurable {
    /// Configuration.
    type Config: Clone + DeserializeOwned;

    /// Builds the object.
    fn build(config: Self::Config) -> Self;

    /// Build the object with the configuration in the yaml file of the given path.
    fn build_from_path(path: impl AsRef<Path>) -> Result<Self>
    where
        Self: Sized,
    {
        let file = std::fs::File::open(path)?;
        let rdr = std::io::BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        Ok(Self::build(config))
    }
}
