//! Configuration of [`LinearPolicy`](super::LinearPolicy).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`LinearPolicy`](super::LinearPolicy).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct LinearPolicyConfig {
    /// Length of the feature vectors.
    pub n_features: usize,

    /// Action taken before any learning.
    pub init_action: f64,

    /// Standard deviation of the exploration noise in training mode.
    pub noise_std: f64,

    /// Lower bound of the action.
    pub min_action: f64,

    /// Upper bound of the action.
    pub max_action: f64,

    /// Step size of the regression.
    pub learning_rate: f64,

    /// Passes over the selected steps per generation.
    pub n_epochs: usize,

    /// Seed of the exploration noise.
    pub seed: Option<u64>,
}

impl Default for LinearPolicyConfig {
    fn default() -> Self {
        Self {
            n_features: 0,
            init_action: 1.0,
            noise_std: 0.1,
            min_action: 0.0,
            max_action: 2.0,
            learning_rate: 0.01,
            n_epochs: 20,
            seed: None,
        }
    }
}

impl LinearPolicyConfig {
    /// Sets the length of the feature vectors.
    pub fn n_features(mut self, v: usize) -> Self {
        self.n_features = v;
        self
    }

    /// Sets the initial action.
    pub fn init_action(mut self, v: f64) -> Self {
        self.init_action = v;
        self
    }

    /// Sets the standard deviation of the exploration noise.
    pub fn noise_std(mut self, v: f64) -> Self {
        self.noise_std = v;
        self
    }

    /// Sets the bounds of the action.
    pub fn action_range(mut self, min: f64, max: f64) -> Self {
        self.min_action = min;
        self.max_action = max;
        self
    }

    /// Sets the step size of the regression.
    pub fn learning_rate(mut self, v: f64) -> Self {
        self.learning_rate = v;
        self
    }

    /// Sets the number of passes per generation.
    pub fn n_epochs(mut self, v: usize) -> Self {
        self.n_epochs = v;
        self
    }

    /// Sets the seed of the exploration noise.
    pub fn seed(mut self, v: Option<u64>) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`LinearPolicyConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`LinearPolicyConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
