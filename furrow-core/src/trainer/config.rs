//! Configuration of [`GenerationLoop`](super::GenerationLoop).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`GenerationLoop`](super::GenerationLoop).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct GenerationLoopConfig {
    /// The number of generations.
    pub epochs: usize,

    /// The number of training workers per generation.
    pub simus: usize,

    /// The number of steps of every episode.
    pub runs: usize,

    /// The number of episodes handed to the learner per generation.
    pub topn: usize,

    /// Where to persist the model after each generation.
    pub model_dir: Option<String>,

    /// Tab-separated log of the best step of each generation.
    pub best_step_log: Option<String>,

    /// Value sent on the action channel after the last step of an episode.
    pub final_signal: Option<f64>,
}

impl Default for GenerationLoopConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            simus: 10,
            runs: 25,
            topn: 3,
            model_dir: None,
            best_step_log: None,
            final_signal: None,
        }
    }
}

impl GenerationLoopConfig {
    /// Sets the number of generations.
    pub fn epochs(mut self, v: usize) -> Self {
        self.epochs = v;
        self
    }

    /// Sets the number of training workers per generation.
    pub fn simus(mut self, v: usize) -> Self {
        self.simus = v;
        self
    }

    /// Sets the number of steps per episode.
    pub fn runs(mut self, v: usize) -> Self {
        self.runs = v;
        self
    }

    /// Sets the number of selected episodes per generation.
    pub fn topn(mut self, v: usize) -> Self {
        self.topn = v;
        self
    }

    /// Sets the directory where the model is persisted.
    pub fn model_dir(mut self, model_dir: impl Into<String>) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Sets the path of the best-step log.
    pub fn best_step_log(mut self, path: impl Into<String>) -> Self {
        self.best_step_log = Some(path.into());
        self
    }

    /// Sets the final signal.
    pub fn final_signal(mut self, v: Option<f64>) -> Self {
        self.final_signal = v;
        self
    }

    /// Constructs [`GenerationLoopConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`GenerationLoopConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_generation_loop_config() -> Result<()> {
        let config = GenerationLoopConfig::default()
            .epochs(3)
            .simus(4)
            .topn(2)
            .model_dir("some/directory")
            .final_signal(Some(0.0));

        let dir = TempDir::new("generation_loop_config")?;
        let path = dir.path().join("generation_loop_config.yaml");
        config.save(&path)?;
        let config_ = GenerationLoopConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
