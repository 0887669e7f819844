//! Configuration of a training run.
use crate::{LinearPolicyConfig, ObsSchema};
use anyhow::Result;
use furrow_core::{worker::WorkerConfig, ChannelConfig, GenerationLoopConfig};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Everything `furrow-train` needs, in one YAML file.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Clone)]
pub struct FurrowConfig {
    /// Endpoints of the controller side.
    pub channel: ChannelConfig,

    /// Command lines of the simulator workers.
    pub worker: WorkerConfig,

    /// Generations, batch size and selection.
    pub generation: GenerationLoopConfig,

    /// Shape of the observations.
    pub schema: ObsSchema,

    /// Policy trained by the loop.
    pub policy: LinearPolicyConfig,
}

impl FurrowConfig {
    /// Policy configuration with the feature length of the schema.
    pub fn policy_config(&self) -> LinearPolicyConfig {
        self.policy.clone().n_features(self.schema.feature_len())
    }

    /// Constructs [`FurrowConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`FurrowConfig`].
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
    fn test_serde_furrow_config() -> Result<()> {
        let mut config = FurrowConfig::default();
        config.generation = config.generation.epochs(2).topn(4);
        config.worker = config.worker.program("mock-farm");

        let dir = TempDir::new("furrow_config")?;
        let path = dir.path().join("furrow.yaml");
        config.save(&path)?;
        let config_ = FurrowConfig::load(&path)?;
        assert_eq!(config, config_);
        assert_eq!(config_.policy_config().n_features, 25);
        Ok(())
    }
}
