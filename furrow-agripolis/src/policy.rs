//! Linear policy on farm features.
mod config;
use anyhow::{anyhow, Result};
pub use config::LinearPolicyConfig;
use furrow_core::{Configurable, Episode, Learner, Policy};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

const MODEL_FILE: &str = "linear_policy.yaml";

/// Parameters of [`LinearPolicy`].
///
/// Features are standardized with `mean` and `scale` before the dot product.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct LinearModel {
    /// Weights of the standardized features.
    pub weights: Vec<f64>,

    /// Bias.
    pub bias: f64,

    /// Mean of every feature.
    pub mean: Vec<f64>,

    /// Scale of every feature.
    pub scale: Vec<f64>,
}

impl LinearModel {
    fn new(n_features: usize, bias: f64) -> Self {
        Self {
            weights: vec![0.0; n_features],
            bias,
            mean: vec![0.0; n_features],
            scale: vec![1.0; n_features],
        }
    }

    fn standardize(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    fn predict_standardized(&self, z: &[f64]) -> f64 {
        self.weights.iter().zip(z).map(|(w, v)| w * v).sum::<f64>() + self.bias
    }

    /// Output of the model before clipping.
    pub fn predict(&self, x: &[f64]) -> f64 {
        self.predict_standardized(&self.standardize(x))
    }

    fn fit_scaler(&mut self, xs: &[&[f64]]) {
        let n = xs.len() as f64;
        for i in 0..self.mean.len() {
            let mean = xs.iter().map(|x| x[i]).sum::<f64>() / n;
            let var = xs.iter().map(|x| (x[i] - mean).powi(2)).sum::<f64>() / n;
            self.mean[i] = mean;
            self.scale[i] = if var > 1e-12 { var.sqrt() } else { 1.0 };
        }
    }
}

/// Linear policy with Gaussian exploration noise.
///
/// The action is `clamp(w . z + b + noise, min_action, max_action)`, where
/// `z` is the standardized feature vector and the noise is only added in
/// training mode. [`Learner::learn`] regresses the actions taken in the
/// selected episodes on their states, skipping sentinel steps.
pub struct LinearPolicy {
    config: LinearPolicyConfig,
    model: LinearModel,
    rng: fastrand::Rng,
    train: bool,
}

impl Configurable for LinearPolicy {
    type Config = LinearPolicyConfig;

    fn build(config: Self::Config) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self {
            model: LinearModel::new(config.n_features, config.init_action),
            config,
            rng,
            train: true,
        }
    }
}

impl LinearPolicy {
    /// Current parameters.
    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    /// Loads parameters saved by [`Learner::persist`].
    pub fn load(&mut self, model_dir: impl AsRef<Path>) -> Result<()> {
        let path = model_dir.as_ref().join(MODEL_FILE);
        let rdr = BufReader::new(File::open(&path)?);
        let model: LinearModel = serde_yaml::from_reader(rdr)?;
        if model.weights.len() != self.config.n_features {
            return Err(anyhow!(
                "{:?} has {} weights, expected {}",
                path,
                model.weights.len(),
                self.config.n_features
            ));
        }
        self.model = model;
        info!("Loaded the model from {:?}", path);
        Ok(())
    }

    fn noise(&mut self) -> f64 {
        // Box-Muller
        let u1 = 1.0 - self.rng.f64();
        let u2 = self.rng.f64();
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos() * self.config.noise_std
    }

    fn clip(&self, action: f64) -> f64 {
        action.max(self.config.min_action).min(self.config.max_action)
    }
}

impl Policy for LinearPolicy {
    fn sample(&mut self, features: &[f64]) -> f64 {
        let mut action = self.model.predict(features);
        if self.train && self.config.noise_std > 0.0 {
            action += self.noise();
        }
        self.clip(action)
    }
}

impl Learner for LinearPolicy {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn learn(&mut self, episodes: &[Episode]) -> Result<()> {
        let n = self.config.n_features;
        let pairs: Vec<(&[f64], f64)> = episodes
            .iter()
            .flat_map(|e| e.steps())
            .filter(|s| !s.is_sentinel())
            .map(|s| (s.state.as_slice(), s.action))
            .collect();
        if pairs.is_empty() {
            debug!("No steps to learn from");
            return Ok(());
        }
        if let Some((x, _)) = pairs.iter().find(|(x, _)| x.len() != n) {
            return Err(anyhow!("state of {} features, expected {}", x.len(), n));
        }

        let xs: Vec<&[f64]> = pairs.iter().map(|(x, _)| *x).collect();
        self.model.fit_scaler(&xs);
        let zs: Vec<Vec<f64>> = xs.iter().map(|x| self.model.standardize(x)).collect();

        let lr = self.config.learning_rate;
        let mut mse = 0.0;
        for _ in 0..self.config.n_epochs {
            mse = 0.0;
            for (z, (_, y)) in zs.iter().zip(&pairs) {
                let err = self.model.predict_standardized(z) - y;
                for (w, v) in self.model.weights.iter_mut().zip(z) {
                    *w -= lr * err * v;
                }
                self.model.bias -= lr * err;
                mse += err * err;
            }
            mse /= zs.len() as f64;
        }
        debug!("Fitted {} steps, mse {}", zs.len(), mse);
        Ok(())
    }

    fn persist(&self, model_dir: &Path) -> Result<()> {
        let mut file = File::create(model_dir.join(MODEL_FILE))?;
        file.write_all(serde_yaml::to_string(&self.model)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use furrow_core::StepRecord;
    use tempdir::TempDir;

    fn policy() -> LinearPolicy {
        LinearPolicy::build(
            LinearPolicyConfig::default()
                .n_features(2)
                .init_action(0.5)
                .seed(Some(42)),
        )
    }

    #[test]
    fn test_eval_mode_is_deterministic() {
        let mut policy = policy();
        policy.eval();
        assert_eq!(policy.sample(&[3.0, 4.0]), 0.5);
        assert_eq!(policy.sample(&[3.0, 4.0]), 0.5);

        policy.train();
        let actions: Vec<f64> = (0..20).map(|_| policy.sample(&[3.0, 4.0])).collect();
        assert!(actions.iter().any(|&a| a != 0.5));
        assert!(actions.iter().all(|&a| (0.0..=2.0).contains(&a)));
    }

    #[test]
    fn test_learn_moves_towards_selected_actions() -> Result<()> {
        let mut policy = LinearPolicy::build(
            LinearPolicyConfig::default()
                .n_features(2)
                .init_action(0.5)
                .learning_rate(0.05)
                .n_epochs(200),
        );
        let episode: Episode = vec![
            StepRecord::new(vec![0.0, 1.0], 1.5, 10.0),
            StepRecord::new(vec![1.0, 1.0], 1.5, 10.0),
            StepRecord::sentinel(5.0),
        ]
        .into_iter()
        .collect();

        policy.learn(&[episode])?;
        policy.eval();
        assert!((policy.sample(&[0.5, 1.0]) - 1.5).abs() < 0.05);
        Ok(())
    }

    #[test]
    fn test_learn_rejects_wrong_length() {
        let mut policy = policy();
        let episode: Episode = vec![StepRecord::new(vec![0.0], 1.0, 1.0)]
            .into_iter()
            .collect();
        assert!(policy.learn(&[episode]).is_err());
    }

    #[test]
    fn test_persist_and_load() -> Result<()> {
        let dir = TempDir::new("linear_policy")?;
        let mut policy = policy();
        policy.model.weights = vec![0.25, -1.0];
        policy.persist(dir.path())?;

        let mut loaded = LinearPolicy::build(LinearPolicyConfig::default().n_features(2));
        loaded.load(dir.path())?;
        assert_eq!(loaded.model(), policy.model());

        let mut wrong = LinearPolicy::build(LinearPolicyConfig::default().n_features(3));
        assert!(wrong.load(dir.path()).is_err());
        Ok(())
    }
}
