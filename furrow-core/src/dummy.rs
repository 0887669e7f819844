//! Stand-ins for the collaborators, used in tests.
use crate::{
    channel::{SimulatorChannels, Transport},
    error::CoordError,
    Episode, Flatten, Learner, Policy, TerminationSignal,
};
use anyhow::Result;
use std::{cell::Cell, path::Path};

/// Encodes features as consecutive little-endian `f64`s.
pub fn encode_features(features: &[f64]) -> Vec<u8> {
    features.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Flattens observations encoded with [`encode_features`].
#[derive(Clone, Debug)]
pub struct RawFeatures {
    len: usize,
}

impl RawFeatures {
    /// Expects `len` features per observation.
    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl Flatten for RawFeatures {
    fn flatten(&self, raw: &[u8]) -> Result<Vec<f64>, CoordError> {
        if raw.len() != self.len * 8 {
            return Err(CoordError::MalformedMessage(format!(
                "expected {} bytes, got {}",
                self.len * 8,
                raw.len()
            )));
        }
        Ok(raw
            .chunks_exact(8)
            .map(|c| {
                let mut b = [0u8; 8];
                b.copy_from_slice(c);
                f64::from_le_bytes(b)
            })
            .collect())
    }

    fn feature_len(&self) -> Option<usize> {
        Some(self.len)
    }
}

/// Learner that always chooses the same action and learns nothing.
///
/// It remembers what it was asked to do.
#[derive(Clone, Debug)]
pub struct NoopLearner {
    action: f64,
    train: bool,
    n_sampled: usize,
    learned: Vec<Vec<f64>>,
    n_persisted: Cell<usize>,
}

impl NoopLearner {
    /// Constructs a learner answering `action`.
    pub fn new(action: f64) -> Self {
        Self {
            action,
            train: true,
            n_sampled: 0,
            learned: vec![],
            n_persisted: Cell::new(0),
        }
    }

    /// Number of actions chosen so far.
    pub fn n_sampled(&self) -> usize {
        self.n_sampled
    }

    /// Returns of the episodes given to each call of [`Learner::learn`].
    pub fn learned(&self) -> &[Vec<f64>] {
        &self.learned
    }

    /// Number of calls of [`Learner::persist`].
    pub fn n_persisted(&self) -> usize {
        self.n_persisted.get()
    }
}

impl Policy for NoopLearner {
    fn sample(&mut self, _features: &[f64]) -> f64 {
        self.n_sampled += 1;
        self.action
    }
}

impl Learner for NoopLearner {
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
        self.learned
            .push(episodes.iter().map(|e| e.total_reward()).collect());
        Ok(())
    }

    fn persist(&self, _model_dir: &Path) -> Result<()> {
        self.n_persisted.set(self.n_persisted.get() + 1);
        Ok(())
    }
}

/// Simulator side that replays a fixed reward sequence.
///
/// Observation `i` is `[i, rewards[i]]` encoded with [`encode_features`].
#[derive(Clone, Debug)]
pub struct ScriptedSimulator {
    rewards: Vec<f64>,
    close_after: Option<usize>,
    expect_final_signal: bool,
}

impl ScriptedSimulator {
    /// One step per reward.
    pub fn new(rewards: Vec<f64>) -> Self {
        Self {
            rewards,
            close_after: None,
            expect_final_signal: false,
        }
    }

    /// Raises the closure flag at the end of step `step`.
    pub fn close_after(mut self, step: usize) -> Self {
        self.close_after = Some(step);
        self
    }

    /// Waits for the final signal after the last step.
    pub fn expect_final_signal(mut self, v: bool) -> Self {
        self.expect_final_signal = v;
        self
    }

    /// Plays the episode; returns the actions received.
    pub fn serve<T: Transport>(&self, channels: &mut SimulatorChannels<T>) -> Result<Vec<f64>> {
        let mut actions = Vec::with_capacity(self.rewards.len());
        let mut closed = false;

        for (step, &reward) in self.rewards.iter().enumerate() {
            if closed {
                channels.send_reward(reward)?;
                continue;
            }
            channels.send_observation(&encode_features(&[step as f64, reward]))?;
            actions.push(channels.recv_action()?);
            channels.send_reward(reward)?;
            let signal = if self.close_after == Some(step) {
                closed = true;
                TerminationSignal::closed(1)
            } else {
                TerminationSignal::running()
            };
            channels.send_termination_flag(signal)?;
        }

        if self.expect_final_signal {
            channels.recv_final_signal()?;
        }
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_features() {
        let flatten = RawFeatures::new(3);
        let v = vec![1.5, -2.0, 0.0];
        assert_eq!(flatten.flatten(&encode_features(&v)).unwrap(), v);
        assert!(matches!(
            flatten.flatten(&encode_features(&[1.0])),
            Err(CoordError::MalformedMessage(_))
        ));
    }
}
