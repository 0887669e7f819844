//! Steps, episodes and the termination flag.
use serde::{Deserialize, Serialize};

/// Action recorded for steps taken after the simulated farm closed.
pub const SENTINEL_ACTION: f64 = -1.0;

/// State recorded for steps taken after the simulated farm closed.
pub fn sentinel_state() -> Vec<f64> {
    vec![-1.0]
}

/// A `(state, action, reward)` tuple of one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Feature vector flattened from the observation.
    pub state: Vec<f64>,

    /// Action sent to the simulator.
    pub action: f64,

    /// Reward returned by the simulator for this step.
    pub reward: f64,
}

impl StepRecord {
    /// Constructs a step from a real exchange.
    pub fn new(state: Vec<f64>, action: f64, reward: f64) -> Self {
        Self {
            state,
            action,
            reward,
        }
    }

    /// Constructs a placeholder step for a closed farm.
    ///
    /// The reward is still the one read from the simulator.
    pub fn sentinel(reward: f64) -> Self {
        Self::new(sentinel_state(), SENTINEL_ACTION, reward)
    }

    /// Returns `true` if this step is a placeholder.
    pub fn is_sentinel(&self) -> bool {
        self.action == SENTINEL_ACTION && self.state == sentinel_state()
    }
}

/// Ordered sequence of steps of one worker run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    steps: Vec<StepRecord>,
    total_reward: f64,
}

impl Episode {
    /// Constructs an empty episode with room for `runs` steps.
    pub fn with_capacity(runs: usize) -> Self {
        Self {
            steps: Vec::with_capacity(runs),
            total_reward: 0.0,
        }
    }

    /// Appends a step and accumulates its reward.
    pub fn push(&mut self, step: StepRecord) {
        self.total_reward += step.reward;
        self.steps.push(step);
    }

    /// Steps in the order they were taken.
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// The first step, if any.
    pub fn first_step(&self) -> Option<&StepRecord> {
        self.steps.first()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the episode has no step.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Cumulative reward over all steps.
    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }

    /// Number of steps recorded after the farm closed.
    pub fn n_sentinel_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.is_sentinel()).count()
    }
}

impl FromIterator<StepRecord> for Episode {
    fn from_iter<I: IntoIterator<Item = StepRecord>>(iter: I) -> Self {
        let mut episode = Episode::default();
        for step in iter {
            episode.push(step);
        }
        episode
    }
}

/// Closure flag sent by the simulator after each reward.
///
/// On the wire the simulator sends `code + 1`, where `code == 0` means the
/// farm is still running and any positive code identifies the reason it
/// closed. Once raised for a worker it stays raised for the rest of the
/// episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerminationSignal {
    code: i64,
}

impl TerminationSignal {
    /// The farm is still running.
    pub fn running() -> Self {
        Self { code: 0 }
    }

    /// The farm closed with the given reason code.
    pub fn closed(code: i64) -> Self {
        Self { code }
    }

    /// Decodes the scalar received on the observation channel.
    pub fn from_wire(value: f64) -> Self {
        Self {
            code: value.round() as i64 - 1,
        }
    }

    /// Encodes the flag as sent by the simulator.
    pub fn to_wire(&self) -> f64 {
        (self.code + 1) as f64
    }

    /// Returns `true` if the farm closed.
    pub fn is_raised(&self) -> bool {
        self.code > 0
    }

    /// Closure reason code, `0` while running.
    pub fn code(&self) -> i64 {
        self.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_accumulates_reward() {
        let episode: Episode = vec![
            StepRecord::new(vec![1.0, 2.0], 0.5, 3.0),
            StepRecord::sentinel(-1.5),
            StepRecord::sentinel(2.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(episode.len(), 3);
        assert_eq!(episode.total_reward(), 3.5);
        assert_eq!(episode.n_sentinel_steps(), 2);
        assert!(!episode.first_step().unwrap().is_sentinel());
    }

    #[test]
    fn test_termination_wire_encoding() {
        assert!(!TerminationSignal::from_wire(1.0).is_raised());
        assert!(TerminationSignal::from_wire(2.0).is_raised());
        assert_eq!(TerminationSignal::from_wire(5.0).code(), 4);
        assert_eq!(TerminationSignal::closed(3).to_wire(), 4.0);
        assert_eq!(TerminationSignal::running().to_wire(), 1.0);
        // A simulator that never offsets the code still reads as running.
        assert!(!TerminationSignal::from_wire(0.0).is_raised());
    }
}
