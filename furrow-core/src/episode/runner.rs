//! Per-step handshake with one worker.
use crate::{
    channel::{ControllerChannels, Transport},
    worker::Worker,
    Episode, Flatten, Policy, StepRecord,
};
use anyhow::Result;
use log::{debug, trace, warn};

/// Drives one worker through exactly `runs` steps.
///
/// Each step while the farm is running:
///
/// 1. receive the observation and flatten it into a feature vector,
/// 2. choose an action with the policy and send it,
/// 3. receive the reward, then the termination flag.
///
/// Once the flag is raised the worker only emits rewards. The remaining
/// steps are recorded with the sentinel state and action, each with the
/// reward read from the worker, so an episode always has `runs` steps and
/// the channels are left at a message boundary.
///
/// After the last step the worker is joined and the channels forget it.
/// If the exchange fails the worker is killed before the error is returned.
#[derive(Clone, Debug)]
pub struct EpisodeRunner {
    runs: usize,
    final_signal: Option<f64>,
}

impl EpisodeRunner {
    /// Constructs a runner of `runs` steps per episode.
    pub fn new(runs: usize) -> Self {
        Self {
            runs,
            final_signal: None,
        }
    }

    /// Sends `value` on the action channel after the last step.
    pub fn final_signal(mut self, value: Option<f64>) -> Self {
        self.final_signal = value;
        self
    }

    /// Number of steps per episode.
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Runs one episode with `worker` and joins it.
    pub fn run<T, F, P, W>(
        &self,
        channels: &mut ControllerChannels<T>,
        flatten: &F,
        policy: &mut P,
        mut worker: W,
    ) -> Result<Episode>
    where
        T: Transport,
        F: Flatten + ?Sized,
        P: Policy + ?Sized,
        W: Worker,
    {
        let result = self.exchange(channels, flatten, policy).and_then(|episode| {
            if let Some(value) = self.final_signal {
                channels.send_final_signal(value)?;
            }
            Ok(episode)
        });

        match result {
            Ok(episode) => {
                worker.wait()?;
                channels.reset_peer();
                debug!(
                    "Episode of {} steps, return {}, {} after closure",
                    episode.len(),
                    episode.total_reward(),
                    episode.n_sentinel_steps()
                );
                Ok(episode)
            }
            Err(e) => {
                if let Err(kill_err) = worker.kill() {
                    warn!("Failed to kill worker: {}", kill_err);
                }
                channels.reset_peer();
                Err(e)
            }
        }
    }

    /// Performs the message exchange of one episode without joining the worker.
    pub fn exchange<T, F, P>(
        &self,
        channels: &mut ControllerChannels<T>,
        flatten: &F,
        policy: &mut P,
    ) -> Result<Episode>
    where
        T: Transport,
        F: Flatten + ?Sized,
        P: Policy + ?Sized,
    {
        let mut episode = Episode::with_capacity(self.runs);
        let mut closed = false;

        for step in 0..self.runs {
            let record = if closed {
                StepRecord::sentinel(channels.recv_reward()?)
            } else {
                let raw = channels.recv_observation()?;
                let state = flatten.flatten(&raw)?;
                let action = policy.sample(&state);
                channels.send_action(action)?;
                let reward = channels.recv_reward()?;
                let signal = channels.recv_termination()?;
                if signal.is_raised() {
                    debug!("Farm closed at step {} (code {})", step, signal.code());
                    closed = true;
                }
                StepRecord::new(state, action, reward)
            };
            trace!(
                "step {}: action {}, reward {}",
                step,
                record.action,
                record.reward
            );
            episode.push(record);
        }

        Ok(episode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        channel::{memory_pair, MemoryTransport, SimulatorChannels},
        dummy::{NoopLearner, RawFeatures, ScriptedSimulator},
        error::CoordError,
        worker::{Spawner, ThreadSpawner},
        SENTINEL_ACTION,
    };
    use std::time::Duration;
    use test_log::test;

    fn serve(
        sim: ScriptedSimulator,
        transport: MemoryTransport,
    ) -> ThreadSpawner<impl Fn(usize, Vec<String>) -> Result<()> + Clone + Send + 'static> {
        ThreadSpawner::new(move |_, _| {
            let mut channels = SimulatorChannels::new(transport.clone());
            sim.serve(&mut channels)?;
            Ok(())
        })
    }

    fn controller(transport: MemoryTransport) -> ControllerChannels<MemoryTransport> {
        ControllerChannels::new(transport.recv_timeout(Some(Duration::from_secs(5))))
    }

    #[test]
    fn test_full_episode_without_closure() {
        let (c, s) = memory_pair();
        let mut channels = controller(c);
        let mut spawner = serve(ScriptedSimulator::new(vec![1.0, 2.0, 3.0]), s);
        let mut policy = NoopLearner::new(0.7);

        let worker = spawner.spawn(&[]).unwrap();
        let episode = EpisodeRunner::new(3)
            .run(&mut channels, &RawFeatures::new(2), &mut policy, worker)
            .unwrap();

        assert_eq!(episode.len(), 3);
        assert_eq!(episode.n_sentinel_steps(), 0);
        assert_eq!(episode.total_reward(), 6.0);
        for (i, step) in episode.steps().iter().enumerate() {
            assert_eq!(step.state, vec![i as f64, (i + 1) as f64]);
            assert_eq!(step.action, 0.7);
        }
    }

    #[test]
    fn test_sentinels_after_closure() {
        let (c, s) = memory_pair();
        let mut channels = controller(c);
        let rewards = vec![10.0, 20.0, 5.0, 6.0, 7.0];
        let sim = ScriptedSimulator::new(rewards.clone()).close_after(1);
        let mut spawner = serve(sim, s);
        let mut policy = NoopLearner::new(1.1);

        let worker = spawner.spawn(&[]).unwrap();
        let episode = EpisodeRunner::new(5)
            .run(&mut channels, &RawFeatures::new(2), &mut policy, worker)
            .unwrap();

        assert_eq!(episode.len(), 5);
        let steps = episode.steps();
        assert!(steps[..2].iter().all(|s| !s.is_sentinel()));
        for step in &steps[2..] {
            assert_eq!(step.state, vec![-1.0]);
            assert_eq!(step.action, SENTINEL_ACTION);
        }
        let got: Vec<f64> = steps.iter().map(|s| s.reward).collect();
        assert_eq!(got, rewards);
        assert_eq!(episode.total_reward(), 48.0);
    }

    #[test]
    fn test_closure_on_first_step() {
        let (c, s) = memory_pair();
        let mut channels = controller(c);
        let sim = ScriptedSimulator::new(vec![1.0, 1.0, 1.0, 1.0]).close_after(0);
        let mut spawner = serve(sim, s);
        let mut policy = NoopLearner::new(0.0);

        let worker = spawner.spawn(&[]).unwrap();
        let episode = EpisodeRunner::new(4)
            .run(&mut channels, &RawFeatures::new(2), &mut policy, worker)
            .unwrap();
        assert_eq!(episode.n_sentinel_steps(), 3);
        assert_eq!(policy.n_sampled(), 1);
    }

    #[test]
    fn test_final_signal() {
        let (c, s) = memory_pair();
        let mut channels = controller(c);
        let sim = ScriptedSimulator::new(vec![0.5, 0.5]).expect_final_signal(true);
        let mut spawner = serve(sim, s);
        let mut policy = NoopLearner::new(0.0);

        let worker = spawner.spawn(&[]).unwrap();
        let episode = EpisodeRunner::new(2)
            .final_signal(Some(0.0))
            .run(&mut channels, &RawFeatures::new(2), &mut policy, worker)
            .unwrap();
        assert_eq!(episode.len(), 2);
        assert_eq!(channels.transport_mut().pending(), 0);
    }

    #[test]
    fn test_malformed_observation() {
        let (c, s) = memory_pair();
        let mut channels = controller(c);
        let mut sim_channels = SimulatorChannels::new(s);
        sim_channels.send_observation(&[1, 2, 3]).unwrap();
        let mut policy = NoopLearner::new(0.0);

        let err = EpisodeRunner::new(1)
            .exchange(&mut channels, &RawFeatures::new(2), &mut policy)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoordError>(),
            Some(CoordError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_worker_vanishes_mid_episode() {
        let (c, s) = memory_pair();
        let mut channels =
            ControllerChannels::new(c.recv_timeout(Some(Duration::from_millis(200))));
        // The simulator only knows two steps; the controller expects three.
        let mut spawner = serve(ScriptedSimulator::new(vec![1.0, 1.0]), s);
        let mut policy = NoopLearner::new(0.0);

        let worker = spawner.spawn(&[]).unwrap();
        let err = EpisodeRunner::new(3)
            .run(&mut channels, &RawFeatures::new(2), &mut policy, worker)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoordError>(),
            Some(CoordError::Timeout(_))
        ));
    }
}
