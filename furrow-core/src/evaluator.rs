//! Held-out evaluation pass of a generation.
use crate::{
    channel::{ControllerChannels, Transport},
    record::{Record, RecordValue::Scalar, Recorder},
    scenario::make_scenario,
    worker::{Spawner, WorkerConfig},
    Episode, EpisodeRunner, Flatten, Learner,
};
use anyhow::Result;
use log::info;
use std::path::Path;

/// Runs the single evaluation worker of a generation.
///
/// The evaluation worker is started with a scenario generated for the
/// generation (see [`make_scenario`]). The policy is switched to evaluation
/// mode for the pass. Its episode is never ranked or learned from; each
/// step is reported to a [`Recorder`] instead.
pub struct EvaluationRunner {
    runner: EpisodeRunner,
    worker_config: WorkerConfig,
}

impl EvaluationRunner {
    /// Constructs an evaluation runner.
    pub fn new(runner: EpisodeRunner, worker_config: WorkerConfig) -> Self {
        Self {
            runner,
            worker_config,
        }
    }

    /// Command line of the evaluation worker of `generation`.
    ///
    /// Without a scenario template the worker gets the training arguments.
    pub fn args(&self, generation: usize) -> Result<Vec<String>> {
        match &self.worker_config.eval_input_file {
            Some(template) => {
                let scenario = make_scenario(
                    Path::new(template),
                    generation,
                    &self.worker_config.placeholder,
                )?;
                Ok(self.worker_config.eval_args(scenario))
            }
            None => Ok(self.worker_config.train_args()),
        }
    }

    /// Runs the evaluation episode of `generation` and reports its trace.
    pub fn evaluate<T, F, L, S, R>(
        &self,
        generation: usize,
        channels: &mut ControllerChannels<T>,
        spawner: &mut S,
        flatten: &F,
        learner: &mut L,
        recorder: &mut R,
    ) -> Result<Episode>
    where
        T: Transport,
        F: Flatten + ?Sized,
        L: Learner + ?Sized,
        S: Spawner,
        R: Recorder + ?Sized,
    {
        let args = self.args(generation)?;
        let worker = spawner.spawn(&args)?;

        learner.eval();
        let result = self.runner.run(channels, flatten, learner, worker);
        learner.train();
        let episode = result?;

        for (ix, step) in episode.steps().iter().enumerate() {
            recorder.write(Record::from_slice(&[
                ("generation", Scalar(generation as f64)),
                ("step", Scalar(ix as f64)),
                ("action", Scalar(step.action)),
                ("reward", Scalar(step.reward)),
            ]));
        }
        info!(
            "Evaluation of generation {}: return {}",
            generation,
            episode.total_reward()
        );

        Ok(episode)
    }
}
