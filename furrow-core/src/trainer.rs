//! Generation loop of the controller.
mod config;
use crate::{
    channel::{ControllerChannels, Transport},
    record::{Record, RecordValue, Recorder},
    side_log::BestStepLog,
    worker::{Spawner, WorkerConfig},
    Episode, EpisodeRunner, EpisodeSelector, EvaluationRunner, Flatten, Learner,
};
use anyhow::Result;
use chrono::Local;
pub use config::GenerationLoopConfig;
use log::{debug, info, warn};
use std::{fs, path::Path};

/// Outcome of one generation.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationSummary {
    /// Index of the generation, starting at 0.
    pub generation: usize,

    /// Cumulative reward of the best selected episode.
    pub best_return: Option<f64>,

    /// Mean cumulative reward of the selected episodes.
    pub mean_top_return: Option<f64>,

    /// Cumulative reward of the evaluation episode.
    pub eval_return: f64,

    /// Number of episodes handed to the learner.
    pub n_selected: usize,
}

impl GenerationSummary {
    /// Converts the summary into a timestamped [`Record`].
    pub fn to_record(&self) -> Record {
        let mut record = Record::from_slice(&[
            ("generation", RecordValue::Scalar(self.generation as f64)),
            ("eval_return", RecordValue::Scalar(self.eval_return)),
            ("n_selected", RecordValue::Scalar(self.n_selected as f64)),
            ("datetime", RecordValue::DateTime(Local::now())),
        ]);
        if let Some(v) = self.best_return {
            record.insert("best_return", RecordValue::Scalar(v));
        }
        if let Some(v) = self.mean_top_return {
            record.insert("mean_top_return", RecordValue::Scalar(v));
        }
        record
    }
}

/// Manages the generations of training.
///
/// # Generation loop
///
/// The loop moves through the states
/// `INIT -> (SPAWN_BATCH -> RUN_EPISODES -> SELECT_TOPK -> LEARN -> EVALUATE)* -> DONE`:
///
/// 0. `INIT`: wrap the transport in a [`ControllerChannels`].
/// 1. For each of the `epochs` generations:
///     1. `SPAWN_BATCH`, `RUN_EPISODES`: spawn `simus` training workers one
///        after the other and run each to completion with an
///        [`EpisodeRunner`]. Only one worker talks to the controller at a
///        time.
///     2. `SELECT_TOPK`: push the episodes of the batch into the
///        [`EpisodeSelector`] and drain the best `topn`.
///     3. `LEARN`: call [`Learner::learn`] with the selected episodes.
///     4. `EVALUATE`: run one evaluation worker with [`EvaluationRunner`].
///     5. Persist the model in `model_dir`, append the best step to
///        `best_step_log` and write a summary record.
/// 2. `DONE`: close the channel pair.
///
/// Any error is fatal and ends the loop; the channel pair is still closed.
/// The episodes of a generation are committed to the selector only once
/// the whole batch has completed, so a failed generation reaches neither
/// the selector nor the learner.
pub struct GenerationLoop {
    config: GenerationLoopConfig,
    worker_config: WorkerConfig,
}

impl GenerationLoop {
    /// Constructs a generation loop.
    pub fn build(config: GenerationLoopConfig, worker_config: WorkerConfig) -> Self {
        Self {
            config,
            worker_config,
        }
    }

    /// Configuration of the loop.
    pub fn config(&self) -> &GenerationLoopConfig {
        &self.config
    }

    fn episode_runner(&self) -> EpisodeRunner {
        EpisodeRunner::new(self.config.runs).final_signal(self.config.final_signal)
    }

    /// Runs all generations and returns their summaries.
    pub fn run<T, S, F, L, R>(
        &self,
        transport: T,
        spawner: &mut S,
        flatten: &F,
        learner: &mut L,
        recorder: &mut R,
    ) -> Result<Vec<GenerationSummary>>
    where
        T: Transport,
        S: Spawner,
        F: Flatten + ?Sized,
        L: Learner + ?Sized,
        R: Recorder + ?Sized,
    {
        let mut channels = ControllerChannels::new(transport);
        let result = self.run_generations(&mut channels, spawner, flatten, learner, recorder);
        channels.close();
        result
    }

    fn run_generations<T, S, F, L, R>(
        &self,
        channels: &mut ControllerChannels<T>,
        spawner: &mut S,
        flatten: &F,
        learner: &mut L,
        recorder: &mut R,
    ) -> Result<Vec<GenerationSummary>>
    where
        T: Transport,
        S: Spawner,
        F: Flatten + ?Sized,
        L: Learner + ?Sized,
        R: Recorder + ?Sized,
    {
        let mut selector = EpisodeSelector::new(self.config.topn);
        let evaluator = EvaluationRunner::new(self.episode_runner(), self.worker_config.clone());
        let best_step_log = self.config.best_step_log.as_ref().map(BestStepLog::new);
        learner.train();

        let mut summaries = Vec::with_capacity(self.config.epochs);
        for generation in 0..self.config.epochs {
            info!("============= generation: {}", generation);
            let (summary, best) = self.run_generation(
                generation,
                channels,
                &mut selector,
                &evaluator,
                spawner,
                flatten,
                learner,
                recorder,
            )?;
            if let (Some(log), Some(best)) = (&best_step_log, &best) {
                log.append(generation, best)?;
            }
            recorder.write(summary.to_record());
            recorder.flush();
            summaries.push(summary);
        }
        Ok(summaries)
    }

    /// Runs one generation.
    ///
    /// Returns the summary and the best selected episode, if any.
    #[allow(clippy::too_many_arguments)]
    fn run_generation<T, S, F, L, R>(
        &self,
        generation: usize,
        channels: &mut ControllerChannels<T>,
        selector: &mut EpisodeSelector,
        evaluator: &EvaluationRunner,
        spawner: &mut S,
        flatten: &F,
        learner: &mut L,
        recorder: &mut R,
    ) -> Result<(GenerationSummary, Option<Episode>)>
    where
        T: Transport,
        S: Spawner,
        F: Flatten + ?Sized,
        L: Learner + ?Sized,
        R: Recorder + ?Sized,
    {
        let runner = self.episode_runner();
        let args = self.worker_config.train_args();

        let mut batch = Vec::with_capacity(self.config.simus);
        for simu in 0..self.config.simus {
            let worker = spawner.spawn(&args)?;
            let episode = runner.run(channels, flatten, learner, worker)?;
            debug!(
                "Generation {}, worker {}: return {}",
                generation,
                simu,
                episode.total_reward()
            );
            batch.push(episode);
        }

        for episode in batch {
            selector.push(episode);
        }
        let top = selector.drain_top();
        let returns: Vec<f64> = top.iter().map(|e| e.total_reward()).collect();
        info!("Selected returns: {:?}", returns);

        learner.learn(&top)?;

        let eval = evaluator.evaluate(generation, channels, spawner, flatten, learner, recorder)?;

        if let Some(model_dir) = &self.config.model_dir {
            Self::persist(learner, model_dir);
        }

        let summary = GenerationSummary {
            generation,
            best_return: returns.first().copied(),
            mean_top_return: match returns.len() {
                0 => None,
                n => Some(returns.iter().sum::<f64>() / n as f64),
            },
            eval_return: eval.total_reward(),
            n_selected: top.len(),
        };
        Ok((summary, top.into_iter().next()))
    }

    fn persist<L: Learner + ?Sized>(learner: &L, model_dir: &str) {
        let path = Path::new(model_dir);
        match fs::create_dir_all(path)
            .map_err(anyhow::Error::from)
            .and_then(|_| learner.persist(path))
        {
            Ok(()) => info!("Saved the model in {:?}.", path),
            Err(e) => warn!("Failed to save model in {:?}: {}", path, e),
        }
    }
}
