//! Stand-in farm simulator speaking the worker side of the protocol.
use crate::{Invest, ObsSchema, RlData};
use anyhow::Result;
use furrow_core::{ChannelConfig, SimulatorChannels, TerminationSignal, Transport};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`MockFarm`].
///
/// The equity capital of the farm grows by
/// `growth - penalty * (action - target_action)^2` per step, plus uniform
/// noise of amplitude `noise`. The reward of a step is the equity capital
/// after it.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MockFarmConfig {
    /// Endpoints of the simulator side.
    pub channel: ChannelConfig,

    /// Shape of the emitted observations.
    pub schema: ObsSchema,

    /// Number of simulated periods.
    pub runs: usize,

    /// Equity capital at the start.
    pub initial_equity: f64,

    /// Action giving the best growth.
    pub target_action: f64,

    /// Growth rate at the target action.
    pub growth: f64,

    /// Loss of growth per squared distance to the target action.
    pub penalty: f64,

    /// Amplitude of the noise on the growth rate.
    pub noise: f64,

    /// Probability that the farm closes in a period.
    pub closure_prob: f64,

    /// Code reported when the farm closes.
    pub closure_code: i64,

    /// Waits for the final signal of the controller after the last period.
    pub expect_final_signal: bool,

    /// Seed of the random number generator.
    pub seed: Option<u64>,
}

impl Default for MockFarmConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::simulator(),
            schema: ObsSchema::default(),
            runs: 25,
            initial_equity: 100_000.0,
            target_action: 1.0,
            growth: 0.05,
            penalty: 0.2,
            noise: 0.01,
            closure_prob: 0.0,
            closure_code: 1,
            expect_final_signal: false,
            seed: None,
        }
    }
}

impl MockFarmConfig {
    /// Sets the endpoints.
    pub fn channel(mut self, channel: ChannelConfig) -> Self {
        self.channel = channel;
        self
    }

    /// Sets the number of periods.
    pub fn runs(mut self, v: usize) -> Self {
        self.runs = v;
        self
    }

    /// Sets the closure probability.
    pub fn closure_prob(mut self, v: f64) -> Self {
        self.closure_prob = v;
        self
    }

    /// Sets the noise amplitude.
    pub fn noise(mut self, v: f64) -> Self {
        self.noise = v;
        self
    }

    /// Sets whether the final signal is awaited.
    pub fn expect_final_signal(mut self, v: bool) -> Self {
        self.expect_final_signal = v;
        self
    }

    /// Sets the seed.
    pub fn seed(mut self, v: Option<u64>) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`MockFarmConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`MockFarmConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// What the farm saw during one run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MockFarmReport {
    /// Actions received, one per period before closure.
    pub actions: Vec<f64>,

    /// Rewards sent, one per period.
    pub rewards: Vec<f64>,

    /// Period in which the farm closed.
    pub closed_at: Option<usize>,
}

/// Farm simulator for tests and dry runs of the controller.
pub struct MockFarm {
    config: MockFarmConfig,
    rng: fastrand::Rng,
}

impl MockFarm {
    /// Constructs a farm.
    pub fn new(config: MockFarmConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self { config, rng }
    }

    fn observation(&self, period: usize, equity: f64) -> RlData {
        let schema = &self.config.schema;
        let s = schema.n_soil_types;
        let rng = &self.rng;

        let rest_plots_of_type = (0..s)
            .map(|_| {
                (0..schema.n_contract_years)
                    .map(|_| rng.u32(0..3) as f64)
                    .collect()
            })
            .collect();
        let rest_invests: BTreeMap<usize, Invest> = (0..schema.n_invest_types)
            .rev()
            .take(2)
            .map(|k| {
                let life = (3 - period % 3) as f64;
                (k, Invest { num: 1.0, life })
            })
            .collect();
        let rents: Vec<f64> = (0..s).map(|k| 350.0 - 150.0 * k as f64).collect();

        RlData {
            rest_plots_of_type,
            age: (period + 1) as f64,
            liquidity: equity / self.config.initial_equity,
            management: rng.f64(),
            rest_invests,
            recent_rents: rents.clone(),
            nfarms_10km: rng.u32(1..=6) as f64,
            nfree_plots_10km: (0..s).map(|_| rng.u32(0..30) as f64).collect(),
            av_new_rents: rents.iter().map(|r| r - 10.0).collect(),
        }
    }

    fn grow(&self, equity: f64, action: f64) -> f64 {
        let c = &self.config;
        let rate = c.growth - c.penalty * (action - c.target_action).powi(2)
            + c.noise * (2.0 * self.rng.f64() - 1.0);
        equity * (1.0 + rate)
    }

    /// Plays one run against the controller.
    ///
    /// After closure only rewards are sent, one per remaining period.
    pub fn serve<T: Transport>(
        &mut self,
        channels: &mut SimulatorChannels<T>,
    ) -> Result<MockFarmReport> {
        let mut report = MockFarmReport::default();
        let mut equity = self.config.initial_equity;

        for period in 0..self.config.runs {
            if report.closed_at.is_some() {
                channels.send_reward(equity)?;
                report.rewards.push(equity);
                continue;
            }

            let data = self.observation(period, equity);
            channels.send_observation(&data.encode()?)?;
            let action = channels.recv_action()?;
            report.actions.push(action);

            equity = self.grow(equity, action);
            channels.send_reward(equity)?;
            report.rewards.push(equity);

            let signal = if equity <= 0.0 || self.rng.f64() < self.config.closure_prob {
                debug!("Farm closed in period {}", period);
                report.closed_at = Some(period);
                TerminationSignal::closed(self.config.closure_code)
            } else {
                TerminationSignal::running()
            };
            channels.send_termination_flag(signal)?;
        }

        if self.config.expect_final_signal {
            let v = channels.recv_final_signal()?;
            debug!("Final signal {}", v);
        }
        info!(
            "Mock farm finished: equity {}, closed at {:?}",
            equity, report.closed_at
        );
        Ok(report)
    }
}
