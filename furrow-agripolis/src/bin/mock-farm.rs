use anyhow::Result;
use clap::Parser;
use furrow_agripolis::{MockFarm, MockFarmConfig};
use furrow_core::SimulatorChannels;
use std::path::Path;

/// Farm simulator speaking the worker side of the furrow protocol
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML configuration of the farm
    input_file: String,

    /// Scenario file next to the input file, replacing its configuration
    scenario: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let input_file = Path::new(&args.input_file);
    let config = match &args.scenario {
        Some(scenario) => {
            let dir = input_file.parent().unwrap_or_else(|| Path::new(""));
            MockFarmConfig::load(dir.join(scenario))?
        }
        None => MockFarmConfig::load(input_file)?,
    };

    let mut channels = SimulatorChannels::open_tcp(&config.channel)?;
    MockFarm::new(config).serve(&mut channels)?;
    channels.close();
    Ok(())
}
