use anyhow::Result;
use clap::Parser;
use furrow_agripolis::{FurrowConfig, LinearPolicy, RlDataFlattener};
use furrow_core::{
    channel::TcpTransport, record::LogRecorder, worker::ProcessSpawner, Configurable,
    GenerationLoop,
};
use log::info;

/// Train a farm policy against AgriPoliS workers
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML configuration; defaults are used when omitted
    #[arg(short, long)]
    config: Option<String>,

    /// Overrides the number of generations
    #[arg(short, long)]
    epochs: Option<usize>,

    /// Starts from the model saved in this directory
    #[arg(short, long)]
    load_model: Option<String>,

    /// Writes the effective configuration to this path and exits
    #[arg(long)]
    dump_config: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => FurrowConfig::load(path)?,
        None => FurrowConfig::default(),
    };
    if let Some(epochs) = args.epochs {
        config.generation = config.generation.epochs(epochs);
    }
    if let Some(path) = &args.dump_config {
        config.save(path)?;
        info!("Wrote configuration to {}", path);
        return Ok(());
    }

    let mut learner = LinearPolicy::build(config.policy_config());
    if let Some(model_dir) = &args.load_model {
        learner.load(model_dir)?;
    }
    let flatten = RlDataFlattener::new(config.schema.clone());
    let mut spawner = ProcessSpawner::new(config.worker.program.clone());
    let mut recorder = LogRecorder::new("furrow");
    let transport = TcpTransport::open(&config.channel)?;

    let summaries = GenerationLoop::build(config.generation.clone(), config.worker.clone()).run(
        transport,
        &mut spawner,
        &flatten,
        &mut learner,
        &mut recorder,
    )?;

    if let Some(best) = summaries
        .iter()
        .max_by(|a, b| a.eval_return.total_cmp(&b.eval_return))
    {
        info!(
            "Best evaluation return {} in generation {}",
            best.eval_return, best.generation
        );
    }
    Ok(())
}
