use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use flapsim::AppConfig;
use flapsim::headless::TrainingEnv;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of generations to evaluate
    #[arg(long)]
    generations: Option<usize>,

    /// Policies per generation
    #[arg(long)]
    population: Option<usize>,

    /// Seed for the obstacle course and the sampled policies
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory for checkpoints and stats
    #[arg(long)]
    output: Option<String>,

    /// RON config file (default: flapsim.ron if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trace a tick snapshot every N ticks
    #[arg(long)]
    trace_ticks: Option<u64>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Command line flags override every other configuration layer
    fn apply(&self, config: &mut AppConfig) {
        if let Some(generations) = self.generations {
            config.training.generations = generations;
        }
        if let Some(population) = self.population {
            config.training.population_size = population;
        }
        if let Some(seed) = self.seed {
            config.sim.seed = Some(seed);
            config.training.seed = Some(seed);
        }
        if let Some(output) = &self.output {
            config.training.output_dir = output.clone();
        }
        if let Some(every) = self.trace_ticks {
            config.training.trace_ticks = every;
        }
    }
}

fn init_logger(args: &Args) {
    let level = if args.verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    if args.trace_ticks.is_some_and(|every| every > 0) {
        builder.filter_module("flapsim::headless", log::LevelFilter::Trace);
    }
    builder.init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let mut env = TrainingEnv::sampled(config)?;
    env.run()?;

    match env.best() {
        Some(best) => log::info!(
            "Best fitness {:.2} from generation {}",
            best.best_fitness,
            best.generation_index
        ),
        None => log::warn!("No generation produced a best policy"),
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(&args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
