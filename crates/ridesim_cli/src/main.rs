//! Command-line entry point: load a scenario config, run it to completion,
//! and report what happened.

use std::fs;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ridesim_core::config::ScenarioConfig;
use ridesim_core::hooks::{NoopHooks, TracingHooks};
use ridesim_core::scenario::build_simulation;
use ridesim_core::telemetry::{JsonlSink, Recorder};

#[derive(Parser)]
#[command(name = "ridesim", about = "Discrete-event ridehailing simulation runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario from a TOML config file to completion
    Run {
        /// Path to a ScenarioConfig TOML file
        #[arg(long)]
        config: PathBuf,
        /// Write analytics records (newline-delimited JSON) to this file
        /// instead of discarding them
        #[arg(long)]
        out: Option<PathBuf>,
        /// Stop after this many dispatched events, even if the heap is
        /// not empty
        #[arg(long)]
        max_events: Option<usize>,
        /// Override the config's own log level
        #[arg(long)]
        log_level: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run { config, out, max_events, log_level } => run_scenario(&config, out.as_deref(), max_events, log_level.as_deref()),
    }
}

fn run_scenario(config_path: &std::path::Path, out: Option<&std::path::Path>, max_events: Option<usize>, log_level: Option<&str>) -> anyhow::Result<()> {
    let raw = fs::read_to_string(config_path).map_err(|err| anyhow::anyhow!("failed to read {}: {err}", config_path.display()))?;
    let config: ScenarioConfig = toml::from_str(&raw).map_err(|err| anyhow::anyhow!("failed to parse {}: {err}", config_path.display()))?;

    let level = log_level.unwrap_or(&config.log.level);
    init_tracing(level);
    tracing::info!(scenario = %config.sim.scenario_tag, seed = config.sim.seed, duration_s = config.sim.duration_s, "starting run");

    let recorder = match out {
        Some(path) => {
            let file = File::create(path).map_err(|err| anyhow::anyhow!("failed to create {}: {err}", path.display()))?;
            Recorder::new(Box::new(JsonlSink::new(file)))
        }
        None => Recorder::noop(),
    };

    let mut built = build_simulation(&config, recorder);
    let mut hooks = TracingHooks::new(config.log.sample_every);

    let result = if config.log.debug {
        built.kernel.run(&mut built.world, &mut built.ctx, &mut hooks, None, max_events)
    } else {
        built.kernel.run(&mut built.world, &mut built.ctx, &mut NoopHooks, None, max_events)
    };

    let processed = result.map_err(|err| anyhow::anyhow!("simulation halted with a fatal kernel error: {err}"))?;

    println!("dispatched {processed} events, clock at t={:.1}s", built.kernel.now());
    println!("riders remaining unmatched or mid-trip: {}", built.world.trips.len());
    println!("drivers idle: {}", built.world.idle_driver_ids.len());

    Ok(())
}

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
