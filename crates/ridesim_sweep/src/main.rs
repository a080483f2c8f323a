//! Runs a base scenario across a range of seeds in parallel and reports
//! per-seed outcome metrics as JSON.

mod metrics;
mod runner;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ridesim_core::config::ScenarioConfig;

#[derive(Parser)]
#[command(name = "ridesim-sweep", about = "Parallel seed sweep over a ridesim_core scenario")]
struct Args {
    /// Path to a base ScenarioConfig TOML file
    #[arg(long)]
    config: PathBuf,
    /// First seed in the sweep (inclusive)
    #[arg(long, default_value_t = 0)]
    seed_start: u64,
    /// Number of seeds to run, starting at `seed_start`
    #[arg(long, default_value_t = 10)]
    num_runs: u64,
    /// Worker threads in the rayon pool; defaults to rayon's own choice
    #[arg(long)]
    threads: Option<usize>,
    /// Write the per-run JSON summary to this file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
    /// Suppress the progress bar (useful for CI logs)
    #[arg(long)]
    no_progress: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), String> {
    let raw = fs::read_to_string(&args.config).map_err(|err| format!("failed to read {}: {err}", args.config.display()))?;
    let base: ScenarioConfig = toml::from_str(&raw).map_err(|err| format!("failed to parse {}: {err}", args.config.display()))?;

    let variants: Vec<ScenarioConfig> = (args.seed_start..args.seed_start + args.num_runs)
        .map(|seed| {
            let mut config = base.clone();
            config.sim.seed = seed;
            config
        })
        .collect();

    let results = runner::run_sweep(variants, args.threads, !args.no_progress);

    let mut failures = 0;
    let mut ok_results = Vec::new();
    for result in results {
        match result {
            Ok(r) => ok_results.push(r),
            Err(err) => {
                eprintln!("run failed: {err}");
                failures += 1;
            }
        }
    }

    let summary = serde_json::to_string_pretty(&ok_results).map_err(|err| format!("failed to serialize sweep summary: {err}"))?;
    match args.out {
        Some(path) => fs::write(&path, summary).map_err(|err| format!("failed to write {}: {err}", path.display()))?,
        None => println!("{summary}"),
    }

    if failures > 0 {
        Err(format!("{failures} of {} runs failed", ok_results.len() + failures))
    } else {
        Ok(())
    }
}
