//! Runs independent simulations in parallel. Each run gets its own
//! `Kernel`/`WorldState`/`RngRegistry` on its own thread — this never
//! parallelizes a single run's event loop, only the sweep across runs.

use std::sync::{Arc, Mutex};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use ridesim_core::config::ScenarioConfig;
use ridesim_core::hooks::NoopHooks;
use ridesim_core::scenario::build_simulation;
use ridesim_core::telemetry::{Recorder, Sink};

use crate::metrics::{summarize, SweepResult};

/// Forwards recorded lines into a shared buffer the caller can inspect
/// after the run completes, mirroring how `ridesim_core`'s own recorder
/// tests capture output without a real sink.
struct SharedSink(Arc<Mutex<Vec<String>>>);

impl Sink for SharedSink {
    fn write_line(&mut self, line: &str) {
        self.0.lock().unwrap().push(line.to_string());
    }
}

/// Runs one scenario to completion and reduces its recorded business
/// events into a `SweepResult`.
pub fn run_single_variant(config: &ScenarioConfig) -> Result<SweepResult, String> {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let recorder = Recorder::new(Box::new(SharedSink(lines.clone())));

    let mut built = build_simulation(config, recorder);
    let processed = built
        .kernel
        .run(&mut built.world, &mut built.ctx, &mut NoopHooks, None, None)
        .map_err(|err| format!("run with seed {} failed: {err}", config.sim.seed))?;

    let captured = lines.lock().unwrap();
    let (trips_requested, trips_matched, trips_completed, trips_canceled, total_fare) = summarize(&captured);

    Ok(SweepResult {
        seed: config.sim.seed,
        scenario_tag: config.sim.scenario_tag.clone(),
        events_dispatched: processed,
        sim_time_s: built.kernel.now(),
        trips_requested,
        trips_matched,
        trips_completed,
        trips_canceled,
        total_fare,
        drivers_idle_at_end: built.world.idle_driver_ids.len(),
        trips_in_flight_at_end: built.world.trips.len(),
    })
}

/// Runs every config in `variants` on a rayon thread pool, one simulation
/// per task, with an optional progress bar. Results preserve input order.
pub fn run_sweep(variants: Vec<ScenarioConfig>, num_threads: Option<usize>, show_progress: bool) -> Vec<Result<SweepResult, String>> {
    let total = variants.len();
    let progress = if show_progress && total > 0 {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})") {
            bar.set_style(style.progress_chars("#>-"));
        }
        Some(bar)
    } else {
        None
    };

    let pool = {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = num_threads {
            builder = builder.num_threads(threads);
        }
        builder.build().expect("failed to build sweep thread pool")
    };

    let results = pool.install(|| {
        variants
            .par_iter()
            .map(|config| {
                let result = run_single_variant(config);
                if let Some(bar) = &progress {
                    bar.inc(1);
                }
                result
            })
            .collect()
    });

    if let Some(bar) = progress {
        bar.finish_with_message("sweep complete");
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config(seed: u64) -> ScenarioConfig {
        let mut config = ScenarioConfig::default();
        config.sim.seed = seed;
        config.sim.duration_s = 60.0;
        config.world.num_riders = 5;
        config.world.num_drivers = 2;
        config
    }

    #[test]
    fn single_variant_runs_to_completion_and_reports_metrics() {
        let result = run_single_variant(&base_config(1)).unwrap();
        assert_eq!(result.trips_requested, 5);
        assert!(result.events_dispatched > 0);
    }

    #[test]
    fn sweep_preserves_order_across_threads() {
        let variants: Vec<_> = (0..4).map(base_config).collect();
        let results = run_sweep(variants, Some(2), false);
        assert_eq!(results.len(), 4);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.as_ref().unwrap().seed, i as u64);
        }
    }
}
