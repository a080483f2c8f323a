//! Deserializable configuration surface. This module only defines types —
//! reading a config file from disk is the CLI's job, not the core's.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub epoch_year: i32,
    pub epoch_month: u32,
    pub epoch_day: u32,
    pub epoch_hour: u32,
    pub epoch_minute: u32,
    pub epoch_second: u32,
    pub seed: u64,
    pub scenario_tag: String,
    pub worker: u32,
    pub duration_s: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            epoch_year: 2024,
            epoch_month: 1,
            epoch_day: 1,
            epoch_hour: 0,
            epoch_minute: 0,
            epoch_second: 0,
            seed: 42,
            scenario_tag: "baseline".to_string(),
            worker: 0,
            duration_s: 3600.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub sample_every: usize,
    /// Whether the runner should wire a tracing-backed hook set. `false`
    /// drops per-dispatch tracing entirely rather than sampling it to zero.
    #[serde(default)]
    pub debug: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig { level: "info".to_string(), sample_every: 1, debug: false }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    pub num_riders: usize,
    pub num_drivers: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig { num_riders: 500, num_drivers: 100, x_min: 0.0, x_max: 100.0, y_min: 0.0, y_max: 100.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TravelTimeConfig {
    Fixed { pickup_s: f64, dropoff_s: f64, reposition_s: f64 },
    Euclidean { min_kmh: f64, max_kmh: f64, unit_to_km: f64 },
}

impl Default for TravelTimeConfig {
    fn default() -> Self {
        TravelTimeConfig::Fixed { pickup_s: 10.0, dropoff_s: 20.0, reposition_s: 30.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdleConfig {
    Stationary,
    Circulating { dwell_interval_s: f64 },
}

impl Default for IdleConfig {
    fn default() -> Self {
        IdleConfig::Stationary
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchingConfig {
    NearestIdle,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        MatchingConfig::NearestIdle
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DwellConfig {
    pub board_s: f64,
    pub alight_s: f64,
}

impl Default for DwellConfig {
    fn default() -> Self {
        DwellConfig { board_s: 0.0, alight_s: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PricingConfig {
    pub base_fare: f64,
    pub per_unit_rate: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig { base_fare: 2.50, per_unit_rate: 1.50 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DemandConfig {
    pub max_wait_s: f64,
    pub walk_s_min: f64,
    pub walk_s_max: f64,
    pub max_driver_wait_s: f64,
}

impl Default for DemandConfig {
    fn default() -> Self {
        DemandConfig { max_wait_s: 600.0, walk_s_min: 0.0, walk_s_max: 0.0, max_driver_wait_s: 120.0 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub sim: SimConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub travel_time: TravelTimeConfig,
    #[serde(default)]
    pub idle: IdleConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub dwell: DwellConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub demand: DemandConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = ScenarioConfig::default();
        let serialized = toml_like_json_round_trip(&config);
        assert_eq!(serialized.sim.seed, config.sim.seed);
    }

    // `toml` itself is exercised by the CLI crate; this just checks the
    // types are structurally serde-friendly via JSON, which shares the
    // same derive path.
    fn toml_like_json_round_trip(config: &ScenarioConfig) -> ScenarioConfig {
        let json = serde_json::to_string(config).expect("serialize");
        serde_json::from_str(&json).expect("deserialize")
    }
}
