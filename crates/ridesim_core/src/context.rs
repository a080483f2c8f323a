//! Dependencies a handler needs beyond the world it mutates, threaded
//! explicitly instead of reached for as global state.

use crate::services::{DwellPolicy, IdlePolicy, MatchingPolicy, PricingPolicy, RngRegistry, SimClock, TravelTimeOracle};
use crate::telemetry::Recorder;

pub struct HandlerContext {
    pub clock: SimClock,
    pub rng: RngRegistry,
    pub travel_time: Box<dyn TravelTimeOracle>,
    pub matching: Box<dyn MatchingPolicy>,
    pub idle: Box<dyn IdlePolicy>,
    pub dwell: Box<dyn DwellPolicy>,
    pub pricing: Box<dyn PricingPolicy>,
    pub max_driver_wait_s: f64,
    pub recorder: Recorder,
}
